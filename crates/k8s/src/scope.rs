//! Cluster-scoped kind table.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Lowercase plural names of kinds that never carry a namespace.
pub const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "apiservices",
    "bgpconfigurations",
    "bgppeers",
    "blockaffinities",
    "certificatesigningrequests",
    "clusterinformations",
    "clusterissuers",
    "clusterrolebindings",
    "clusterroles",
    "componentstatuses",
    "csidrivers",
    "csinodeinfos",
    "csinodes",
    "customresourcedefinitions",
    "felixconfigurations",
    "globalnetworkpolicies",
    "globalnetworksets",
    "hostendpoints",
    "ipamblocks",
    "ipamconfigs",
    "ipamhandles",
    "ippools",
    "mutatingwebhookconfigurations",
    "namespaces",
    "nodes",
    "persistentvolumes",
    "podsecuritypolicies",
    "priorityclasses",
    "runtimeclasses",
    "selfsubjectaccessreviews",
    "selfsubjectrulesreviews",
    "storageclasses",
    "subjectaccessreviews",
    "tokenreviews",
    "validatingwebhookconfigurations",
    "volumeattachments",
];

static CLUSTER_SCOPED: Lazy<FxHashSet<&'static str>> = Lazy::new(|| CLUSTER_SCOPED_KINDS.iter().copied().collect());

/// Whether objects of `kind` live in a namespace. Matches the table entry as
/// given or with an `s` appended, so both `Namespace` and `namespaces` hit.
pub fn is_namespaced(kind: &str) -> bool {
    let kind = kind.to_lowercase();
    !CLUSTER_SCOPED.contains(kind.as_str()) && !CLUSTER_SCOPED.contains(format!("{kind}s").as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_is_cluster_scoped() {
        for kind in CLUSTER_SCOPED_KINDS {
            assert!(!is_namespaced(kind), "{kind}");
            assert!(!is_namespaced(kind.trim_end_matches('s')), "{kind} singular");
        }
    }

    #[test]
    fn singular_and_plural_forms() {
        assert!(is_namespaced("Pod"));
        assert!(is_namespaced("ConfigMap"));
        assert!(!is_namespaced("Namespace"));
        assert!(!is_namespaced("namespaces"));
        assert!(!is_namespaced("ippool"));
        assert!(!is_namespaced("ClusterRoleBinding"));
        assert!(!is_namespaced("CustomResourceDefinition"));
    }

    #[test]
    fn irregular_plurals_are_not_guessed() {
        // only a trailing `s` is tried, so `-es` / `-ies` plurals miss
        assert!(is_namespaced("PriorityClass"));
        assert!(is_namespaced("StorageClass"));
        assert!(is_namespaced("GlobalNetworkPolicy"));
    }
}
