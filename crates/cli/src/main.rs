use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use lens_k8s::{is_namespaced, namespace_manifest, DuplicatePolicy, NamespacePolicy, NormalizeOptions};
use lens_tree::{normalize_tree, patch_file, patch_tree, DirStore, TreeStore};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lensctl", version, about = "Normalize and namespace-patch Kubernetes manifest trees")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OnDuplicate { Overwrite, Warn, Error }

impl From<OnDuplicate> for DuplicatePolicy {
    fn from(v: OnDuplicate) -> Self {
        match v {
            OnDuplicate::Overwrite => DuplicatePolicy::Overwrite,
            OnDuplicate::Warn => DuplicatePolicy::Warn,
            OnDuplicate::Error => DuplicatePolicy::Error,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split every manifest under INPUT into one file per object under OUTPUT
    Normalize {
        input: PathBuf,
        output: PathBuf,
        /// What to do when two objects map to the same output path
        #[arg(long = "on-duplicate", env = "LENS_ON_DUPLICATE", value_enum, default_value_t = OnDuplicate::Warn)]
        on_duplicate: OnDuplicate,
    },
    /// Fill or override metadata.namespace in a manifest file or tree, in place
    PatchNamespaces {
        /// Manifest file or directory
        #[arg(env = "LENS_YAML_PATH")]
        path: Option<PathBuf>,
        /// Target namespace
        #[arg(long = "namespace", env = "LENS_NAMESPACE")]
        namespace: Option<String>,
        /// Set the namespace where none is present
        #[arg(long = "fill", env = "LENS_NAMESPACE_FILL", action = ArgAction::SetTrue)]
        fill: bool,
        /// Set the namespace on every namespaced object
        #[arg(long = "override", env = "LENS_NAMESPACE_OVERRIDE", action = ArgAction::SetTrue)]
        override_: bool,
    },
    /// Print a Namespace manifest
    NamespaceManifest { name: String },
    /// Classify kinds as namespaced or cluster-scoped
    Scope {
        #[arg(required = true)]
        kinds: Vec<String>,
    },
}

#[derive(Serialize)]
struct NormalizeReport<'a> {
    output: String,
    objects: usize,
    origins: &'a std::collections::BTreeMap<String, String>,
}

#[derive(Serialize)]
struct PatchReport {
    path: Option<String>,
    patched: usize,
}

#[derive(Serialize)]
struct ScopeEntry {
    kind: String,
    namespaced: bool,
}

fn init_tracing() {
    let env = std::env::var("LENS_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // diagnostics go to stderr; stdout carries data only
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { input, output, on_duplicate } => {
            info!(input = %input.display(), output = %output.display(), "normalize invoked");
            let tree = DirStore::new(&input).read_tree().await.with_context(|| format!("reading {}", input.display()))?;
            let opts = NormalizeOptions { on_duplicate: on_duplicate.into() };
            let (out, origins) = normalize_tree(&tree, &opts)?;
            DirStore::new(&output).write_tree(&out).await.with_context(|| format!("writing {}", output.display()))?;
            match cli.output {
                Output::Human => println!("normalized {} objects into {}", out.len(), output.display()),
                Output::Json => {
                    let report = NormalizeReport { output: output.display().to_string(), objects: out.len(), origins: &origins };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
        Commands::PatchNamespaces { path, namespace, fill, override_ } => {
            let policy = NamespacePolicy { namespace, fill, override_ };
            info!(path = ?path, policy = ?policy, "patch-namespaces invoked");
            let patched = match path.as_deref() {
                Some(dir) if dir.is_dir() => {
                    let store = DirStore::new(dir);
                    let tree = store.read_tree().await.with_context(|| format!("reading {}", dir.display()))?;
                    let (out, n) = patch_tree(&tree, &policy)?;
                    if !policy.is_noop() {
                        store.write_tree(&out).await.with_context(|| format!("writing {}", dir.display()))?;
                    }
                    n
                }
                other => patch_file(other, &policy).await?,
            };
            match cli.output {
                Output::Human => println!("patched {} namespaces", patched),
                Output::Json => {
                    let report = PatchReport { path: path.map(|p| p.display().to_string()), patched };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
        Commands::NamespaceManifest { name } => {
            print!("{}", namespace_manifest(&name)?);
        }
        Commands::Scope { kinds } => {
            let entries: Vec<_> = kinds.into_iter().map(|kind| ScopeEntry { namespaced: is_namespaced(&kind), kind }).collect();
            match cli.output {
                Output::Human => {
                    for e in &entries {
                        let scope = if e.namespaced { "namespaced" } else { "cluster" };
                        println!("{} • {}", e.kind, scope);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            }
        }
    }
    Ok(())
}
