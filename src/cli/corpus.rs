use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use tracing::info;

use crate::catalog::builder::{scan_manifests, BuildOptions, CorpusBuilder};
use crate::catalog::store::LibraryCorpus;
use crate::cli::OutputFormat;
use crate::core::types::SignatureKind;
use crate::utils::concurrent::{PoolConfig, WorkerPool, DEFAULT_TIMEOUT};

#[derive(Args)]
pub struct CorpusArgs {
    #[command(subcommand)]
    pub command: CorpusCommands,
}

#[derive(Subcommand)]
pub enum CorpusCommands {
    /// Build a corpus source from unit manifests
    Build {
        /// File listing manifest paths, one per line
        #[arg(short, long, required = true)]
        list: PathBuf,

        /// Output corpus prefix (e.g. "db/maven")
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Also write file-content and bertillonage signature streams
        #[arg(long)]
        full: bool,

        /// Worker threads (0 = automatic)
        #[arg(short = 'j', long, env = "INGREDIENTS_THREADS", default_value = "0")]
        threads: usize,

        /// Overall deadline for parsing every manifest
        #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },

    /// Find loadable unit manifests under a directory
    Scan {
        /// Directory to walk
        #[arg(required = true)]
        root: PathBuf,

        /// Output list file. If not specified, prints to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (0 = automatic)
        #[arg(short = 'j', long, env = "INGREDIENTS_THREADS", default_value = "0")]
        threads: usize,
    },

    /// List the libraries of one or more corpus sources
    List {
        /// Corpus source prefixes (comma-separated or repeated)
        #[arg(short, long = "corpus", required = true, value_delimiter = ',')]
        corpus: Vec<PathBuf>,

        /// Signature kind whose sizes are shown
        #[arg(short, long, value_enum, default_value_t = SignatureKind::Code)]
        signature: SignatureKind,
    },
}

pub fn run(args: CorpusArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CorpusCommands::Build {
            list,
            output,
            full,
            threads,
            timeout_secs,
        } => run_build(&list, &output, full, threads, timeout_secs, format, verbose),
        CorpusCommands::Scan {
            root,
            output,
            threads,
        } => run_scan(&root, output.as_deref(), threads, verbose),
        CorpusCommands::List { corpus, signature } => run_list(&corpus, signature, format, verbose),
    }
}

/// Read a manifest list: one path per line, blank lines and `#` comments skipped
fn read_manifest_list(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read manifest list {}: {e}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect())
}

fn run_build(
    list: &Path,
    output: &Path,
    full: bool,
    threads: usize,
    timeout_secs: u64,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let manifests = read_manifest_list(list)?;
    if manifests.is_empty() {
        anyhow::bail!("Manifest list {} is empty", list.display());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = WorkerPool::new(&PoolConfig {
        threads,
        timeout: Duration::from_secs(timeout_secs),
    })?;
    if verbose {
        eprintln!(
            "Building from {} manifests with {} threads",
            manifests.len(),
            pool.threads()
        );
    }

    let summary = CorpusBuilder::build(&manifests, output, BuildOptions { full }, &pool)?;
    info!("Corpus build finished in {} ms", start.elapsed().as_millis());

    match format {
        OutputFormat::Text => {
            println!("Corpus written to {}", output.display());
            println!("  Libraries: {}", summary.written);
            println!("  Skipped: {}", summary.skipped);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "prefix": output.display().to_string(),
                "written": summary.written,
                "skipped": summary.skipped,
                "full": full,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("prefix\twritten\tskipped");
            println!("{}\t{}\t{}", output.display(), summary.written, summary.skipped);
        }
    }
    Ok(())
}

fn run_scan(root: &Path, output: Option<&Path>, threads: usize, verbose: bool) -> anyhow::Result<()> {
    let pool = WorkerPool::new(&PoolConfig {
        threads,
        ..PoolConfig::default()
    })?;
    let manifests = scan_manifests(root, &pool)?;

    if verbose {
        eprintln!("Found {} loadable manifests under {}", manifests.len(), root.display());
    }

    if let Some(path) = output {
        let mut out = BufWriter::new(File::create(path)?);
        for manifest in &manifests {
            writeln!(out, "{}", manifest.display())?;
        }
        out.flush()?;
        eprintln!("Wrote {} paths to {}", manifests.len(), path.display());
    } else {
        for manifest in &manifests {
            println!("{}", manifest.display());
        }
    }
    Ok(())
}

fn run_list(
    prefixes: &[PathBuf],
    signature: SignatureKind,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let corpus = LibraryCorpus::load(prefixes, signature)?;

    if verbose {
        eprintln!(
            "Loaded {} libraries from {} source(s)",
            corpus.len(),
            prefixes.len()
        );
    }

    match format {
        OutputFormat::Text => {
            let name_width = corpus
                .records
                .iter()
                .map(|r| r.name.len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Library Corpus ({} libraries)\n", corpus.len());
            println!(
                "{:<name_w$} {:>8} {:>8}",
                "Name",
                "Names",
                "Units",
                name_w = name_width
            );
            println!("{}", "-".repeat(name_width + 18));
            for r in &corpus.records {
                println!(
                    "{:<name_w$} {:>8} {:>8}",
                    r.name,
                    r.name_hashes.size(),
                    r.size(),
                    name_w = name_width
                );
                if verbose {
                    println!("  └─ project: {}", r.project());
                }
            }
        }
        OutputFormat::Json => {
            let libraries: Vec<serde_json::Value> = corpus
                .records
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "project": r.project(),
                        "names": r.name_hashes.size(),
                        "units": r.size(),
                        "package_hash": r.package_hash.to_string(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "sources": prefixes.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "signature": signature,
                "count": corpus.len(),
                "libraries": libraries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("name\tproject\tnames\tunits");
            for r in &corpus.records {
                println!(
                    "{}\t{}\t{}\t{}",
                    r.name,
                    r.project(),
                    r.name_hashes.size(),
                    r.size()
                );
            }
        }
    }
    Ok(())
}
