use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::store::LibraryCorpus;
use crate::cli::{count_to_f64, OutputFormat};
use crate::core::target::TargetView;
use crate::core::types::{AnalysisMode, SignatureKind};
use crate::matching::engine::{MatchingConfig, MatchingEngine};
use crate::matching::file_view::FileView;
use crate::matching::report::Report;
use crate::parsing::manifest::parse_manifest_file;
use crate::utils::concurrent::{PoolConfig, PoolError, WorkerPool, DEFAULT_TIMEOUT};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Corpus source prefixes (comma-separated or repeated)
    #[arg(short, long = "corpus", required = true, value_delimiter = ',')]
    pub corpus: Vec<PathBuf>,

    /// Output prefix; writes OUT-rank.txt and OUT-file.txt per target
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Ranking algorithm
    #[arg(short, long, value_enum, default_value_t = AnalysisMode::Decompose)]
    pub mode: AnalysisMode,

    /// Signature kind used to compare unit content
    #[arg(short, long, value_enum, default_value_t = SignatureKind::Code)]
    pub signature: SignatureKind,

    /// Ignore corpus libraries with the same package identity as the target
    #[arg(long)]
    pub exclude_self: bool,

    /// Worker threads (0 = all cores, minus two on machines with more than four)
    #[arg(short = 'j', long, env = "INGREDIENTS_THREADS", default_value = "0")]
    pub threads: usize,

    /// Overall deadline for analyzing every target
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Log and skip corpus sources that fail to load instead of aborting
    #[arg(long)]
    pub skip_bad_sources: bool,

    /// Unit manifests of the targets to analyze
    #[arg(required = true)]
    pub targets: Vec<PathBuf>,
}

/// Outcome of one analyzed target
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub target: String,
    pub units: usize,
    pub reports: usize,
    pub matched_units: usize,
    /// Units left after decomposition; not tracked by the Jaccard ranking
    pub unexplained_units: Option<usize>,
    pub rank_file: PathBuf,
    pub file_view: PathBuf,
    pub elapsed_ms: u128,
}

impl TargetSummary {
    #[must_use]
    pub fn unexplained_fraction(&self) -> Option<f64> {
        let unexplained = self.unexplained_units?;
        if self.units == 0 {
            return Some(0.0);
        }
        Some(count_to_f64(unexplained) / count_to_f64(self.units))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetFailure {
    pub target: String,
    pub error: String,
}

/// Path made of `prefix` followed by `suffix`
fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// `OUT-rank.txt`/`OUT-file.txt`, or `OUT-i-…` (1-based) when several targets share a prefix
#[must_use]
pub fn output_paths(output: &Path, index: Option<usize>) -> (PathBuf, PathBuf) {
    let base = match index {
        Some(i) => suffixed(output, &format!("-{i}")),
        None => output.to_path_buf(),
    };
    (suffixed(&base, "-rank.txt"), suffixed(&base, "-file.txt"))
}

pub fn run(args: AnalyzeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let corpus = Arc::new(load_corpus(&args.corpus, args.signature, args.skip_bad_sources)?);
    info!(
        "Loaded {} libraries from {} source(s) in {} ms",
        corpus.len(),
        args.corpus.len(),
        start.elapsed().as_millis()
    );

    if verbose {
        eprintln!(
            "Corpus: {} libraries ({} signatures)",
            corpus.len(),
            corpus.signature_kind()
        );
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = WorkerPool::new(&PoolConfig {
        threads: args.threads,
        timeout: Duration::from_secs(args.timeout_secs),
    })?;

    let multiple = args.targets.len() > 1;
    let jobs: Vec<(PathBuf, PathBuf, PathBuf)> = args
        .targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let (rank, file) = output_paths(&args.output, multiple.then_some(i + 1));
            (target.clone(), rank, file)
        })
        .collect();

    let config = MatchingConfig {
        filter_by_package: args.exclude_self,
    };
    let (mode, signature) = (args.mode, args.signature);
    let task_corpus = Arc::clone(&corpus);
    let outcomes = pool.map(jobs, move |(target, rank, file)| {
        let name = target.display().to_string();
        analyze_target(&task_corpus, &config, mode, signature, &target, &rank, &file).map_err(
            |e| TargetFailure {
                target: name,
                error: format!("{e:#}"),
            },
        )
    })?;

    let (summaries, failures) = collect_outcomes(&args.targets, outcomes);
    info!(
        "Analyzed {} target(s) in {} ms",
        summaries.len(),
        start.elapsed().as_millis()
    );

    match format {
        OutputFormat::Text => print_text(&summaries, &failures, mode),
        OutputFormat::Json => print_json(&summaries, &failures, mode, signature)?,
        OutputFormat::Tsv => print_tsv(&summaries),
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} target(s) failed",
            failures.len(),
            args.targets.len()
        );
    }
    Ok(())
}

/// Split per-target outcomes into summaries and failures, in target order.
/// A task that never returned is reported as a failure of its target.
fn collect_outcomes(
    targets: &[PathBuf],
    outcomes: Vec<Result<Result<TargetSummary, TargetFailure>, PoolError>>,
) -> (Vec<TargetSummary>, Vec<TargetFailure>) {
    let mut summaries = Vec::new();
    let mut failures = Vec::new();
    for (target, outcome) in targets.iter().zip(outcomes) {
        let failure = match outcome {
            Ok(Ok(summary)) => {
                summaries.push(summary);
                continue;
            }
            Ok(Err(failure)) => failure,
            Err(e) => TargetFailure {
                target: target.display().to_string(),
                error: e.to_string(),
            },
        };
        warn!("Failed to analyze {}: {}", failure.target, failure.error);
        failures.push(failure);
    }
    (summaries, failures)
}

fn load_corpus(
    sources: &[PathBuf],
    kind: SignatureKind,
    skip_bad_sources: bool,
) -> anyhow::Result<LibraryCorpus> {
    let mut corpus = LibraryCorpus::new(kind);
    for source in sources {
        match LibraryCorpus::load_source(source, kind) {
            Ok(records) => {
                info!("Loaded {} libraries from {}", records.len(), source.display());
                for record in records {
                    corpus.add_record(record);
                }
            }
            Err(e) if skip_bad_sources => {
                warn!("Skipping corpus source {}: {e}", source.display());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to load corpus source {}", source.display())));
            }
        }
    }
    Ok(corpus)
}

fn analyze_target(
    corpus: &LibraryCorpus,
    config: &MatchingConfig,
    mode: AnalysisMode,
    signature: SignatureKind,
    target: &Path,
    rank_path: &Path,
    file_path: &Path,
) -> anyhow::Result<TargetSummary> {
    let start = Instant::now();
    let component = parse_manifest_file(target)?;
    let mut view = TargetView::new(&component, signature);
    info!(
        "Loaded target {} ({} units) in {} ms",
        target.display(),
        view.unit_count(),
        start.elapsed().as_millis()
    );

    let analysis_start = Instant::now();
    let engine = MatchingEngine::new(corpus, config.clone());
    let reports = engine.analyze(&mut view, mode);
    info!(
        "Analyzed {} with {mode}: {} reports in {} ms",
        target.display(),
        reports.len(),
        analysis_start.elapsed().as_millis()
    );

    write_rank_file(rank_path, &reports)?;
    let file_view = FileView::from_reports(view.all_names(), &reports);
    file_view.write_to(BufWriter::new(File::create(file_path)?))?;

    Ok(TargetSummary {
        target: target.display().to_string(),
        units: view.unit_count(),
        reports: reports.len(),
        matched_units: reports.iter().map(Report::matched_units).sum(),
        unexplained_units: (mode == AnalysisMode::Decompose).then(|| view.content().size()),
        rank_file: rank_path.to_path_buf(),
        file_view: file_path.to_path_buf(),
        elapsed_ms: start.elapsed().as_millis(),
    })
}

fn write_rank_file(path: &Path, reports: &[Report]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for report in reports {
        writeln!(out, "{}", report.to_row(true))?;
    }
    out.flush()
}

fn print_text(summaries: &[TargetSummary], failures: &[TargetFailure], mode: AnalysisMode) {
    println!("Analysis Results ({mode})");
    println!("{}", "=".repeat(60));

    for summary in summaries {
        println!("\n{}", summary.target);
        println!("  Units: {}", summary.units);
        println!("  Reports: {}", summary.reports);
        println!("  Matched units: {}", summary.matched_units);
        if let (Some(unexplained), Some(fraction)) =
            (summary.unexplained_units, summary.unexplained_fraction())
        {
            println!(
                "  Unexplained: {} ({:.1}%)",
                unexplained,
                fraction * 100.0
            );
        }
        println!("  Rank file: {}", summary.rank_file.display());
        println!("  File view: {}", summary.file_view.display());
    }

    if !failures.is_empty() {
        println!("\nFailed targets:");
        for failure in failures {
            println!("  {}: {}", failure.target, failure.error);
        }
    }
}

fn print_json(
    summaries: &[TargetSummary],
    failures: &[TargetFailure],
    mode: AnalysisMode,
    signature: SignatureKind,
) -> anyhow::Result<()> {
    let targets: Vec<serde_json::Value> = summaries
        .iter()
        .map(|s| -> Result<serde_json::Value, serde_json::Error> {
            let mut value = serde_json::to_value(s)?;
            value["unexplained_fraction"] = serde_json::json!(s.unexplained_fraction());
            Ok(value)
        })
        .collect::<Result<_, _>>()?;

    let output = serde_json::json!({
        "mode": mode,
        "signature": signature,
        "targets": targets,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(summaries: &[TargetSummary]) {
    println!("target\tunits\treports\tmatched_units\tunexplained_units\trank_file\tfile_view");
    for s in summaries {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.target,
            s.units,
            s.reports,
            s.matched_units,
            s.unexplained_units
                .map_or_else(|| "NA".to_string(), |u| u.to_string()),
            s.rank_file.display(),
            s.file_view.display(),
        );
    }
}
