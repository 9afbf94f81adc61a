//! Command-line interface for ingredient-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **analyze**: Attribute the units of one or more targets to corpus libraries
//! - **compare**: Compare the signature content of two manifests
//! - **corpus**: Build, scan for, or list corpus sources
//!
//! ## Usage
//!
//! ```text
//! # Find candidate manifests and build a corpus from them
//! ingredient-solver corpus scan manifests/ --output valid.txt
//! ingredient-solver corpus build --list valid.txt --output db/maven
//!
//! # Decompose a target against the corpus
//! ingredient-solver analyze --corpus db/maven --output out/app app.tsv
//!
//! # Jaccard ranking, skipping the target's own corpus entry
//! ingredient-solver analyze --corpus db/maven --output out/app --mode jaccard --exclude-self app.tsv
//!
//! # JSON summary for scripting
//! ingredient-solver --format json analyze --corpus db/maven --output out/app app.tsv
//! ```

use clap::{Parser, Subcommand};

pub mod analyze;
pub mod compare;
pub mod corpus;

#[derive(Parser)]
#[command(name = "ingredient-solver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Identify third-party libraries embedded in compiled artifacts")]
#[command(
    long_about = "ingredient-solver attributes the compiled units of a target artifact to the library versions they came from.\n\nIt matches signature hashes produced by an external extractor against a corpus of known libraries and reports:\n- Which libraries explain which units, with exact ties grouped together\n- Units that no library explains\n- A per-unit view of every attribution"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attribute target units to corpus libraries
    Analyze(analyze::AnalyzeArgs),

    /// Compare two unit manifests
    Compare(compare::CompareArgs),

    /// Manage corpus sources
    Corpus(corpus::CorpusArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}
