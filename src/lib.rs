//! # ingredient-solver
//!
//! A library for identifying which third-party library versions are embedded
//! in a compiled artifact.
//!
//! Applications routinely ship copies of their dependencies: shaded, repackaged
//! or simply bundled. Declared dependency lists do not say which code actually
//! ended up in the artifact, and repackaging changes names, so name matching
//! alone is not enough.
//!
//! `ingredient-solver` compares the per-unit signature hashes of a target
//! (produced by an external extractor) against a corpus of known library
//! versions and attributes blocks of the target's units to the libraries that
//! explain them.
//!
//! ## Features
//!
//! - **Multiset matching**: Duplicated units are counted, not collapsed
//! - **Greedy decomposition**: Every unit is attributed at most once, and the
//!   rest is reported as unexplained
//! - **Jaccard ranking**: One best version per project
//! - **Exact ties**: Libraries with identical matched content are reported together
//! - **Self filtering**: Optionally ignore corpus entries that are the target itself
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingredient_solver::{AnalysisMode, LibraryCorpus, MatchingConfig, MatchingEngine, SignatureKind, TargetView};
//! use ingredient_solver::parsing::manifest::parse_manifest_file;
//! use std::path::{Path, PathBuf};
//!
//! // Load a corpus source written by `ingredient-solver corpus build`
//! let corpus = LibraryCorpus::load(&[PathBuf::from("db/maven")], SignatureKind::Code).unwrap();
//!
//! // Parse the target's unit manifest
//! let component = parse_manifest_file(Path::new("app.tsv")).unwrap();
//! let mut target = TargetView::new(&component, SignatureKind::Code);
//!
//! let engine = MatchingEngine::new(&corpus, MatchingConfig { filter_by_package: true });
//! for report in engine.analyze(&mut target, AnalysisMode::Decompose) {
//!     println!("{} units: {:?}", report.matched_units(), report.library_names());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Corpus storage, candidate selection and corpus building
//! - [`core`]: Hashes, multisets, components, library records and targets
//! - [`matching`]: Decomposition and Jaccard ranking
//! - [`parsing`]: Unit manifest parser
//! - [`utils`]: Worker pool and validation helpers
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::LibraryCorpus;
pub use core::component::Component;
pub use core::hash::ContentHash;
pub use core::multiset::HashMultiset;
pub use core::target::TargetView;
pub use core::types::*;
pub use matching::engine::{MatchingConfig, MatchingEngine};
pub use matching::report::Report;
