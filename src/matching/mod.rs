//! Library attribution for a single target.
//!
//! - [`MatchingEngine`](engine::MatchingEngine): runs one of the two ranking
//!   algorithms against a loaded corpus
//! - [`Report`](report::Report): one block of matched units and the libraries
//!   tied on it
//! - [`FileView`](file_view::FileView): the same result regrouped per unit name
//!
//! ## Algorithms
//!
//! 1. **Decomposition** (default): candidates are found by name overlap and
//!    grouped into tiers of equal overlap. Each tier greedily claims the
//!    largest remaining block of the target's content. Every unit is
//!    attributed at most once; what is left afterwards is unexplained.
//! 2. **Jaccard ranking**: all libraries are ranked by Jaccard similarity with
//!    the target and at most one report is emitted per project. Units may be
//!    reported more than once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingredient_solver::{AnalysisMode, LibraryCorpus, MatchingConfig, MatchingEngine, SignatureKind, TargetView};
//! use ingredient_solver::parsing::manifest::parse_manifest_file;
//! use std::path::{Path, PathBuf};
//!
//! let corpus = LibraryCorpus::load(&[PathBuf::from("db/maven")], SignatureKind::Code).unwrap();
//! let component = parse_manifest_file(Path::new("app.tsv")).unwrap();
//! let mut target = TargetView::new(&component, SignatureKind::Code);
//!
//! let engine = MatchingEngine::new(&corpus, MatchingConfig::default());
//! for report in engine.analyze(&mut target, AnalysisMode::Decompose) {
//!     println!("{report}");
//! }
//! println!("unexplained: {:?}", target.unexplained_names());
//! ```

pub mod engine;
pub mod file_view;
pub mod report;
