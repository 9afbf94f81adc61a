//! Library corpus storage, candidate selection, and corpus building.
//!
//! A corpus is made of one or more **sources**. Each source is a path prefix
//! `P` with sibling component files:
//!
//! | File | Content |
//! |------|---------|
//! | `P.txt` | library paths, one per line |
//! | `P.packages.bin` | package-identity hashes |
//! | `P.cname.bin` | class-name hash lists (gzip) |
//! | `P.code.bin` | code-signature hash lists (gzip) |
//! | `P.file.bin` | file-content hash lists (gzip, full builds only) |
//! | `P.bert.bin` | bertillonage hash lists (gzip, full builds only) |
//!
//! All component files of a source describe the same libraries in the same
//! order. A source whose files disagree on the count is rejected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingredient_solver::{LibraryCorpus, SignatureKind};
//! use std::path::PathBuf;
//!
//! let corpus = LibraryCorpus::load(
//!     &[PathBuf::from("db/maven"), PathBuf::from("db/android")],
//!     SignatureKind::Code,
//! )
//! .unwrap();
//!
//! for record in &corpus.records {
//!     println!("{} ({} units)", record.name, record.size());
//! }
//! ```

pub mod builder;
pub mod index;
pub mod store;
