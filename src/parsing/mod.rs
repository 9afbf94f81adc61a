//! Parsers for signature-extractor output.
//!
//! The bytecode signature extractor is an external tool. It writes one
//! tab-separated **unit manifest** per artifact, which this module turns into a
//! [`Component`](crate::core::component::Component).
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingredient_solver::parsing::manifest::parse_manifest_file;
//! use std::path::Path;
//!
//! let component = parse_manifest_file(Path::new("widgets-1.0.tsv")).unwrap();
//! println!("{} units in {} packages", component.len(), component.packages.len());
//! ```
//!
//! ## Columns
//!
//! | Column | Description |
//! |--------|-------------|
//! | entry | Archive entry path (duplicates are skipped) |
//! | class_name | Original unit name, reported back in matches |
//! | package | Package identifier |
//! | name_signature | Normalized name, hashed for candidate filtering |
//! | code_signature | Structural signature |
//! | file_sha1 | SHA-1 of the raw unit bytes, 40 hex chars |
//! | bertillonage_signature | Alternate class signature |

pub mod manifest;
