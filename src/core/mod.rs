//! Core data types for library identification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ContentHash`](hash::ContentHash): A 160-bit digest of a unit signature
//! - [`HashMultiset`](multiset::HashMultiset): Counted hash collection, the matching kernel
//! - [`Component`](component::Component): A loaded artifact and its compiled units
//! - [`LibraryRecord`](library::LibraryRecord): A cataloged library version
//! - [`TargetView`](target::TargetView): A target prepared for matching
//! - [`SignatureKind`](types::SignatureKind), [`AnalysisMode`](types::AnalysisMode): Run options
//!
//! ## Signature kinds
//!
//! Every unit carries four alternative hashes. One kind is chosen per run:
//!
//! | Kind | Derived from | Survives |
//! |------|--------------|----------|
//! | class-name | normalized unit name | recompilation, code edits |
//! | code | structural signature | renaming of locals, reformatting |
//! | file | raw bytes | nothing; exact copies only |
//! | bertillonage | alternate class signature | repackaging |
//!
//! Class-name hashes are always used for candidate filtering, regardless of
//! the chosen kind.

pub mod component;
pub mod hash;
pub mod library;
pub mod multiset;
pub mod target;
pub mod types;
