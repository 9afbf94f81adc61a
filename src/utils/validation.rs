//! Centralized validation and helper functions.

use std::path::Path;

/// Maximum number of units accepted from a single manifest (DOS protection)
pub const MAX_UNITS: usize = 1_000_000;

/// File extension of unit manifests
pub const MANIFEST_EXTENSION: &str = "tsv";

/// Validate that a string is a valid SHA-1 digest (40 hex characters).
///
/// # Examples
///
/// ```
/// use ingredient_solver::utils::validation::is_valid_sha1;
///
/// assert!(is_valid_sha1("a9993e364706816aba3e25717850c26c9cd0d89d"));
/// assert!(!is_valid_sha1("not-a-sha1"));
/// assert!(!is_valid_sha1("a9993e364706816aba3e25717850c26c9cd0d89")); // 39 chars
/// ```
#[must_use]
pub fn is_valid_sha1(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check if adding another unit would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new unit.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_unit_limit(count: usize) -> Option<String> {
    if count >= MAX_UNITS {
        Some(format!(
            "Too many units: adding another would exceed maximum of {MAX_UNITS}"
        ))
    } else {
        None
    }
}

/// Whether `path` looks like a unit manifest
#[must_use]
pub fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MANIFEST_EXTENSION))
}
