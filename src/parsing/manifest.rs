use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::core::component::{Component, UnitEntry};
use crate::core::hash::{ContentHash, HashError};
use crate::utils::validation::check_unit_limit;

/// Number of tab-separated columns in a manifest row
pub const MANIFEST_COLUMNS: usize = 7;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest format: {0}")]
    InvalidFormat(String),

    #[error("Invalid file hash on line {line}: {source}")]
    InvalidHash {
        line: usize,
        #[source]
        source: HashError,
    },

    #[error("No usable units found in manifest")]
    Empty,

    #[error("Too many units: {0} exceeds maximum allowed (1000000)")]
    TooManyUnits(usize),
}

/// Parse a unit manifest file into a [`Component`]
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_manifest_file(path: &Path) -> Result<Component, ParseError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_manifest_text(&content)?.with_source(path.display().to_string()))
}

/// Parse unit manifest text.
///
/// Columns: `entry`, `class_name`, `package`, `name_signature`,
/// `code_signature`, `file_sha1`, `bertillonage_signature`. Blank lines and
/// `#` comments are skipped, as is a header row starting with `entry`.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for short rows, `ParseError::InvalidHash`
/// for a malformed file hash, `ParseError::Empty` when no units are found, or
/// `ParseError::TooManyUnits` if the limit is exceeded.
pub fn parse_manifest_text(text: &str) -> Result<Component, ParseError> {
    let mut entries = Vec::new();
    let mut packages = BTreeSet::new();
    let mut seen_entries: HashSet<&str> = HashSet::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        if first_data_line {
            first_data_line = false;
            if fields[0].trim().eq_ignore_ascii_case("entry") {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < MANIFEST_COLUMNS {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected {MANIFEST_COLUMNS}",
                fields.len()
            )));
        }

        let entry = fields[0].trim();
        let class_name = fields[1].trim();
        if entry.is_empty() || class_name.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has an empty entry or class name"
            )));
        }

        // A corrupted archive may repeat the same entry many times
        if !seen_entries.insert(entry) {
            warn!("Skipping duplicated entry '{entry}' on line {line_num}");
            continue;
        }

        let file_hash = ContentHash::from_hex(fields[5].trim()).map_err(|source| {
            ParseError::InvalidHash {
                line: line_num,
                source,
            }
        })?;

        if check_unit_limit(entries.len()).is_some() {
            return Err(ParseError::TooManyUnits(entries.len()));
        }

        entries.push(UnitEntry::new(
            class_name,
            fields[3],
            fields[4],
            file_hash,
            fields[6],
        ));
        packages.insert(fields[2].trim().to_string());
    }

    if entries.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(Component::new(entries, packages))
}

/// Format one manifest row from its raw columns
#[must_use]
pub fn manifest_row(
    entry: &str,
    class_name: &str,
    package: &str,
    name_signature: &str,
    code_signature: &str,
    file_hash: &ContentHash,
    bertillonage_signature: &str,
) -> String {
    format!(
        "{entry}\t{class_name}\t{package}\t{name_signature}\t{code_signature}\t{file_hash}\t{bertillonage_signature}"
    )
}
