//! Corpus builder for turning extractor manifests into a corpus source.
//!
//! `CorpusBuilder` parses many unit manifests in parallel and appends every
//! loadable one to the component files of a single corpus prefix. The library
//! name recorded for each entry is the manifest path as given.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::store::{remove_corpus_files, CorpusError, CorpusWriter};
use crate::core::types::SignatureKind;
use crate::parsing::manifest::parse_manifest_file;
use crate::utils::concurrent::{PoolError, WorkerPool};
use crate::utils::validation::is_manifest_file;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Also write file-content and bertillonage hash streams
    pub full: bool,
}

impl BuildOptions {
    /// Signature streams to write
    #[must_use]
    pub fn kinds(&self) -> Vec<SignatureKind> {
        SignatureKind::ALL
            .into_iter()
            .filter(|kind| self.full || !kind.is_optional())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Builds corpus sources from unit manifests
pub struct CorpusBuilder;

impl CorpusBuilder {
    /// Parse `manifests` in parallel and write every loadable one to `prefix`.
    ///
    /// Entries are appended under a single lock so the path list, package
    /// stream and hash streams stay aligned. The order of entries follows task
    /// completion, not the input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus files cannot be created or written, or
    /// if the pool fails. The partially written files of `prefix` are removed
    /// first. Manifests that do not parse are logged and counted as skipped.
    pub fn build(
        manifests: &[PathBuf],
        prefix: &Path,
        options: BuildOptions,
        pool: &WorkerPool,
    ) -> Result<BuildSummary, BuilderError> {
        let writer = CorpusWriter::create(prefix, &options.kinds())?;
        info!(
            "Building corpus {} from {} manifests ({:?})",
            prefix.display(),
            manifests.len(),
            writer.kinds()
        );
        let writer = Arc::new(Mutex::new(Some(writer)));

        let task_writer = Arc::clone(&writer);
        let batch = pool.map(manifests.to_vec(), move |path: PathBuf| -> Result<bool, CorpusError> {
            let component = match parse_manifest_file(&path) {
                Ok(component) => component,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    return Ok(false);
                }
            };
            let name = path.display().to_string();
            let package_hash = component.package_hash();

            let mut guard = task_writer.lock();
            let Some(writer) = guard.as_mut() else {
                return Ok(false);
            };
            let written = writer.write_entry(&name, &package_hash, |kind| component.hash_list(kind));
            if let Err(e) = written {
                // The streams are misaligned now; stop every other task from writing
                guard.take();
                return Err(e);
            }
            debug!("Wrote {name} ({} units)", component.len());
            Ok(true)
        });

        let outcomes = match batch {
            Ok(outcomes) => outcomes,
            Err(e) => {
                remove_corpus_files(prefix);
                return Err(e.into());
            }
        };

        let mut summary = BuildSummary::default();
        let mut failure: Option<BuilderError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(true)) => summary.written += 1,
                Ok(Ok(false)) => summary.skipped += 1,
                Ok(Err(e)) => {
                    failure.get_or_insert(e.into());
                }
                Err(e) => {
                    failure.get_or_insert(e.into());
                }
            }
        }

        let remaining = writer.lock().take();
        let finished = match (failure, remaining) {
            (Some(e), _) => Err(e),
            (None, Some(writer)) => writer.finish().map_err(BuilderError::from),
            (None, None) => Ok(()),
        };
        if let Err(e) = finished {
            warn!("Discarding corpus {}: {e}", prefix.display());
            remove_corpus_files(prefix);
            return Err(e);
        }

        info!(
            "Corpus {} written: {} libraries, {} skipped",
            prefix.display(),
            summary.written,
            summary.skipped
        );
        Ok(summary)
    }
}

/// Walk `root` for unit manifests and return the loadable ones, sorted.
///
/// # Errors
///
/// Returns an error if the pool fails.
pub fn scan_manifests(root: &Path, pool: &WorkerPool) -> Result<Vec<PathBuf>, BuilderError> {
    let found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable path under {}: {e}", root.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_manifest_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();
    debug!("Found {} manifest files under {}", found.len(), root.display());

    let checked = pool.map_all(found, |path: PathBuf| match parse_manifest_file(&path) {
        Ok(_) => Some(path),
        Err(e) => {
            warn!("Invalid manifest {}: {e}", path.display());
            None
        }
    })?;

    let mut valid: Vec<PathBuf> = checked.into_iter().flatten().collect();
    valid.sort();
    Ok(valid)
}
