use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::hash::ContentHash;
use crate::core::library::LibraryRecord;
use crate::core::multiset::HashMultiset;
use crate::core::types::SignatureKind;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus: {0}")]
    ReadError(#[from] io::Error),

    #[error("Corpus file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to decode {path}: {error}")]
    DecodeError {
        path: PathBuf,
        #[source]
        error: bincode::Error,
    },

    #[error("Failed to encode corpus stream: {0}")]
    EncodeError(#[source] bincode::Error),

    #[error(
        "Inconsistent corpus {prefix}: {files} file names, {names} name sets, \
         {signatures} signature sets, {packages} package hashes"
    )]
    Inconsistent {
        prefix: String,
        files: usize,
        names: usize,
        signatures: usize,
        packages: usize,
    },
}

/// Suffix of the library path list
pub const FILE_LIST_SUFFIX: &str = ".txt";

/// Suffix of the package hash stream
pub const PACKAGE_LIST_SUFFIX: &str = ".packages.bin";

/// Path of a corpus component file: the prefix with `suffix` appended
#[must_use]
pub fn corpus_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Delete every component file of `prefix` that exists
pub fn remove_corpus_files(prefix: &Path) {
    let suffixes = [FILE_LIST_SUFFIX, PACKAGE_LIST_SUFFIX]
        .into_iter()
        .chain(SignatureKind::ALL.into_iter().map(SignatureKind::file_suffix));
    for suffix in suffixes {
        let path = corpus_path(prefix, suffix);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {e}", path.display()),
        }
    }
}

fn open(path: &Path) -> Result<File, CorpusError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CorpusError::MissingFile(path.to_path_buf()),
        _ => CorpusError::ReadError(e),
    })
}

/// Read consecutive bincode values until a clean end of stream
fn read_stream<T, R>(reader: R, path: &Path) -> Result<Vec<T>, CorpusError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = BufReader::new(reader);
    let mut values = Vec::new();
    while !reader.fill_buf()?.is_empty() {
        let value = bincode::deserialize_from(&mut reader).map_err(|error| {
            CorpusError::DecodeError {
                path: path.to_path_buf(),
                error,
            }
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Load the gzip-compressed hash-set stream of one signature kind
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be decoded.
pub fn read_hash_sets(path: &Path) -> Result<Vec<HashMultiset>, CorpusError> {
    let lists: Vec<Vec<ContentHash>> = read_stream(GzDecoder::new(open(path)?), path)?;
    Ok(lists.into_iter().map(HashMultiset::from).collect())
}

/// Load the package hash stream
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be decoded.
pub fn read_package_hashes(path: &Path) -> Result<Vec<ContentHash>, CorpusError> {
    read_stream(open(path)?, path)
}

/// Load a newline-separated list of paths
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable.
pub fn read_path_list(path: &Path) -> Result<Vec<String>, CorpusError> {
    let mut content = String::new();
    open(path)?.read_to_string(&mut content)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// The reference corpus: every cataloged library version.
///
/// Built once, then shared read-only between analyses.
#[derive(Debug)]
pub struct LibraryCorpus {
    /// All cataloged records, in load order
    pub records: Vec<LibraryRecord>,

    /// Signature kind of every record's `code_hashes`
    signature_kind: SignatureKind,

    /// Index: library name -> index in records vec
    name_to_index: HashMap<String, usize>,
}

impl LibraryCorpus {
    /// Create an empty corpus whose records hold `signature_kind` hashes
    #[must_use]
    pub fn new(signature_kind: SignatureKind) -> Self {
        Self {
            records: Vec::new(),
            signature_kind,
            name_to_index: HashMap::new(),
        }
    }

    /// Load and concatenate several corpus sources
    ///
    /// # Errors
    ///
    /// Fails on the first source that cannot be loaded.
    pub fn load(prefixes: &[PathBuf], kind: SignatureKind) -> Result<Self, CorpusError> {
        let mut corpus = Self::new(kind);
        for prefix in prefixes {
            for record in Self::load_source(prefix, kind)? {
                corpus.add_record(record);
            }
        }
        Ok(corpus)
    }

    /// Load the records of one corpus source.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::Inconsistent` if the four component files do not
    /// describe the same number of libraries, or an I/O or decode error.
    pub fn load_source(prefix: &Path, kind: SignatureKind) -> Result<Vec<LibraryRecord>, CorpusError> {
        let names = read_hash_sets(&corpus_path(prefix, SignatureKind::ClassName.file_suffix()))?;
        let signatures = if kind == SignatureKind::ClassName {
            names.clone()
        } else {
            read_hash_sets(&corpus_path(prefix, kind.file_suffix()))?
        };
        let files = read_path_list(&corpus_path(prefix, FILE_LIST_SUFFIX))?;
        let packages = read_package_hashes(&corpus_path(prefix, PACKAGE_LIST_SUFFIX))?;

        if files.len() != names.len()
            || files.len() != signatures.len()
            || files.len() != packages.len()
        {
            return Err(CorpusError::Inconsistent {
                prefix: prefix.display().to_string(),
                files: files.len(),
                names: names.len(),
                signatures: signatures.len(),
                packages: packages.len(),
            });
        }

        debug!("Loaded {} libraries from {}", files.len(), prefix.display());

        Ok(files
            .into_iter()
            .zip(names)
            .zip(signatures)
            .zip(packages)
            .map(|(((name, name_hashes), code_hashes), package_hash)| {
                LibraryRecord::new(name, name_hashes, code_hashes, package_hash)
            })
            .collect())
    }

    /// Add a record to the corpus
    pub fn add_record(&mut self, record: LibraryRecord) {
        self.name_to_index
            .insert(record.name.clone(), self.records.len());
        self.records.push(record);
    }

    /// Get a record by library name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LibraryRecord> {
        self.name_to_index.get(name).map(|&idx| &self.records[idx])
    }

    #[must_use]
    pub fn signature_kind(&self) -> SignatureKind {
        self.signature_kind
    }

    /// Persist the corpus under `prefix`
    ///
    /// # Errors
    ///
    /// Returns an error if any of the files cannot be written.
    pub fn save(&self, prefix: &Path) -> Result<(), CorpusError> {
        let mut writer = CorpusWriter::create(prefix, &[self.signature_kind])?;
        for record in &self.records {
            writer.write_entry(&record.name, &record.package_hash, |kind| {
                if kind == self.signature_kind {
                    record.code_hashes.to_sorted_vec()
                } else {
                    record.name_hashes.to_sorted_vec()
                }
            })?;
        }
        writer.finish()?;
        info!("Saved {} libraries to {}", self.len(), prefix.display());
        Ok(())
    }

    /// Number of libraries in the corpus
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if corpus is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Appends aligned entries to the component files of a corpus source
pub struct CorpusWriter {
    list: BufWriter<File>,
    packages: BufWriter<File>,
    streams: Vec<(SignatureKind, BufWriter<GzEncoder<File>>)>,
}

impl CorpusWriter {
    /// Create (truncate) the files for `prefix`. Class-name hashes are always
    /// written; `kinds` adds further signature streams.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be created.
    pub fn create(prefix: &Path, kinds: &[SignatureKind]) -> Result<Self, CorpusError> {
        let list = BufWriter::new(File::create(corpus_path(prefix, FILE_LIST_SUFFIX))?);
        let packages = BufWriter::new(File::create(corpus_path(prefix, PACKAGE_LIST_SUFFIX))?);

        let mut streams = Vec::new();
        for kind in SignatureKind::ALL {
            if kind == SignatureKind::ClassName || kinds.contains(&kind) {
                let file = File::create(corpus_path(prefix, kind.file_suffix()))?;
                streams.push((
                    kind,
                    BufWriter::new(GzEncoder::new(file, Compression::default())),
                ));
            }
        }

        Ok(Self {
            list,
            packages,
            streams,
        })
    }

    /// Signature kinds this writer emits
    #[must_use]
    pub fn kinds(&self) -> Vec<SignatureKind> {
        self.streams.iter().map(|(kind, _)| *kind).collect()
    }

    /// Append one library. `hashes` supplies the sorted hash list per kind.
    ///
    /// # Errors
    ///
    /// Returns an error if any stream cannot be written.
    pub fn write_entry<F>(
        &mut self,
        name: &str,
        package_hash: &ContentHash,
        mut hashes: F,
    ) -> Result<(), CorpusError>
    where
        F: FnMut(SignatureKind) -> Vec<ContentHash>,
    {
        writeln!(self.list, "{name}")?;
        bincode::serialize_into(&mut self.packages, package_hash)
            .map_err(CorpusError::EncodeError)?;
        for (kind, stream) in &mut self.streams {
            bincode::serialize_into(&mut *stream, &hashes(*kind))
                .map_err(CorpusError::EncodeError)?;
        }
        Ok(())
    }

    /// Flush every file and finish the gzip streams
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<(), CorpusError> {
        self.list.flush()?;
        self.packages.flush()?;
        for (_, stream) in self.streams {
            stream.into_inner().map_err(|e| e.into_error())?.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(items: &[&str]) -> HashMultiset {
        items.iter().map(|s| ContentHash::of(s)).collect()
    }

    fn sample_corpus() -> LibraryCorpus {
        let mut corpus = LibraryCorpus::new(SignatureKind::Code);
        corpus.add_record(LibraryRecord::new(
            "lib/p/1.0/p-1.0.jar",
            hashes(&["n1", "n2"]),
            hashes(&["c1", "c2", "c2"]),
            ContentHash::of("p;"),
        ));
        corpus.add_record(LibraryRecord::new(
            "lib/q/2.0/q-2.0.jar",
            hashes(&["n3"]),
            hashes(&["c3"]),
            ContentHash::of("q;"),
        ));
        corpus
    }

    #[test]
    fn test_corpus_path() {
        assert_eq!(
            corpus_path(Path::new("/tmp/db/maven"), ".code.bin"),
            PathBuf::from("/tmp/db/maven.code.bin")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("corpus");
        sample_corpus().save(&prefix).unwrap();

        let loaded = LibraryCorpus::load(&[prefix], SignatureKind::Code).unwrap();
        assert_eq!(loaded.len(), 2);

        let p = loaded.get("lib/p/1.0/p-1.0.jar").unwrap();
        assert!(p.code_hashes.multiset_equals(&hashes(&["c1", "c2", "c2"])));
        assert!(p.name_hashes.multiset_equals(&hashes(&["n1", "n2"])));
        assert_eq!(p.package_hash, ContentHash::of("p;"));
        assert_eq!(loaded.records[1].name, "lib/q/2.0/q-2.0.jar");
    }

    #[test]
    fn test_missing_signature_kind() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("corpus");
        sample_corpus().save(&prefix).unwrap();

        let err = LibraryCorpus::load(&[prefix], SignatureKind::Bertillonage).unwrap_err();
        assert!(matches!(err, CorpusError::MissingFile(_)));
    }

    #[test]
    fn test_inconsistent_lengths_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("corpus");
        sample_corpus().save(&prefix).unwrap();

        // An extra file name with no matching hash sets
        let list = corpus_path(&prefix, FILE_LIST_SUFFIX);
        let mut content = std::fs::read_to_string(&list).unwrap();
        content.push_str("lib/r/1.0/r-1.0.jar\n");
        std::fs::write(&list, content).unwrap();

        let err = LibraryCorpus::load_source(&prefix, SignatureKind::Code).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::Inconsistent {
                files: 3,
                names: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_stream_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("corpus");
        sample_corpus().save(&prefix).unwrap();

        let packages = corpus_path(&prefix, PACKAGE_LIST_SUFFIX);
        let bytes = std::fs::read(&packages).unwrap();
        std::fs::write(&packages, &bytes[..bytes.len() - 5]).unwrap();

        let err = read_package_hashes(&packages).unwrap_err();
        assert!(matches!(err, CorpusError::DecodeError { .. }));
    }
}
