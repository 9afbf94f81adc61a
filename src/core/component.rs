use std::collections::BTreeSet;

use crate::core::hash::ContentHash;
use crate::core::multiset::HashMultiset;
use crate::core::types::SignatureKind;

/// One compiled unit of an artifact, as produced by the signature extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    /// Original (raw) unit name, e.g. `com/example/Widget`
    pub raw_name: String,

    /// Hash of the normalized unit name
    pub name_hash: ContentHash,

    /// Hash of the structural code signature
    pub code_hash: ContentHash,

    /// Hash of the raw unit bytes
    pub file_hash: ContentHash,

    /// Hash of the bertillonage signature
    pub bertillonage_hash: ContentHash,
}

impl UnitEntry {
    /// Build an entry from extractor strings; the signatures are digested
    /// immediately and not retained.
    pub fn new(
        raw_name: impl Into<String>,
        name_signature: &str,
        code_signature: &str,
        file_hash: ContentHash,
        bertillonage_signature: &str,
    ) -> Self {
        Self {
            raw_name: raw_name.into(),
            name_hash: ContentHash::of(name_signature),
            code_hash: ContentHash::of(code_signature),
            file_hash,
            bertillonage_hash: ContentHash::of(bertillonage_signature),
        }
    }

    /// The hash of the requested signature kind
    #[must_use]
    pub fn hash(&self, kind: SignatureKind) -> ContentHash {
        match kind {
            SignatureKind::ClassName => self.name_hash,
            SignatureKind::Code => self.code_hash,
            SignatureKind::File => self.file_hash,
            SignatureKind::Bertillonage => self.bertillonage_hash,
        }
    }
}

/// A loaded artifact: its compiled units plus the packages they live in
#[derive(Debug, Clone, Default)]
pub struct Component {
    /// Where the artifact was loaded from (if known)
    pub source: Option<String>,

    /// Units in extractor order
    pub entries: Vec<UnitEntry>,

    /// Distinct package identifiers observed in the artifact
    pub packages: BTreeSet<String>,
}

impl Component {
    #[must_use]
    pub fn new(entries: Vec<UnitEntry>, packages: BTreeSet<String>) -> Self {
        Self {
            source: None,
            entries,
            packages,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sorted list of hashes of one kind, one per unit
    #[must_use]
    pub fn hash_list(&self, kind: SignatureKind) -> Vec<ContentHash> {
        let mut hashes: Vec<ContentHash> = self.entries.iter().map(|e| e.hash(kind)).collect();
        hashes.sort_unstable();
        hashes
    }

    /// Multiset of hashes of one kind
    #[must_use]
    pub fn hash_multiset(&self, kind: SignatureKind) -> HashMultiset {
        self.entries.iter().map(|e| e.hash(kind)).collect()
    }

    /// Package identity: digest of the sorted package names, each followed by `;`
    #[must_use]
    pub fn package_hash(&self) -> ContentHash {
        let mut joined = String::new();
        for package in &self.packages {
            joined.push_str(package);
            joined.push(';');
        }
        ContentHash::of(&joined)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
