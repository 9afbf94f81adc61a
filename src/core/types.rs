use serde::{Deserialize, Serialize};

/// Which derivation of a compiled unit is hashed for matching.
///
/// All four produce the same [`ContentHash`](crate::core::hash::ContentHash)
/// type; one kind is chosen for a whole analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    /// Normalized class name only
    ClassName,
    /// Structural code signature (members, types, call targets)
    Code,
    /// Hash of the raw unit bytes
    File,
    /// Alternate "bertillonage" class signature
    Bertillonage,
}

impl SignatureKind {
    /// Every kind, in on-disk order
    pub const ALL: [SignatureKind; 4] = [
        SignatureKind::ClassName,
        SignatureKind::Code,
        SignatureKind::File,
        SignatureKind::Bertillonage,
    ];

    /// File suffix of the corpus stream holding this kind
    #[must_use]
    pub fn file_suffix(self) -> &'static str {
        match self {
            Self::ClassName => ".cname.bin",
            Self::Code => ".code.bin",
            Self::File => ".file.bin",
            Self::Bertillonage => ".bert.bin",
        }
    }

    /// Kinds that are only written to a corpus on a full build
    #[must_use]
    pub fn is_optional(self) -> bool {
        matches!(self, Self::File | Self::Bertillonage)
    }
}

impl std::fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassName => write!(f, "class-name"),
            Self::Code => write!(f, "code"),
            Self::File => write!(f, "file"),
            Self::Bertillonage => write!(f, "bertillonage"),
        }
    }
}

/// Which ranking algorithm to run against the corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Greedy decomposition of the target into disjoint library regions
    #[default]
    Decompose,
    /// Jaccard ranking with one report per project
    Jaccard,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decompose => write!(f, "decompose"),
            Self::Jaccard => write!(f, "jaccard"),
        }
    }
}
