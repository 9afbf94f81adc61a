use crate::core::hash::ContentHash;
use crate::core::multiset::HashMultiset;

/// A cataloged library artifact (one version of one project)
#[derive(Debug, Clone)]
pub struct LibraryRecord {
    /// Identifying path of the artifact, e.g. `maven/org/foo/bar/1.2/bar-1.2.jar`
    pub name: String,

    /// Hashes of the normalized unit names
    pub name_hashes: HashMultiset,

    /// Hashes of the unit signatures of the corpus' signature kind
    pub code_hashes: HashMultiset,

    /// Package identity hash
    pub package_hash: ContentHash,
}

impl LibraryRecord {
    pub fn new(
        name: impl Into<String>,
        name_hashes: HashMultiset,
        code_hashes: HashMultiset,
        package_hash: ContentHash,
    ) -> Self {
        Self {
            name: name.into(),
            name_hashes,
            code_hashes,
            package_hash,
        }
    }

    /// Version-independent project identifier of this record
    #[must_use]
    pub fn project(&self) -> &str {
        project_path(&self.name)
    }

    /// Number of units in the record (code signature multiset size)
    #[must_use]
    pub fn size(&self) -> usize {
        self.code_hashes.size()
    }
}

/// Project grouping of a library path.
///
/// Versions of a project are laid out as `<project>/<version>/<file>`, so the
/// project is the path up to and including the second-to-last `/`. A path with
/// fewer than two separators is its own project.
#[must_use]
pub fn project_path(name: &str) -> &str {
    let Some(last) = name.rfind('/') else {
        return name;
    };
    match name[..last].rfind('/') {
        Some(index) => &name[..=index],
        None => name,
    }
}
