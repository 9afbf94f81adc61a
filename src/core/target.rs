use std::collections::HashMap;

use tracing::debug;

use crate::core::component::Component;
use crate::core::hash::ContentHash;
use crate::core::multiset::HashMultiset;
use crate::core::types::SignatureKind;

/// A target artifact prepared for matching.
///
/// `content` starts as the full signature multiset of the target and is
/// consumed by decomposition as units get attributed to libraries. Every hash
/// keeps all of the original unit names that produced it: the first one as the
/// primary name, later ones in a collision list.
#[derive(Debug, Clone)]
pub struct TargetView {
    content: HashMultiset,
    name_hashes: HashMultiset,
    hash_to_name: HashMap<ContentHash, String>,
    collision_names: HashMap<ContentHash, Vec<String>>,
    package_hash: ContentHash,
    signature_kind: SignatureKind,
}

impl TargetView {
    /// Build the view of `component` using `kind` for content matching
    #[must_use]
    pub fn new(component: &Component, kind: SignatureKind) -> Self {
        let mut view = Self::from_units(
            component
                .entries
                .iter()
                .map(|e| (e.raw_name.clone(), e.name_hash, e.hash(kind))),
            component.package_hash(),
        );
        view.signature_kind = kind;
        view
    }

    /// Build a view from `(raw_name, name_hash, signature_hash)` triples
    pub fn from_units<I>(units: I, package_hash: ContentHash) -> Self
    where
        I: IntoIterator<Item = (String, ContentHash, ContentHash)>,
    {
        let mut content = HashMultiset::new();
        let mut name_hashes = HashMultiset::new();
        let mut hash_to_name: HashMap<ContentHash, String> = HashMap::new();
        let mut collision_names: HashMap<ContentHash, Vec<String>> = HashMap::new();

        for (raw_name, name_hash, hash) in units {
            if let Some(registered) = hash_to_name.get(&hash) {
                debug!("A hash for {raw_name} conflicts with {registered}");
                collision_names.entry(hash).or_default().push(raw_name);
            } else {
                hash_to_name.insert(hash, raw_name);
            }
            content.insert(hash);
            name_hashes.insert(name_hash);
        }

        Self {
            content,
            name_hashes,
            hash_to_name,
            collision_names,
            package_hash,
            signature_kind: SignatureKind::Code,
        }
    }

    /// Remaining (not yet attributed) signature content
    #[must_use]
    pub fn content(&self) -> &HashMultiset {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut HashMultiset {
        &mut self.content
    }

    /// Name-hash multiset used for candidate filtering
    #[must_use]
    pub fn name_hashes(&self) -> &HashMultiset {
        &self.name_hashes
    }

    #[must_use]
    pub fn package_hash(&self) -> ContentHash {
        self.package_hash
    }

    #[must_use]
    pub fn signature_kind(&self) -> SignatureKind {
        self.signature_kind
    }

    /// Translate a subset of this target's hashes back to original unit names.
    ///
    /// Hashes are visited in ascending order; each yields its primary name
    /// followed by any colliding names. Names are emitted per distinct hash,
    /// not per occurrence: a subset holding one of several colliding units
    /// still yields every name of that hash, so the same names can appear in
    /// more than one report even though the unit counts stay disjoint.
    ///
    /// # Panics
    ///
    /// Panics if a hash was never seen by this target. Hashes drawn from the
    /// target's own content always have a name.
    #[must_use]
    pub fn translate_names(&self, hashes: &HashMultiset) -> Vec<String> {
        let mut names = Vec::with_capacity(hashes.size());
        for hash in hashes.sorted_keys() {
            let primary = self
                .hash_to_name
                .get(&hash)
                .unwrap_or_else(|| panic!("matched hash {hash} is not found in the target"));
            names.push(primary.clone());
            if let Some(others) = self.collision_names.get(&hash) {
                names.extend(others.iter().cloned());
            }
        }
        names
    }

    /// Names of the units not yet attributed to any library
    #[must_use]
    pub fn unexplained_names(&self) -> Vec<String> {
        self.translate_names(&self.content)
    }

    /// Every original unit name of the target, sorted
    #[must_use]
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .hash_to_name
            .values()
            .chain(self.collision_names.values().flatten())
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of units recorded when the view was built
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.name_hashes.size()
    }
}
