use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::core::hash::ContentHash;

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// A counted collection of content hashes.
///
/// Multiplicities matter: an artifact may legitimately contain structurally
/// identical units more than once, and treating the collection as a plain set
/// would undercount true overlap.
///
/// Invariants: every stored multiplicity is >= 1 and `size` is always the sum
/// of the stored multiplicities.
///
/// There is intentionally no `PartialEq` impl; use [`HashMultiset::multiset_equals`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ContentHash>", into = "Vec<ContentHash>")]
pub struct HashMultiset {
    counts: HashMap<ContentHash, u32>,
    size: usize,
}

impl HashMultiset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of elements, counting multiplicity
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of distinct hashes
    #[must_use]
    pub fn distinct_len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Multiplicity of `hash` (0 if absent)
    #[must_use]
    pub fn count(&self, hash: &ContentHash) -> u32 {
        self.counts.get(hash).copied().unwrap_or(0)
    }

    /// Add one occurrence of `hash`
    pub fn insert(&mut self, hash: ContentHash) {
        *self.counts.entry(hash).or_insert(0) += 1;
        self.size += 1;
    }

    /// Visit each distinct hash once. Order is unspecified.
    pub fn keys(&self) -> impl Iterator<Item = &ContentHash> + '_ {
        self.counts.keys()
    }

    /// Visit each distinct hash with its multiplicity. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&ContentHash, u32)> + '_ {
        self.counts.iter().map(|(hash, &count)| (hash, count))
    }

    /// Distinct hashes in ascending order
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<ContentHash> {
        let mut keys: Vec<ContentHash> = self.counts.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Expanded, sorted element list (each hash repeated by its multiplicity)
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<ContentHash> {
        let mut elements = Vec::with_capacity(self.size);
        for hash in self.sorted_keys() {
            let count = self.count(&hash) as usize;
            elements.extend(std::iter::repeat(hash).take(count));
        }
        elements
    }

    /// Per-key minimum of both multiplicities. Neither operand is modified.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };

        let mut counts = HashMap::new();
        let mut size = 0usize;
        for (hash, &v1) in &small.counts {
            if let Some(&v2) = large.counts.get(hash) {
                let value = v1.min(v2);
                counts.insert(*hash, value);
                size += value as usize;
            }
        }

        Self { counts, size }
    }

    /// Size of the intersection without materializing it
    #[must_use]
    pub fn intersection_size(&self, other: &Self) -> usize {
        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .counts
            .iter()
            .filter_map(|(hash, &v1)| large.counts.get(hash).map(|&v2| v1.min(v2) as usize))
            .sum()
    }

    /// Overlap coefficient: `|self ∩ other| / |other|`.
    ///
    /// Directional: the fraction of `other` covered by `self`. Returns 0.0 when
    /// `other` is empty.
    #[must_use]
    pub fn overlap_coefficient(&self, other: &Self) -> f64 {
        if other.size == 0 {
            return 0.0;
        }
        count_to_f64(self.intersection_size(other)) / count_to_f64(other.size)
    }

    /// Jaccard similarity: `|A ∩ B| / |A ∪ B|` with multiset union.
    ///
    /// Returns 0.0 when both multisets are empty.
    #[must_use]
    pub fn jaccard(&self, other: &Self) -> f64 {
        let intersection = self.intersection_size(other);
        let union = self.size + other.size - intersection;
        if union == 0 {
            0.0
        } else {
            count_to_f64(intersection) / count_to_f64(union)
        }
    }

    /// True iff every hash of `other` occurs in `self` at least as many times.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other
            .counts
            .iter()
            .all(|(hash, &v2)| self.counts.get(hash).is_some_and(|&v1| v1 >= v2))
    }

    /// Remove `other` from `self`, flooring multiplicities at zero.
    ///
    /// Iterates whichever side is smaller; the result is the same either way.
    pub fn subtract_in_place(&mut self, other: &Self) {
        if self.counts.len() < other.counts.len() {
            let mut removed = 0usize;
            self.counts.retain(|hash, v1| match other.counts.get(hash) {
                Some(&v2) if v2 >= *v1 => {
                    removed += *v1 as usize;
                    false
                }
                Some(&v2) => {
                    *v1 -= v2;
                    removed += v2 as usize;
                    true
                }
                None => true,
            });
            self.size -= removed;
        } else {
            for (hash, &v2) in &other.counts {
                if let Entry::Occupied(mut entry) = self.counts.entry(*hash) {
                    let v1 = *entry.get();
                    if v2 >= v1 {
                        entry.remove();
                        self.size -= v1 as usize;
                    } else {
                        *entry.get_mut() = v1 - v2;
                        self.size -= v2 as usize;
                    }
                }
            }
        }

        debug_assert_eq!(
            self.size,
            self.counts.values().map(|&v| v as usize).sum::<usize>(),
            "cached multiset size diverged from stored multiplicities"
        );
        debug_assert!(self.counts.values().all(|&v| v > 0));
    }

    /// Multiset equality: same total size and identical hash/multiplicity pairs.
    #[must_use]
    pub fn multiset_equals(&self, other: &Self) -> bool {
        self.size == other.size
            && self.counts.len() == other.counts.len()
            && other
                .counts
                .iter()
                .all(|(hash, &v2)| self.counts.get(hash) == Some(&v2))
    }
}

impl FromIterator<ContentHash> for HashMultiset {
    fn from_iter<I: IntoIterator<Item = ContentHash>>(iter: I) -> Self {
        let mut set = Self::new();
        for hash in iter {
            set.insert(hash);
        }
        set
    }
}

impl Extend<ContentHash> for HashMultiset {
    fn extend<I: IntoIterator<Item = ContentHash>>(&mut self, iter: I) {
        for hash in iter {
            self.insert(hash);
        }
    }
}

impl From<Vec<ContentHash>> for HashMultiset {
    fn from(elements: Vec<ContentHash>) -> Self {
        elements.into_iter().collect()
    }
}

impl From<HashMultiset> for Vec<ContentHash> {
    fn from(set: HashMultiset) -> Self {
        set.to_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> ContentHash {
        ContentHash::of(s)
    }

    fn set(items: &[&str]) -> HashMultiset {
        items.iter().map(|s| h(s)).collect()
    }

    #[test]
    fn test_construction_counts_duplicates() {
        let s = set(&["a", "a", "b"]);
        assert_eq!(s.size(), 3);
        assert_eq!(s.distinct_len(), 2);
        assert_eq!(s.count(&h("a")), 2);
        assert_eq!(s.count(&h("b")), 1);
        assert_eq!(s.count(&h("c")), 0);
    }

    #[test]
    fn test_intersect_takes_minimum() {
        let target = set(&["h1", "h1", "h2"]);
        let library = set(&["h1", "h2"]);

        let both = target.intersect(&library);
        assert_eq!(both.size(), 2);
        assert_eq!(both.count(&h("h1")), 1);
        assert_eq!(both.count(&h("h2")), 1);
        assert!((target.overlap_coefficient(&library) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_subtract_after_intersection() {
        let mut target = set(&["h1", "h1", "h2"]);
        let library = set(&["h1", "h2"]);
        let both = target.intersect(&library);

        target.subtract_in_place(&both);
        assert!(target.multiset_equals(&set(&["h1"])));
        assert_eq!(target.size(), 1);
    }

    #[test]
    fn test_subtract_floors_at_zero_in_both_directions() {
        // self smaller than other
        let mut small = set(&["a", "b"]);
        small.subtract_in_place(&set(&["a", "a", "a", "c", "d", "e"]));
        assert!(small.multiset_equals(&set(&["b"])));

        // self larger than other
        let mut large = set(&["a", "a", "b", "c", "d"]);
        large.subtract_in_place(&set(&["a", "a", "a"]));
        assert!(large.multiset_equals(&set(&["b", "c", "d"])));
    }

    #[test]
    fn test_overlap_is_directional() {
        let big = set(&["a", "b", "c", "d"]);
        let small = set(&["a", "b"]);
        assert!((big.overlap_coefficient(&small) - 1.0).abs() < f64::EPSILON);
        assert!((small.overlap_coefficient(&big) - 0.5).abs() < f64::EPSILON);
        assert!(big.overlap_coefficient(&HashMultiset::new()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard() {
        let a = set(&["1", "2", "3"]);
        let b = set(&["2", "3", "4"]);
        assert!((a.jaccard(&b) - 0.5).abs() < 0.001);
        assert!((b.jaccard(&a) - 0.5).abs() < 0.001);

        let empty = HashMultiset::new();
        assert!(empty.jaccard(&empty).abs() < f64::EPSILON);
        assert!(a.jaccard(&empty).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_all_respects_multiplicity() {
        let a = set(&["x", "x", "y"]);
        assert!(a.contains_all(&set(&["x", "y"])));
        assert!(a.contains_all(&set(&["x", "x"])));
        assert!(!a.contains_all(&set(&["x", "x", "x"])));
        assert!(!a.contains_all(&set(&["z"])));
        assert!(a.contains_all(&HashMultiset::new()));
    }

    #[test]
    fn test_multiset_equals() {
        assert!(set(&["a", "b", "a"]).multiset_equals(&set(&["a", "a", "b"])));
        assert!(!set(&["a", "b"]).multiset_equals(&set(&["a", "a", "b"])));
        assert!(!set(&["a", "b"]).multiset_equals(&set(&["a", "c"])));
        assert!(HashMultiset::new().multiset_equals(&HashMultiset::new()));
    }

    #[test]
    fn test_serde_uses_expanded_sorted_list() {
        let s = set(&["b", "a", "a"]);
        let encoded = bincode::serialize(&s).unwrap();
        let decoded: HashMultiset = bincode::deserialize(&encoded).unwrap();
        assert!(decoded.multiset_equals(&s));

        let elements = s.to_sorted_vec();
        assert_eq!(elements.len(), 3);
        assert!(elements.windows(2).all(|w| w[0] <= w[1]));
    }
}
