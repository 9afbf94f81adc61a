use std::cmp::Ordering;

use crate::core::library::LibraryRecord;
use crate::core::target::TargetView;

use super::store::LibraryCorpus;

/// A library whose names overlap the target's
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub record: &'a LibraryRecord,
    /// Fraction of the library's name hashes present in the target
    pub overlap: f64,
}

/// Finds candidate libraries that might be embedded in a target
pub struct CandidateFinder<'a> {
    corpus: &'a LibraryCorpus,
    filter_by_package: bool,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(corpus: &'a LibraryCorpus, filter_by_package: bool) -> Self {
        Self {
            corpus,
            filter_by_package,
        }
    }

    /// Records the target may be compared with. With package filtering on,
    /// records sharing the target's package identity (the target itself, or a
    /// copy of it) are skipped.
    pub fn eligible(&self, target: &TargetView) -> impl Iterator<Item = &'a LibraryRecord> {
        let filter = self.filter_by_package;
        let package_hash = target.package_hash();
        self.corpus
            .records
            .iter()
            .filter(move |record| !filter || record.package_hash != package_hash)
    }

    /// Candidates by name overlap, sorted by overlap (descending) then name.
    ///
    /// A library with more names than the target cannot be fully embedded in
    /// it and is never a candidate.
    #[must_use]
    pub fn find_candidates_by_name(&self, target: &TargetView) -> Vec<Candidate<'a>> {
        let target_names = target.name_hashes();
        let mut candidates: Vec<Candidate<'a>> = self
            .eligible(target)
            .filter(|record| record.name_hashes.size() <= target_names.size())
            .map(|record| Candidate {
                record,
                overlap: target_names.overlap_coefficient(&record.name_hashes),
            })
            .filter(|c| c.overlap > 0.0)
            .collect();

        candidates.sort_by(|a, b| {
            b.overlap
                .partial_cmp(&a.overlap)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.name.cmp(&b.record.name))
        });
        candidates
    }
}

/// Split sorted candidates into maximal runs of exactly equal overlap
#[must_use]
#[allow(clippy::float_cmp)] // Tiers are defined by exact equality
pub fn split_into_tiers<'a>(candidates: Vec<Candidate<'a>>) -> Vec<Vec<Candidate<'a>>> {
    let mut tiers: Vec<Vec<Candidate<'a>>> = Vec::new();
    for candidate in candidates {
        match tiers.last_mut() {
            Some(tier) if tier[0].overlap == candidate.overlap => tier.push(candidate),
            _ => tiers.push(vec![candidate]),
        }
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::ContentHash;
    use crate::core::multiset::HashMultiset;
    use crate::core::types::SignatureKind;

    fn hashes(items: &[&str]) -> HashMultiset {
        items.iter().map(|s| ContentHash::of(s)).collect()
    }

    fn record(name: &str, names: &[&str], package: &str) -> LibraryRecord {
        LibraryRecord::new(name, hashes(names), hashes(names), ContentHash::of(package))
    }

    fn target(names: &[&str], package: &str) -> TargetView {
        TargetView::from_units(
            names
                .iter()
                .map(|n| (n.to_string(), ContentHash::of(n), ContentHash::of(n))),
            ContentHash::of(package),
        )
    }

    fn corpus(records: Vec<LibraryRecord>) -> LibraryCorpus {
        let mut corpus = LibraryCorpus::new(SignatureKind::Code);
        for r in records {
            corpus.add_record(r);
        }
        corpus
    }

    #[test]
    fn test_candidates_sorted_by_overlap_then_name() {
        let corpus = corpus(vec![
            record("b", &["x", "y"], "b"),
            record("a", &["x", "y"], "a"),
            record("c", &["x", "z"], "c"),
            record("d", &["z", "w"], "d"),
        ]);
        let target = target(&["x", "y", "q"], "t");

        let finder = CandidateFinder::new(&corpus, false);
        let candidates = finder.find_candidates_by_name(&target);
        let names: Vec<&str> = candidates.iter().map(|c| c.record.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!((candidates[2].overlap - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_larger_libraries_are_not_candidates() {
        let corpus = corpus(vec![record("big", &["x", "y", "z"], "big")]);
        let target = target(&["x", "y"], "t");
        let finder = CandidateFinder::new(&corpus, false);
        assert!(finder.find_candidates_by_name(&target).is_empty());
    }

    #[test]
    fn test_package_filter() {
        let corpus = corpus(vec![record("self", &["x"], "same"), record("other", &["x"], "o")]);
        let target = target(&["x"], "same");

        let unfiltered = CandidateFinder::new(&corpus, false);
        assert_eq!(unfiltered.find_candidates_by_name(&target).len(), 2);

        let filtered = CandidateFinder::new(&corpus, true);
        let candidates = filtered.find_candidates_by_name(&target);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].record.name, "other");
    }

    #[test]
    fn test_split_into_tiers() {
        let corpus = corpus(vec![
            record("a", &["x"], "a"),
            record("b", &["x"], "b"),
            record("c", &["x", "z"], "c"),
        ]);
        let target = target(&["x", "y"], "t");
        let finder = CandidateFinder::new(&corpus, false);
        let tiers = split_into_tiers(finder.find_candidates_by_name(&target));

        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].len(), 2);
        assert_eq!(tiers[1][0].record.name, "c");
        assert!(split_into_tiers(Vec::new()).is_empty());
    }
}
