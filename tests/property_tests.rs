//! Property-based tests for multiset algebra and the ranking algorithms.
//!
//! Uses proptest to generate random inputs and verify invariants hold.

use std::collections::{HashMap, HashSet};

use ingredient_solver::core::library::{project_path, LibraryRecord};
use ingredient_solver::{ContentHash, HashMultiset, LibraryCorpus, MatchingConfig, MatchingEngine, SignatureKind, TargetView};
use proptest::prelude::*;

/// Hash of one of a small alphabet of units, so collisions are common
fn unit_hash(unit: u8) -> ContentHash {
    ContentHash::of(&format!("unit-{unit}"))
}

/// Strategy for multisets drawn from a 12-symbol alphabet
fn multiset() -> impl Strategy<Value = HashMultiset> {
    prop::collection::vec(0u8..12, 0..24).prop_map(|units| units.into_iter().map(unit_hash).collect())
}

/// Strategy for `(project, version, units)` library descriptions
fn library() -> impl Strategy<Value = (u8, u8, Vec<u8>)> {
    (0u8..4, 0u8..3, prop::collection::vec(0u8..12, 1..8))
}

fn build_corpus(libraries: &[(u8, u8, Vec<u8>)]) -> LibraryCorpus {
    let mut corpus = LibraryCorpus::new(SignatureKind::Code);
    let mut seen = HashSet::new();
    for (project, version, units) in libraries {
        let name = format!("lib/p{project}/v{version}/p{project}.jar");
        if !seen.insert(name.clone()) {
            continue;
        }
        let hashes: HashMultiset = units.iter().copied().map(unit_hash).collect();
        corpus.add_record(LibraryRecord::new(
            name.as_str(),
            hashes.clone(),
            hashes,
            ContentHash::of(&name),
        ));
    }
    corpus
}

/// Target whose every unit has its own name
fn build_target(units: &[u8]) -> TargetView {
    TargetView::from_units(
        units
            .iter()
            .enumerate()
            .map(|(i, &u)| (format!("T/{i}"), unit_hash(u), unit_hash(u))),
        ContentHash::of("target"),
    )
}

proptest! {
    /// Intersection is commutative and bounded by both operands
    #[test]
    fn intersection_is_commutative_and_bounded(a in multiset(), b in multiset()) {
        let ab = a.intersect(&b);
        let ba = b.intersect(&a);
        prop_assert!(ab.multiset_equals(&ba));
        prop_assert!(ab.size() <= a.size().min(b.size()));
        prop_assert_eq!(ab.size(), a.intersection_size(&b));
        prop_assert!(a.contains_all(&ab));
        prop_assert!(b.contains_all(&ab));
    }

    /// Containment makes the intersection equal to the contained side
    #[test]
    fn containment_intersection(a in multiset(), b in multiset()) {
        let mut union = a.clone();
        union.extend(b.to_sorted_vec());
        prop_assert!(union.contains_all(&a));
        prop_assert!(union.intersect(&a).multiset_equals(&a));
    }

    /// Overlap lies in [0, 1] and is 1 exactly on non-empty containment
    #[test]
    fn overlap_bounds(a in multiset(), b in multiset()) {
        let overlap = a.overlap_coefficient(&b);
        prop_assert!((0.0..=1.0).contains(&overlap));
        let full = !b.is_empty() && a.contains_all(&b);
        prop_assert_eq!((overlap - 1.0).abs() < f64::EPSILON, full);
    }

    /// Jaccard lies in [0, 1] and is symmetric
    #[test]
    fn jaccard_bounds_and_symmetry(a in multiset(), b in multiset()) {
        let j = a.jaccard(&b);
        prop_assert!((0.0..=1.0).contains(&j));
        prop_assert!((j - b.jaccard(&a)).abs() < f64::EPSILON);
    }

    /// Subtracting nothing changes nothing; subtracting self empties
    #[test]
    fn subtraction_identities(a in multiset(), b in multiset()) {
        let mut same = a.clone();
        same.subtract_in_place(&HashMultiset::new());
        prop_assert!(same.multiset_equals(&a));

        let mut emptied = a.clone();
        emptied.subtract_in_place(&a);
        prop_assert!(emptied.is_empty());
        prop_assert_eq!(emptied.size(), 0);

        let mut diff = a.clone();
        diff.subtract_in_place(&b);
        prop_assert_eq!(diff.size(), a.size() - a.intersection_size(&b));
    }

    /// Decomposition attributes every unit at most once
    #[test]
    fn decomposition_is_disjoint(
        libraries in prop::collection::vec(library(), 0..10),
        units in prop::collection::vec(0u8..12, 0..20),
    ) {
        let corpus = build_corpus(&libraries);
        let engine = MatchingEngine::new(&corpus, MatchingConfig::default());
        let mut target = build_target(&units);
        let original = target.content().clone();

        let reports = engine.decompose(&mut target);

        let matched: usize = reports.iter().map(|r| r.matched_units()).sum();
        prop_assert_eq!(matched + target.content().size(), original.size());
        prop_assert!(original.contains_all(target.content()));

        let all_names: HashSet<String> = target.all_names().into_iter().collect();
        for report in &reports {
            prop_assert!(report.matched_units() > 0);
            prop_assert!(!report.libraries().is_empty());
            prop_assert!(report.matched_names().iter().all(|n| all_names.contains(n)));
        }
    }

    /// Jaccard ranking emits at most one report per project
    #[test]
    fn jaccard_one_report_per_project(
        libraries in prop::collection::vec(library(), 0..10),
        units in prop::collection::vec(0u8..12, 0..20),
    ) {
        let corpus = build_corpus(&libraries);
        let engine = MatchingEngine::new(&corpus, MatchingConfig::default());
        let target = build_target(&units);

        let reports = engine.rank_by_jaccard(&target);

        let mut owner: HashMap<String, usize> = HashMap::new();
        for (i, report) in reports.iter().enumerate() {
            prop_assert!(report.matched_units() > 0);
            for name in report.library_names() {
                let project = project_path(name).to_string();
                let first = *owner.entry(project).or_insert(i);
                prop_assert_eq!(first, i);
            }
        }
        prop_assert_eq!(target.content().size(), units.len());
    }
}
