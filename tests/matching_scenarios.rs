//! End-to-end matching scenarios: manifests -> corpus on disk -> analysis.

use std::path::{Path, PathBuf};

use ingredient_solver::catalog::builder::{BuildOptions, CorpusBuilder};
use ingredient_solver::matching::file_view::FileView;
use ingredient_solver::parsing::manifest::{manifest_row, parse_manifest_file, parse_manifest_text};
use ingredient_solver::utils::concurrent::{PoolConfig, WorkerPool};
use ingredient_solver::{
    AnalysisMode, ContentHash, HashMultiset, LibraryCorpus, MatchingConfig, MatchingEngine,
    SignatureKind, TargetView,
};

/// Manifest text for `classes`, each unit's signatures derived from its hash label
fn manifest(package: &str, classes: &[(&str, &str)]) -> String {
    classes
        .iter()
        .map(|(class, label)| {
            manifest_row(
                &format!("{class}.class"),
                class,
                package,
                label,
                &format!("code:{label}"),
                &ContentHash::of(label),
                &format!("bert:{label}"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write(dir: &Path, relative: &str, text: &str) -> PathBuf {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

fn pool() -> WorkerPool {
    WorkerPool::new(&PoolConfig {
        threads: 2,
        ..PoolConfig::default()
    })
    .unwrap()
}

/// Corpus with two versions of P and one version of Q
fn versioned_corpus(dir: &Path) -> (LibraryCorpus, Vec<PathBuf>) {
    let manifests = vec![
        write(
            dir,
            "lib/P/v1/P.tsv",
            &manifest("p", &[("p/A", "h1"), ("p/B", "h2"), ("p/C", "h3")]),
        ),
        write(
            dir,
            "lib/P/v2/P.tsv",
            &manifest("p", &[("p/A", "h1"), ("p/B", "h2"), ("p/C", "h3"), ("p/D", "h4")]),
        ),
        write(dir, "lib/Q/v1/Q.tsv", &manifest("q", &[("q/E", "h5"), ("q/F", "h6")])),
    ];

    let prefix = dir.join("db").join("corpus");
    std::fs::create_dir_all(prefix.parent().unwrap()).unwrap();
    let summary = CorpusBuilder::build(&manifests, &prefix, BuildOptions::default(), &pool()).unwrap();
    assert_eq!(summary.written, 3);

    let corpus = LibraryCorpus::load(&[prefix], SignatureKind::Code).unwrap();
    (corpus, manifests)
}

fn app_target() -> TargetView {
    let component = parse_manifest_text(&manifest(
        "app",
        &[("app/A", "h1"), ("app/B", "h2"), ("app/C", "h3"), ("app/E", "h5")],
    ))
    .unwrap();
    TargetView::new(&component, SignatureKind::Code)
}

#[test]
fn test_decomposition_picks_contained_version() {
    let dir = tempfile::tempdir().unwrap();
    let (corpus, manifests) = versioned_corpus(dir.path());
    let engine = MatchingEngine::new(&corpus, MatchingConfig::default());
    let mut target = app_target();

    let reports = engine.analyze(&mut target, AnalysisMode::Decompose);
    assert_eq!(reports.len(), 2);

    let v1 = manifests[0].display().to_string();
    let q = manifests[2].display().to_string();
    assert_eq!(reports[0].matched_units(), 3);
    assert_eq!(reports[0].library_names(), vec![v1.as_str()]);
    assert_eq!(reports[0].matched_names().len(), 3);
    assert_eq!(reports[1].matched_units(), 1);
    assert_eq!(reports[1].library_names(), vec![q.as_str()]);
    assert_eq!(reports[1].matched_names(), ["app/E".to_string()]);
    assert!(target.unexplained_names().is_empty());
}

#[test]
fn test_file_view_after_decomposition() {
    let dir = tempfile::tempdir().unwrap();
    let (corpus, manifests) = versioned_corpus(dir.path());
    let engine = MatchingEngine::new(&corpus, MatchingConfig::default());

    let component = parse_manifest_text(&manifest(
        "app",
        &[("app/A", "h1"), ("app/B", "h2"), ("app/C", "h3"), ("app/Z", "h9")],
    ))
    .unwrap();
    let mut target = TargetView::new(&component, SignatureKind::Code);
    let reports = engine.decompose(&mut target);
    assert_eq!(reports.len(), 1);

    let view = FileView::from_reports(target.all_names(), &reports);
    assert_eq!(view.len(), 4);
    assert_eq!(view.unmatched().collect::<Vec<_>>(), vec!["app/Z"]);

    let v1 = manifests[0].display().to_string();
    assert_eq!(view.groups("app/A").unwrap(), &[vec![v1.clone()]]);

    let mut out = Vec::new();
    view.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(&format!("app/A\t{v1};\t\n")));
    assert!(text.ends_with("app/Z\t\n"));
}

#[test]
fn test_jaccard_ties_versions_with_equal_claims() {
    let dir = tempfile::tempdir().unwrap();
    let (corpus, manifests) = versioned_corpus(dir.path());
    let engine = MatchingEngine::new(&corpus, MatchingConfig::default());
    let mut target = app_target();

    let reports = engine.analyze(&mut target, AnalysisMode::Jaccard);
    let names: Vec<Vec<&str>> = reports.iter().map(|r| r.library_names()).collect();
    let v1 = manifests[0].display().to_string();
    let v2 = manifests[1].display().to_string();
    let q = manifests[2].display().to_string();
    // Both P versions claim the same three units and share the first report
    assert_eq!(
        names,
        vec![vec![v1.as_str(), v2.as_str()], vec![q.as_str()]]
    );
    assert_eq!(target.content().size(), 4);
}

#[test]
fn test_self_is_filtered_by_package_identity() {
    let dir = tempfile::tempdir().unwrap();
    let (corpus, manifests) = versioned_corpus(dir.path());

    // Analyzing a corpus member against its own corpus
    let component = parse_manifest_file(&manifests[1]).unwrap();
    let mut target = TargetView::new(&component, SignatureKind::Code);
    let engine = MatchingEngine::new(
        &corpus,
        MatchingConfig {
            filter_by_package: true,
        },
    );

    // Both P versions share the package identity "p;" and are skipped
    assert!(engine.decompose(&mut target).is_empty());
    assert_eq!(target.unexplained_names().len(), 4);

    let unfiltered = MatchingEngine::new(&corpus, MatchingConfig::default());
    let mut target = TargetView::new(&component, SignatureKind::Code);
    let reports = unfiltered.decompose(&mut target);
    assert_eq!(reports[0].matched_units(), 4);
}

#[test]
fn test_duplicated_units_subtract_by_multiplicity() {
    let target: HashMultiset = ["h1", "h1", "h2"].iter().map(|s| ContentHash::of(s)).collect();
    let library: HashMultiset = ["h1", "h2"].iter().map(|s| ContentHash::of(s)).collect();

    let intersection = target.intersect(&library);
    assert_eq!(intersection.size(), 2);
    assert!((target.overlap_coefficient(&library) - 1.0).abs() < f64::EPSILON);

    let mut remaining = target.clone();
    remaining.subtract_in_place(&intersection);
    assert_eq!(remaining.size(), 1);
    assert_eq!(remaining.count(&ContentHash::of("h1")), 1);
}

#[test]
fn test_multiple_sources_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a/A.tsv", &manifest("a", &[("a/X", "x")]));
    let b = write(dir.path(), "b/B.tsv", &manifest("b", &[("b/Y", "y")]));

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    CorpusBuilder::build(&[a], &first, BuildOptions::default(), &pool()).unwrap();
    CorpusBuilder::build(&[b], &second, BuildOptions { full: true }, &pool()).unwrap();

    let corpus = LibraryCorpus::load(&[first, second], SignatureKind::Code).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.records[0].name_hashes.size(), 1);
}
