use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::catalog::index::{split_into_tiers, CandidateFinder};
use crate::catalog::store::LibraryCorpus;
use crate::core::library::LibraryRecord;
use crate::core::multiset::HashMultiset;
use crate::core::target::TargetView;
use crate::core::types::AnalysisMode;
use crate::matching::report::{Report, TiedLibrary};

/// Configuration for the matching engine
#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// Skip libraries whose package identity equals the target's
    pub filter_by_package: bool,
}

/// Content of the current target explained by one library
#[derive(Debug)]
struct Claim<'a> {
    record: &'a LibraryRecord,
    intersection: HashMultiset,
}

/// Larger intersections first, then ascending library name
fn by_claim_size(a: &Claim<'_>, b: &Claim<'_>) -> Ordering {
    b.intersection
        .size()
        .cmp(&a.intersection.size())
        .then_with(|| a.record.name.cmp(&b.record.name))
}

#[derive(Debug)]
struct JaccardEntry<'a> {
    record: &'a LibraryRecord,
    project: &'a str,
    intersection: HashMultiset,
    jaccard: f64,
}

fn tied_library(record: &LibraryRecord) -> TiedLibrary {
    TiedLibrary {
        name: record.name.clone(),
        size: record.size(),
    }
}

/// The main matching engine
pub struct MatchingEngine<'a> {
    corpus: &'a LibraryCorpus,
    config: MatchingConfig,
}

impl<'a> MatchingEngine<'a> {
    /// Create a new matching engine over a loaded corpus
    pub fn new(corpus: &'a LibraryCorpus, config: MatchingConfig) -> Self {
        Self { corpus, config }
    }

    /// Run the ranking algorithm selected by `mode`
    pub fn analyze(&self, target: &mut TargetView, mode: AnalysisMode) -> Vec<Report> {
        match mode {
            AnalysisMode::Decompose => self.decompose(target),
            AnalysisMode::Jaccard => self.rank_by_jaccard(target),
        }
    }

    /// Greedy decomposition of the target into disjoint library attributions.
    ///
    /// Candidates are grouped into tiers of identical name overlap. Within a
    /// tier, the library claiming the most remaining content is reported
    /// (together with every library whose claim is identical), that content is
    /// removed from the target and from the other claims, and the tier is
    /// re-ranked. Content removed by a tier is gone for every later tier, so
    /// each unit ends up in at most one report.
    ///
    /// On return, `target.content()` holds the units no library explained.
    pub fn decompose(&self, target: &mut TargetView) -> Vec<Report> {
        let finder = CandidateFinder::new(self.corpus, self.config.filter_by_package);
        let candidates = finder.find_candidates_by_name(target);
        let tiers = split_into_tiers(candidates);
        debug!("Decomposing target across {} overlap tiers", tiers.len());

        let mut reports = Vec::new();
        for tier in tiers {
            let mut claims: Vec<Claim<'a>> = tier
                .into_iter()
                .map(|candidate| Claim {
                    record: candidate.record,
                    intersection: target.content().intersect(&candidate.record.code_hashes),
                })
                .filter(|claim| !claim.intersection.is_empty())
                .collect();

            while !claims.is_empty() {
                claims.sort_by(by_claim_size);
                let mut ranked = claims.into_iter();
                let Some(top) = ranked.next() else {
                    break;
                };

                let (tied, mut remaining): (Vec<Claim<'a>>, Vec<Claim<'a>>) =
                    ranked.partition(|claim| claim.intersection.multiset_equals(&top.intersection));

                let mut libraries = Vec::with_capacity(tied.len() + 1);
                libraries.push(tied_library(top.record));
                libraries.extend(tied.iter().map(|claim| tied_library(claim.record)));
                reports.push(Report::new(
                    top.intersection.size(),
                    libraries,
                    target.translate_names(&top.intersection),
                ));

                target.content_mut().subtract_in_place(&top.intersection);
                for claim in &mut remaining {
                    claim.intersection.subtract_in_place(&top.intersection);
                }
                remaining.retain(|claim| !claim.intersection.is_empty());
                claims = remaining;
            }
        }

        reports
    }

    /// Jaccard ranking with one report per project.
    ///
    /// The target is not modified: the same unit may appear in several
    /// reports. Libraries are ranked by Jaccard similarity with the target;
    /// the best unclaimed library is reported together with every unclaimed
    /// library having an identical intersection, and all of their projects are
    /// then claimed so other versions of them are skipped.
    #[must_use]
    pub fn rank_by_jaccard(&self, target: &TargetView) -> Vec<Report> {
        let finder = CandidateFinder::new(self.corpus, self.config.filter_by_package);
        let content = target.content();

        let mut entries: Vec<JaccardEntry<'a>> = finder
            .eligible(target)
            .map(|record| JaccardEntry {
                record,
                project: record.project(),
                intersection: content.intersect(&record.code_hashes),
                jaccard: content.jaccard(&record.code_hashes),
            })
            .collect();

        entries.sort_by(|a, b| {
            b.jaccard
                .partial_cmp(&a.jaccard)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.name.cmp(&b.record.name))
        });

        let mut ranked: VecDeque<JaccardEntry<'a>> = entries.into();
        let mut claimed: HashSet<&'a str> = HashSet::new();
        let mut reports = Vec::new();

        while let Some(head) = ranked.pop_front() {
            if head.intersection.is_empty() {
                break;
            }
            if claimed.contains(head.project) {
                continue;
            }

            let mut selected = vec![head];
            let mut rest = VecDeque::with_capacity(ranked.len());
            for entry in ranked.drain(..) {
                if claimed.contains(entry.project) {
                    continue;
                }
                if entry.intersection.multiset_equals(&selected[0].intersection) {
                    selected.push(entry);
                } else {
                    rest.push_back(entry);
                }
            }
            ranked = rest;

            for entry in &selected {
                claimed.insert(entry.project);
            }

            let head = &selected[0];
            reports.push(Report::new(
                head.intersection.size(),
                selected.iter().map(|e| tied_library(e.record)).collect(),
                target.translate_names(&head.intersection),
            ));
        }

        reports
    }
}
