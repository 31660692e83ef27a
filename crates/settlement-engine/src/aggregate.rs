//! Per-entry aggregation of prediction points

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};
use crate::model::{Entry, EntryId, EntryStatus, Fixture, FixtureId, OutcomeTag, Prediction, RoundId};

/// The fixtures that count for one aggregation, and which of them are finished
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScope {
    /// `None` for an overall (multi-round) scope.
    pub round: Option<RoundId>,
    fixtures: BTreeMap<FixtureId, bool>,
}

impl RoundScope {
    /// Scope covering one round's fixtures.
    pub fn from_fixtures(round: RoundId, fixtures: &[Fixture]) -> Self {
        Self {
            round: Some(round),
            fixtures: fixtures.iter().map(|f| (f.id, f.finished)).collect(),
        }
    }

    /// Scope covering fixtures from any number of rounds.
    pub fn overall<'a>(fixtures: impl IntoIterator<Item = &'a Fixture>) -> Self {
        Self {
            round: None,
            fixtures: fixtures.into_iter().map(|f| (f.id, f.finished)).collect(),
        }
    }

    pub fn contains(&self, fixture: FixtureId) -> bool {
        self.fixtures.contains_key(&fixture)
    }

    pub fn is_finished(&self, fixture: FixtureId) -> bool {
        self.fixtures.get(&fixture).copied().unwrap_or(false)
    }
}

/// Running total for one entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotal {
    pub entry: EntryId,
    pub points: u32,
    /// Number of `Exact` tags among finished fixtures.
    pub exact_count: u32,
    /// Number of finished fixtures that contributed.
    pub scored_count: u32,
}

/// Sum points per entry over the finished fixtures in `scope`.
///
/// Every entry with at least one prediction in scope appears in the result,
/// even if none of its fixtures has finished yet. Duplicate predictions for
/// the same (entry, fixture) pair count once, using the best-scoring one, so
/// the result never depends on input order.
pub fn aggregate(predictions: &[Prediction], scope: &RoundScope) -> BTreeMap<EntryId, EntryTotal> {
    let mut best: BTreeMap<(EntryId, FixtureId), (u32, bool)> = BTreeMap::new();
    let mut totals: BTreeMap<EntryId, EntryTotal> = BTreeMap::new();

    for p in predictions.iter().filter(|p| scope.contains(p.fixture)) {
        totals.entry(p.entry).or_insert(EntryTotal { entry: p.entry, ..Default::default() });

        if !scope.is_finished(p.fixture) {
            continue;
        }
        let candidate = (p.points, p.tag == Some(OutcomeTag::Exact));
        best.entry((p.entry, p.fixture))
            .and_modify(|current| *current = (*current).max(candidate))
            .or_insert(candidate);
    }

    for ((entry, _), (points, exact)) in best {
        if let Some(total) = totals.get_mut(&entry) {
            total.points = total.points.saturating_add(points);
            total.exact_count += exact as u32;
            total.scored_count += 1;
        }
    }

    tracing::debug!(
        round = ?scope.round,
        predictions = predictions.len(),
        entries = totals.len(),
        "aggregated entry totals"
    );
    totals
}

/// Entries that hit the exact result of one fixture, sorted by id.
pub fn exact_hits(predictions: &[Prediction], fixture: FixtureId) -> Vec<EntryId> {
    predictions
        .iter()
        .filter(|p| p.fixture == fixture && p.tag == Some(OutcomeTag::Exact))
        .map(|p| p.entry)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write aggregated totals back onto entries. Cancelled entries reset to 0.
pub fn apply_totals(entries: &mut [Entry], totals: &BTreeMap<EntryId, EntryTotal>) {
    for entry in entries.iter_mut() {
        entry.total = match entry.status {
            EntryStatus::Cancelled => 0,
            _ => totals.get(&entry.id).map(|t| t.points).unwrap_or(0),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Guess};
    use crate::random::SeededRng;
    use proptest::prelude::*;

    fn scored(fixture: FixtureId, entry: EntryId, points: u32, tag: OutcomeTag) -> Prediction {
        let mut p = Prediction::new(fixture, entry, Guess::score(0, 0));
        p.points = points;
        p.tag = Some(tag);
        p
    }

    fn fixtures() -> Vec<Fixture> {
        vec![
            Fixture::finished(1, Answer::Score { home: 1, away: 0 }),
            Fixture::finished(2, Answer::Score { home: 2, away: 2 }),
            Fixture::pending(3),
        ]
    }

    #[test]
    fn test_sums_finished_fixtures_only() {
        let scope = RoundScope::from_fixtures(1, &fixtures());
        let pending = scored(3, 100, 99, OutcomeTag::Exact);
        let predictions = vec![
            scored(1, 100, 5, OutcomeTag::Exact),
            scored(2, 100, 2, OutcomeTag::CorrectOutcome),
            pending,
            scored(1, 200, 0, OutcomeTag::Wrong),
        ];

        let totals = aggregate(&predictions, &scope);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&100], EntryTotal { entry: 100, points: 7, exact_count: 1, scored_count: 2 });
        assert_eq!(totals[&200], EntryTotal { entry: 200, points: 0, exact_count: 0, scored_count: 1 });
    }

    #[test]
    fn test_entry_with_only_pending_fixtures_is_zero() {
        let scope = RoundScope::from_fixtures(1, &fixtures());
        let totals = aggregate(&[scored(3, 300, 5, OutcomeTag::Exact)], &scope);
        assert_eq!(totals[&300].points, 0);
        assert_eq!(totals[&300].scored_count, 0);
    }

    #[test]
    fn test_out_of_scope_ignored() {
        let scope = RoundScope::from_fixtures(1, &fixtures());
        let totals = aggregate(&[scored(42, 400, 5, OutcomeTag::Exact)], &scope);
        assert!(totals.is_empty());
    }

    #[test]
    fn test_duplicates_count_once() {
        let scope = RoundScope::from_fixtures(1, &fixtures());
        let a = vec![scored(1, 100, 2, OutcomeTag::CorrectOutcome), scored(1, 100, 5, OutcomeTag::Exact)];
        let b: Vec<_> = a.iter().rev().cloned().collect();
        assert_eq!(aggregate(&a, &scope), aggregate(&b, &scope));
        assert_eq!(aggregate(&a, &scope)[&100].points, 5);
    }

    #[test]
    fn test_overall_scope_spans_rounds() {
        let round_one = fixtures();
        let round_two = vec![Fixture::finished(10, Answer::Choice(1))];
        let scope = RoundScope::overall(round_one.iter().chain(round_two.iter()));
        assert_eq!(scope.round, None);

        let totals = aggregate(
            &[scored(1, 100, 5, OutcomeTag::Exact), scored(10, 100, 3, OutcomeTag::Exact)],
            &scope,
        );
        assert_eq!(totals[&100].points, 8);
        assert_eq!(totals[&100].exact_count, 2);
    }

    #[test]
    fn test_exact_hits() {
        let predictions = vec![
            scored(1, 30, 5, OutcomeTag::Exact),
            scored(1, 10, 5, OutcomeTag::Exact),
            scored(1, 20, 2, OutcomeTag::CorrectOutcome),
            scored(2, 40, 5, OutcomeTag::Exact),
        ];
        assert_eq!(exact_hits(&predictions, 1), vec![10, 30]);
        assert!(exact_hits(&predictions, 3).is_empty());
    }

    #[test]
    fn test_apply_totals() {
        let mut entries = vec![
            Entry { id: 100, participant: 1, round: 1, number: 1, total: 0, status: EntryStatus::Active },
            Entry { id: 200, participant: 1, round: 1, number: 2, total: 9, status: EntryStatus::Cancelled },
            Entry { id: 300, participant: 2, round: 1, number: 1, total: 4, status: EntryStatus::Pending },
        ];
        let scope = RoundScope::from_fixtures(1, &fixtures());
        let totals = aggregate(
            &[scored(1, 100, 5, OutcomeTag::Exact), scored(1, 200, 5, OutcomeTag::Exact)],
            &scope,
        );
        apply_totals(&mut entries, &totals);
        assert_eq!(entries[0].total, 5);
        assert_eq!(entries[1].total, 0);
        assert_eq!(entries[2].total, 0);
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            raw in proptest::collection::vec((1u64..4, 1u64..6, 0u32..6, any::<bool>()), 0..40),
            seed in any::<u8>(),
        ) {
            let scope = RoundScope::from_fixtures(1, &fixtures());
            let predictions: Vec<_> = raw
                .iter()
                .map(|&(f, e, pts, exact)| {
                    scored(f, e, pts, if exact { OutcomeTag::Exact } else { OutcomeTag::Wrong })
                })
                .collect();
            let mut shuffled = predictions.clone();
            SeededRng::new(&[seed; 32], 0).shuffle(&mut shuffled);
            prop_assert_eq!(aggregate(&predictions, &scope), aggregate(&shuffled, &scope));
        }
    }
}
