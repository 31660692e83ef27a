//! Leaderboards and tie resolution
//!
//! A participant may hold several entries; for standings only their best
//! entry counts. Ties share a rank, and the podium is built from the top
//! three *distinct* totals rather than the top three participants.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::aggregate::EntryTotal;
use crate::model::{Entry, EntryId, EntryStatus, ParticipantId};

/// Number of distinct score levels on the podium.
pub const PODIUM_BANDS: usize = 3;

/// A participant collapsed to its best entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestEntry {
    pub participant: ParticipantId,
    pub entry: EntryId,
    pub points: u32,
    /// Exact hits of the chosen entry.
    pub exact_count: u32,
    /// Highest exact count across all of the participant's entries.
    pub max_exact_count: u32,
}

/// One leaderboard row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Dense rank: equal totals share a rank, the next total gets rank + 1.
    pub rank: u32,
    pub participant: ParticipantId,
    pub entry: EntryId,
    pub points: u32,
    pub exact_count: u32,
}

/// Participants sharing one value (points or exact count)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub rank: u32,
    pub value: u32,
    pub members: Vec<ParticipantId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedList {
    pub standings: Vec<Standing>,
    pub podium: Vec<Band>,
    pub most_exact: Option<Band>,
    pub lowest: Option<Band>,
}

impl RankedList {
    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    /// Best of round: everyone on the first podium band.
    pub fn leaders(&self) -> &[ParticipantId] {
        self.podium.first().map(|b| b.members.as_slice()).unwrap_or(&[])
    }
}

/// Entry → participant map for live entries. Cancelled entries are skipped.
pub fn owners(entries: &[Entry]) -> BTreeMap<EntryId, ParticipantId> {
    entries
        .iter()
        .filter(|e| e.status != EntryStatus::Cancelled)
        .map(|e| (e.id, e.participant))
        .collect()
}

/// Collapse entries to one best entry per participant.
///
/// Highest total wins; equal totals go to the lowest entry id. Entry ids must
/// be issued sequentially per participant, so the lowest id is the lowest
/// entry number. Entries with no owner are dropped. Output is sorted by
/// participant id.
pub fn best_entries<F>(totals: &BTreeMap<EntryId, EntryTotal>, participant_of: F) -> Vec<BestEntry>
where
    F: Fn(EntryId) -> Option<ParticipantId>,
{
    let mut best: BTreeMap<ParticipantId, BestEntry> = BTreeMap::new();

    // BTreeMap iterates in ascending entry id, so only a strictly higher
    // total replaces the current pick.
    for total in totals.values() {
        let Some(participant) = participant_of(total.entry) else {
            continue;
        };
        best.entry(participant)
            .and_modify(|b| {
                if total.points > b.points {
                    b.entry = total.entry;
                    b.points = total.points;
                    b.exact_count = total.exact_count;
                }
                b.max_exact_count = b.max_exact_count.max(total.exact_count);
            })
            .or_insert(BestEntry {
                participant,
                entry: total.entry,
                points: total.points,
                exact_count: total.exact_count,
                max_exact_count: total.exact_count,
            });
    }

    best.into_values().collect()
}

/// Group values into dense-ranked bands, in the order given.
fn bands(rows: impl Iterator<Item = (u32, ParticipantId)>) -> Vec<Band> {
    let mut out: Vec<Band> = Vec::new();
    for (value, participant) in rows {
        match out.last_mut() {
            Some(band) if band.value == value => band.members.push(participant),
            _ => {
                let rank = out.len() as u32 + 1;
                out.push(Band { rank, value, members: vec![participant] });
            }
        }
    }
    out
}

/// Top three distinct totals. Expects standings sorted by points descending.
pub fn podium(standings: &[Standing]) -> Vec<Band> {
    let mut all = bands(standings.iter().map(|s| (s.points, s.participant)));
    all.truncate(PODIUM_BANDS);
    all
}

/// Participants with the most exact hits. No award when nobody hit one.
pub fn most_exact_award(best: &[BestEntry]) -> Option<Band> {
    let top = best.iter().map(|b| b.max_exact_count).max()?;
    if top == 0 {
        return None;
    }
    let members = best
        .iter()
        .filter(|b| b.max_exact_count == top)
        .map(|b| b.participant)
        .collect();
    Some(Band { rank: 1, value: top, members })
}

/// Participants on the lowest total, only when it is strictly below the top.
pub fn lowest_award(standings: &[Standing]) -> Option<Band> {
    let max = standings.iter().map(|s| s.points).max()?;
    let min = standings.iter().map(|s| s.points).min()?;
    if min >= max {
        return None;
    }
    let low: Vec<&Standing> = standings.iter().filter(|s| s.points == min).collect();
    Some(Band {
        rank: low.first().map(|s| s.rank).unwrap_or_default(),
        value: min,
        members: low.iter().map(|s| s.participant).collect(),
    })
}

/// Build the full leaderboard for one scope.
pub fn rank<F>(totals: &BTreeMap<EntryId, EntryTotal>, participant_of: F) -> RankedList
where
    F: Fn(EntryId) -> Option<ParticipantId>,
{
    let best = best_entries(totals, participant_of);
    if best.is_empty() {
        return RankedList::default();
    }

    let mut sorted = best.clone();
    sorted.sort_by(|a, b| b.points.cmp(&a.points).then(a.participant.cmp(&b.participant)));

    let mut standings = Vec::with_capacity(sorted.len());
    let mut rank = 0u32;
    let mut last_points = None;
    for b in &sorted {
        if last_points != Some(b.points) {
            rank += 1;
            last_points = Some(b.points);
        }
        standings.push(Standing {
            rank,
            participant: b.participant,
            entry: b.entry,
            points: b.points,
            exact_count: b.exact_count,
        });
    }

    let list = RankedList {
        podium: podium(&standings),
        most_exact: most_exact_award(&best),
        lowest: lowest_award(&standings),
        standings,
    };

    tracing::debug!(
        participants = list.standings.len(),
        podium_bands = list.podium.len(),
        "ranked participants"
    );
    list
}

/// Entries sharing the highest total; empty when nobody scored.
pub fn top_entries(totals: &BTreeMap<EntryId, EntryTotal>) -> Vec<EntryId> {
    let Some(max) = totals.values().map(|t| t.points).max() else {
        return Vec::new();
    };
    if max == 0 {
        return Vec::new();
    }
    totals.values().filter(|t| t.points == max).map(|t| t.entry).collect()
}
