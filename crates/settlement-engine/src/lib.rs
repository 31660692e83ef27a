//! Settlement Engine
//!
//! Deterministic core of the prediction pools: scoring, per-entry totals,
//! leaderboards, prize settlement and knockout draws.
//! This crate is compiled to:
//! - Native (for the orchestration / persistence layer)
//! - WASM (for the web front end)

mod error;
mod random;
mod model;
mod rules;
mod scoring;
mod aggregate;
mod ranking;
mod settlement;
mod bracket;

#[cfg(feature = "wasm")]
mod wasm;

pub use error::{ConfigError, EngineError, Result};
pub use random::{fresh_seed, SeededRng};
pub use model::{
    Answer, Entry, EntryId, EntryStatus, Fixture, FixtureId, GroupId, Guess, OutcomeTag,
    ParticipantId, Prediction, ResultCategory, RoundId, RoundStatus, TeamId,
};
pub use rules::{DrawRules, RoundConfig, RuleSet, ScoringTable, BPS_DENOMINATOR, DEFAULT_QUALIFIERS_PER_GROUP};
pub use scoring::{evaluate, rescore_fixture, score, Evaluation};
pub use aggregate::{aggregate, apply_totals, exact_hits, EntryTotal, RoundScope};
pub use ranking::{
    best_entries, lowest_award, most_exact_award, owners, podium, rank, top_entries, Band,
    BestEntry, RankedList, Standing, PODIUM_BANDS,
};
pub use settlement::{
    draw_trigger, pool_breakdown, settle, settle_round, AccumulationTrigger, PoolBreakdown,
    PrizeOutcome, Round,
};
pub use bracket::{
    compute_standings, draw_bracket, generate_matchups, generate_matchups_fresh, qualify, Draw,
    DrawNotice, GroupMatch, GroupStanding, Matchup, QualifiedTeam,
};
