//! Prize pool settlement
//!
//! Gross pool = entry fees + carried accumulation. The admin fee is only
//! taken when somebody is paid; a round without a payout rolls the entire
//! gross pool forward. Division dust goes to the fee, never to a winner.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::error::{EngineError, Result};
use crate::model::{Answer, EntryId, ResultCategory, RoundId, RoundStatus};
use crate::rules::{RoundConfig, BPS_DENOMINATOR};

/// Caller-decided reason to roll the pool forward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccumulationTrigger {
    #[default]
    None,
    /// Product rule says nobody won (e.g. the featured club lost).
    NoWinners,
    /// The result is not rewarded in this pool (e.g. a draw).
    OutcomeDisallowed,
}

/// Gross / fee / net split of a round's pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBreakdown {
    pub gross_pool: u64,
    pub admin_fee: u64,
    pub net_pool: u64,
}

/// Settlement result for one round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrizeOutcome {
    /// Nothing paid; the whole gross pool moves to the next round.
    Accumulated { accumulated: u64 },
    Paid {
        gross_pool: u64,
        admin_fee: u64,
        /// Division dust, kept by the house on top of `admin_fee`.
        remainder: u64,
        winners: Vec<EntryId>,
        amount_per_winner: u64,
    },
}

impl PrizeOutcome {
    /// Amount that seeds the next round's `previous_accumulated`.
    pub fn carry_forward(&self) -> u64 {
        match self {
            PrizeOutcome::Accumulated { accumulated } => *accumulated,
            PrizeOutcome::Paid { .. } => 0,
        }
    }

    /// Admin fee including the division remainder.
    pub fn total_fee(&self) -> u64 {
        match self {
            PrizeOutcome::Accumulated { .. } => 0,
            PrizeOutcome::Paid { admin_fee, remainder, .. } => admin_fee + remainder,
        }
    }

    /// (entry, amount) for every winner.
    pub fn payouts(&self) -> Vec<(EntryId, u64)> {
        match self {
            PrizeOutcome::Accumulated { .. } => Vec::new(),
            PrizeOutcome::Paid { winners, amount_per_winner, .. } =>
                winners.iter().map(|w| (*w, *amount_per_winner)).collect(),
        }
    }
}

/// Compute gross, fee and net for a round.
///
/// The fee is rounded half-up on the smallest currency unit.
pub fn pool_breakdown(round: &RoundConfig, participant_count: u32) -> Result<PoolBreakdown> {
    round.validate()?;

    let gross_pool = round
        .entry_fee
        .checked_mul(participant_count as u64)
        .and_then(|fees| fees.checked_add(round.previous_accumulated))
        .ok_or(EngineError::Overflow)?;

    let denominator = BPS_DENOMINATOR as u128;
    let scaled = gross_pool as u128 * round.admin_fee_bps as u128 + denominator / 2;
    let admin_fee = u64::try_from(scaled / denominator).map_err(|_| EngineError::Overflow)?;

    // validate() caps the fee at 100%, so this cannot underflow
    let net_pool = gross_pool.checked_sub(admin_fee).ok_or(EngineError::Overflow)?;

    Ok(PoolBreakdown { gross_pool, admin_fee, net_pool })
}

/// Settle one round's prize pool.
///
/// # Arguments
/// * `round` - Prize configuration for the round
/// * `winners` - Winning entries (duplicates are ignored)
/// * `participant_count` - Number of paid entries
/// * `trigger` - Product-specific accumulation decision from the caller
///
/// # Errors
/// * `InvalidConfig` - fee out of range
/// * `Overflow` - pool does not fit in u64
/// * `UnreconciledSettlement` - payouts and fees do not add back to the gross pool
pub fn settle(
    round: &RoundConfig,
    winners: &[EntryId],
    participant_count: u32,
    trigger: AccumulationTrigger,
) -> Result<PrizeOutcome> {
    let pool = pool_breakdown(round, participant_count)?;
    let winners: Vec<EntryId> = winners.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

    if trigger != AccumulationTrigger::None || winners.is_empty() {
        tracing::info!(
            gross_pool = pool.gross_pool,
            ?trigger,
            "no payout, accumulating full gross pool"
        );
        return Ok(PrizeOutcome::Accumulated { accumulated: pool.gross_pool });
    }

    let count = winners.len() as u64;
    let amount_per_winner = pool.net_pool / count;
    let remainder = pool.net_pool % count;

    let distributed = amount_per_winner
        .checked_mul(count)
        .and_then(|paid| paid.checked_add(pool.admin_fee))
        .and_then(|total| total.checked_add(remainder))
        .ok_or(EngineError::Overflow)?;
    if distributed != pool.gross_pool {
        return Err(EngineError::UnreconciledSettlement {
            gross_pool: pool.gross_pool,
            distributed,
        });
    }

    tracing::info!(
        gross_pool = pool.gross_pool,
        admin_fee = pool.admin_fee,
        remainder,
        winners = winners.len(),
        amount_per_winner,
        "round settled"
    );

    Ok(PrizeOutcome::Paid {
        gross_pool: pool.gross_pool,
        admin_fee: pool.admin_fee,
        remainder,
        winners,
        amount_per_winner,
    })
}

/// `OutcomeDisallowed` when the round does not reward draws and the result is one.
pub fn draw_trigger(round: &RoundConfig, result: &Answer) -> AccumulationTrigger {
    match result {
        Answer::Score { home, away }
            if !round.allow_draws && ResultCategory::of(*home, *away) == ResultCategory::Draw =>
        {
            AccumulationTrigger::OutcomeDisallowed
        }
        _ => AccumulationTrigger::None,
    }
}

/// A round with its lifecycle state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    #[serde(default)]
    pub status: RoundStatus,
    pub config: RoundConfig,
}

impl Round {
    pub fn new(id: RoundId, config: RoundConfig) -> Self {
        Self { id, status: RoundStatus::Open, config }
    }

    /// Freeze predictions once every fixture is finished.
    pub fn lock(&mut self) -> Result<()> {
        self.status.advance_to(RoundStatus::Locked)
    }

    pub fn archive(&mut self) -> Result<()> {
        self.status.advance_to(RoundStatus::Archived)
    }
}

/// Settle a locked round and mark it settled.
///
/// The round stays locked if settlement fails.
pub fn settle_round(
    round: &mut Round,
    winners: &[EntryId],
    participant_count: u32,
    trigger: AccumulationTrigger,
) -> Result<PrizeOutcome> {
    if round.status != RoundStatus::Locked {
        return Err(EngineError::InvalidTransition {
            from: round.status,
            to: RoundStatus::Settled,
        });
    }
    let outcome = settle(&round.config, winners, participant_count, trigger)?;
    round.status.advance_to(RoundStatus::Settled)?;
    tracing::debug!(round = round.id, carry = outcome.carry_forward(), "round marked settled");
    Ok(outcome)
}
