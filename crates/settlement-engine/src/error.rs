//! Engine error types

use crate::model::{EntryId, FixtureId, RoundStatus};

/// Errors raised while validating configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Admin fee above 100% (basis points > 10_000).
    FeeOutOfRange { bps: u32 },
    /// Score tiers must satisfy exact > correct_outcome > 0.
    TierOrdering { exact: u32, correct_outcome: u32 },
    /// A quiz question must be worth something.
    ZeroChoicePoints,
    /// At least one team per group has to qualify.
    ZeroQualifiers,
    /// Rule set version 0 is reserved for "unversioned".
    UnversionedRuleSet,
    /// The JSON document could not be parsed.
    Malformed(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::FeeOutOfRange { bps } =>
                write!(f, "admin fee of {} bps exceeds 10000 bps (100%)", bps),
            ConfigError::TierOrdering { exact, correct_outcome } => write!(
                f,
                "score tiers must satisfy exact > correct_outcome > 0 (got exact={}, correct_outcome={})",
                exact, correct_outcome
            ),
            ConfigError::ZeroChoicePoints => write!(f, "choice questions must award at least 1 point"),
            ConfigError::ZeroQualifiers => write!(f, "qualifiers_per_group must be at least 1"),
            ConfigError::UnversionedRuleSet => write!(f, "rule set version must be >= 1"),
            ConfigError::Malformed(msg) => write!(f, "malformed configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors returned by engine operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Scoring attempted before the fixture has a final result.
    FixtureNotFinished { fixture: FixtureId },
    /// A prediction was scored against a different fixture than the one it targets.
    FixtureMismatch { expected: FixtureId, found: FixtureId },
    /// Guess is missing a field or does not match the fixture kind.
    InvalidPrediction { fixture: FixtureId, entry: EntryId, reason: &'static str },
    /// Payouts, fee and remainder do not add back up to the gross pool.
    UnreconciledSettlement { gross_pool: u64, distributed: u64 },
    /// Money arithmetic overflowed u64.
    Overflow,
    /// Round lifecycle step out of order.
    InvalidTransition { from: RoundStatus, to: RoundStatus },
    /// Configuration rejected before any processing.
    InvalidConfig(ConfigError),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::FixtureNotFinished { fixture } =>
                write!(f, "fixture {} is not finished", fixture),
            EngineError::FixtureMismatch { expected, found } =>
                write!(f, "prediction targets fixture {} but fixture {} was supplied", found, expected),
            EngineError::InvalidPrediction { fixture, entry, reason } =>
                write!(f, "invalid prediction for entry {} on fixture {}: {}", entry, fixture, reason),
            EngineError::UnreconciledSettlement { gross_pool, distributed } => write!(
                f,
                "settlement does not reconcile: gross pool {} but {} accounted for",
                gross_pool, distributed
            ),
            EngineError::Overflow => write!(f, "arithmetic overflow"),
            EngineError::InvalidTransition { from, to } =>
                write!(f, "round cannot move from {:?} to {:?}", from, to),
            EngineError::InvalidConfig(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::InvalidConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::InvalidConfig(e)
    }
}

pub type Result<T> = core::result::Result<T, EngineError>;
