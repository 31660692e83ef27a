//! Rule tables and round configuration
//!
//! Everything product-specific (point tiers, fee, draw constraints) lives
//! here and is passed into each call. Values are validated once, before any
//! fixture is processed.

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// 100% expressed in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default number of teams advancing from each group.
pub const DEFAULT_QUALIFIERS_PER_GROUP: u32 = 2;

/// Point value for each outcome tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringTable {
    /// Both sides of the score guessed exactly.
    pub exact: u32,
    /// Right winner (or draw), wrong score.
    pub correct_outcome: u32,
    /// Correct option on a single-choice question.
    pub choice: u32,
}

impl ScoringTable {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.correct_outcome == 0 || self.exact <= self.correct_outcome {
            return Err(ConfigError::TierOrdering {
                exact: self.exact,
                correct_outcome: self.correct_outcome,
            });
        }
        if self.choice == 0 {
            return Err(ConfigError::ZeroChoicePoints);
        }
        Ok(())
    }
}

/// Knockout draw constraints; each rule toggles independently
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawRules {
    /// Pair group winners against runners-up from a different group.
    pub cross_group: bool,
    /// Prefer partners from another group whenever one is available.
    pub avoid_same_group: bool,
    /// Shuffle pairing order instead of following group order.
    pub balance: bool,
    /// Top-K per group advance.
    pub qualifiers_per_group: u32,
}

impl Default for DrawRules {
    fn default() -> Self {
        Self {
            cross_group: true,
            avoid_same_group: true,
            balance: true,
            qualifiers_per_group: DEFAULT_QUALIFIERS_PER_GROUP,
        }
    }
}

impl DrawRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qualifiers_per_group == 0 {
            return Err(ConfigError::ZeroQualifiers);
        }
        Ok(())
    }
}

/// Versioned bundle of rules for one product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: u32,
    pub scoring: ScoringTable,
    #[serde(default)]
    pub draw: DrawRules,
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::UnversionedRuleSet);
        }
        self.scoring.validate()?;
        self.draw.validate()
    }

    /// Parse and validate a JSON rule set.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: RuleSet = serde_json::from_str(json)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }
}

fn default_allow_draws() -> bool {
    true
}

/// Prize configuration for one round
///
/// All amounts are in the smallest currency unit (e.g. cents).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub entry_fee: u64,
    /// Admin fee in basis points (0-10000, where 100 = 1%)
    pub admin_fee_bps: u32,
    /// Pool carried over from earlier rounds that paid nobody.
    #[serde(default)]
    pub previous_accumulated: u64,
    /// When false, a drawn result triggers accumulation.
    #[serde(default = "default_allow_draws")]
    pub allow_draws: bool,
}

impl RoundConfig {
    /// Config with the fee given in whole percent.
    pub fn with_fee_percent(entry_fee: u64, admin_fee_percent: u32) -> Self {
        Self {
            entry_fee,
            admin_fee_bps: admin_fee_percent.saturating_mul(100),
            previous_accumulated: 0,
            allow_draws: true,
        }
    }

    pub fn carrying(mut self, previous_accumulated: u64) -> Self {
        self.previous_accumulated = previous_accumulated;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_fee_bps as u64 > BPS_DENOMINATOR {
            return Err(ConfigError::FeeOutOfRange { bps: self.admin_fee_bps });
        }
        Ok(())
    }

    /// Parse and validate a JSON round config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RoundConfig = serde_json::from_str(json)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
