//! Economics config loader using TOML and serde.
//!
//! Every field has a mainnet default (see [`crate::economic_constants`]), so a
//! config file only needs to list the parameters it overrides:
//!
//! ```toml
//! epochs_per_year = 1000
//! max_voluntary_exits = 4
//!
//! [deposit_plan]
//! final_amount = 500000000000000000
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::economic_constants::*;

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// DEPOSIT PLAN
// ════════════════════════════════════════════════════════════════════════════════

/// Piecewise-linear target total deposit.
///
/// ```text
///   epoch < early_end_year * epochs_per_year  → early_slope * epoch + early_offset
///   epoch < later_end_year * epochs_per_year  → later_slope * epoch + later_offset
///   otherwise                                 → final_amount
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositPlan {
    pub early_end_year: u64,
    pub early_slope: u64,
    pub early_offset: u64,
    pub later_end_year: u64,
    pub later_slope: u64,
    pub later_offset: u64,
    pub final_amount: u64,
}

impl Default for DepositPlan {
    fn default() -> Self {
        DepositPlan {
            early_end_year: DEPOSIT_PLAN_EARLY_END,
            early_slope: DEPOSIT_PLAN_EARLY_SLOPE,
            early_offset: DEPOSIT_PLAN_EARLY_OFFSET,
            later_end_year: DEPOSIT_PLAN_LATER_END,
            later_slope: DEPOSIT_PLAN_LATER_SLOPE,
            later_offset: DEPOSIT_PLAN_LATER_OFFSET,
            final_amount: DEPOSIT_PLAN_FINAL,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ECONOMICS CONFIG
// ════════════════════════════════════════════════════════════════════════════════

/// All parameters of the per-epoch economic transition.
///
/// Consensus-critical: every node on a network must run with identical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    pub epochs_per_year: u64,
    pub effective_balance_increment: u64,
    pub max_effective_balance: u64,
    pub max_token_supply: u64,

    pub issuance_precision: u64,
    /// Per-year issuance rate; the last entry repeats forever.
    pub issuance_rate: Vec<u64>,
    pub deposit_plan: DepositPlan,

    pub reward_feedback_precision: u64,
    pub reward_feedback_threshold_reciprocal: u64,
    pub target_change_rate: u64,
    pub min_mitigating_factor: u64,
    /// Per-year bound on the reward adjustment factor; the last entry repeats forever.
    pub max_boost_yield: Vec<u64>,

    pub base_rewards_per_epoch: u64,
    pub proposer_reward_quotient: u64,
    pub inactivity_penalty_quotient: u64,
    pub min_epochs_to_inactivity_penalty: u64,

    pub bail_out_score_threshold: u64,
    pub bail_out_score_bias: u64,
    pub max_voluntary_exits: u64,

    pub min_per_epoch_churn_limit: u64,
    pub churn_limit_quotient: u64,
    pub max_seed_lookahead: u64,
    pub min_validator_withdrawability_delay: u64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        EconomicsConfig {
            epochs_per_year: EPOCHS_PER_YEAR,
            effective_balance_increment: EFFECTIVE_BALANCE_INCREMENT,
            max_effective_balance: MAX_EFFECTIVE_BALANCE,
            max_token_supply: MAX_TOKEN_SUPPLY,
            issuance_precision: ISSUANCE_PRECISION,
            issuance_rate: ISSUANCE_RATE.to_vec(),
            deposit_plan: DepositPlan::default(),
            reward_feedback_precision: REWARD_FEEDBACK_PRECISION,
            reward_feedback_threshold_reciprocal: REWARD_FEEDBACK_THRESHOLD_RECIPROCAL,
            target_change_rate: TARGET_CHANGE_RATE,
            min_mitigating_factor: MIN_MITIGATING_FACTOR,
            max_boost_yield: MAX_BOOST_YIELD.to_vec(),
            base_rewards_per_epoch: BASE_REWARDS_PER_EPOCH,
            proposer_reward_quotient: PROPOSER_REWARD_QUOTIENT,
            inactivity_penalty_quotient: INACTIVITY_PENALTY_QUOTIENT,
            min_epochs_to_inactivity_penalty: MIN_EPOCHS_TO_INACTIVITY_PENALTY,
            bail_out_score_threshold: BAIL_OUT_SCORE_THRESHOLD,
            bail_out_score_bias: BAIL_OUT_SCORE_BIAS,
            max_voluntary_exits: MAX_VOLUNTARY_EXITS,
            min_per_epoch_churn_limit: MIN_PER_EPOCH_CHURN_LIMIT,
            churn_limit_quotient: CHURN_LIMIT_QUOTIENT,
            max_seed_lookahead: MAX_SEED_LOOKAHEAD,
            min_validator_withdrawability_delay: MIN_VALIDATOR_WITHDRAWABILITY_DELAY,
        }
    }
}

impl EconomicsConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: EconomicsConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the epoch transition relies on.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first offending field. Divisors must
    /// be non-zero, lookup tables non-empty, the mitigating floor must not
    /// exceed the feedback precision and the deposit plan phases must be ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("epochs_per_year", self.epochs_per_year),
            ("effective_balance_increment", self.effective_balance_increment),
            ("issuance_precision", self.issuance_precision),
            ("reward_feedback_precision", self.reward_feedback_precision),
            ("base_rewards_per_epoch", self.base_rewards_per_epoch),
            ("proposer_reward_quotient", self.proposer_reward_quotient),
            ("inactivity_penalty_quotient", self.inactivity_penalty_quotient),
            ("churn_limit_quotient", self.churn_limit_quotient),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }

        if self.issuance_rate.is_empty() {
            return Err(ConfigError::Invalid("issuance_rate must not be empty".into()));
        }
        if self.max_boost_yield.is_empty() {
            return Err(ConfigError::Invalid("max_boost_yield must not be empty".into()));
        }
        if self.max_boost_yield.iter().any(|&y| y > i64::MAX as u64) {
            return Err(ConfigError::Invalid("max_boost_yield entry exceeds i64::MAX".into()));
        }
        if self.min_mitigating_factor > self.reward_feedback_precision {
            return Err(ConfigError::Invalid(
                "min_mitigating_factor exceeds reward_feedback_precision".into(),
            ));
        }
        if self.max_effective_balance < self.effective_balance_increment {
            return Err(ConfigError::Invalid(
                "max_effective_balance below effective_balance_increment".into(),
            ));
        }
        if self.deposit_plan.early_end_year > self.deposit_plan.later_end_year {
            return Err(ConfigError::Invalid(
                "deposit_plan early phase ends after later phase".into(),
            ));
        }

        Ok(())
    }
}

/// Load an economics config from a TOML file path.
/// Missing fields take mainnet defaults; the result is validated.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<EconomicsConfig, ConfigError> {
    let p = path.as_ref();
    let s = fs::read_to_string(p)?;
    let cfg = EconomicsConfig::from_toml_str(&s)?;
    debug!(path = %p.display(), epochs_per_year = cfg.epochs_per_year, "loaded economics config");
    Ok(cfg)
}
