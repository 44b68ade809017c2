//! # Epoch Economics
//!
//! Entry point for the economic half of the epoch transition.
//!
//! ## Order (Consensus-Critical)
//!
//! ```text
//! 1. process_reward_factor_update          factor := next, previous_reserve := current_reserve
//! 2. process_rewards_and_penalties_precompute
//!                                          balances += deltas, current_reserve -= usage
//! ```
//!
//! Step 2 reads the factor and previous reserve written by step 1, so the
//! boost paid this epoch is bounded by the reserve held when it began.
//! Swapping the steps changes every balance.

use orbit_common::EconomicsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::balance_cache::BalanceCache;
use crate::precompute::{EpochBalanceTotals, ValidatorEpochStats};
use crate::reward_factor::{process_reward_factor_update, RewardFactorError};
use crate::rewards::{process_rewards_and_penalties_precompute, RewardError, RewardsSummary};
use crate::state::BeaconState;
use crate::types::{Epoch, Gwei};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochProcessingError {
    #[error(transparent)]
    RewardFactor(#[from] RewardFactorError),

    #[error(transparent)]
    Reward(#[from] RewardError),
}

/// What one epoch's economic transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochEconomicsSummary {
    pub epoch: Epoch,
    pub reward_adjustment_factor: i64,
    pub feedback_boost: Gwei,
    pub previous_epoch_reserve: Gwei,
    pub current_epoch_reserve: Gwei,
    pub rewards: RewardsSummary,
}

/// Run the economic epoch transition on `state`.
///
/// # Arguments
///
/// * `vp` - one participation record per validator
/// * `bp` - epoch-wide totals over `vp`
/// * `cache` - node-wide balance cache
///
/// # Errors
///
/// Any error is fatal for the block; `state` must be discarded because the
/// factor update may already have been written.
pub fn process_epoch_economics(
    state: &mut BeaconState,
    vp: &[ValidatorEpochStats],
    bp: &EpochBalanceTotals,
    cache: &BalanceCache,
    cfg: &EconomicsConfig,
) -> Result<EpochEconomicsSummary, EpochProcessingError> {
    let epoch = state.current_epoch();

    let factor = process_reward_factor_update(state, cache, cfg)?;
    let feedback_boost = state.epoch_feedback_boost(cfg);
    let rewards = process_rewards_and_penalties_precompute(state, bp, vp, cfg)?;

    let summary = EpochEconomicsSummary {
        epoch,
        reward_adjustment_factor: factor,
        feedback_boost,
        previous_epoch_reserve: state.previous_epoch_reserve(),
        current_epoch_reserve: state.current_epoch_reserve(),
        rewards,
    };

    info!(
        epoch,
        factor,
        feedback_boost,
        reserve = summary.current_epoch_reserve,
        rewards = rewards.total_rewards,
        penalties = rewards.total_penalties,
        "epoch economics processed"
    );
    Ok(summary)
}
