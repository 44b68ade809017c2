//! Base reward per effective-balance increment.
//!
//! ```text
//! total_increments  = active_balance / EFFECTIVE_BALANCE_INCREMENT
//! total_reward      = epoch_issuance(epoch) + epoch_feedback_boost
//! unit_reward       = total_reward / total_increments
//! unit_reserve_use  = boost / total_increments
//! base_reward(i)    = unit_reward * (effective_balance(i) / EFFECTIVE_BALANCE_INCREMENT)
//! ```

use orbit_common::EconomicsConfig;

use crate::balance_cache::BalanceCache;
use crate::issuance::epoch_issuance;
use crate::rewards::RewardError;
use crate::state::BeaconState;
use crate::types::{Gwei, ValidatorIndex};

/// Reward and reserve usage per effective-balance increment at the state's
/// current epoch, for a network with `active_balance` staked.
///
/// The boost never exceeds the previous epoch reserve, so the reserve usage
/// share is always fully funded.
///
/// # Errors
///
/// `InvalidBalance` when `active_balance` is zero or below one increment.
pub fn base_reward_per_increment(
    state: &BeaconState,
    active_balance: Gwei,
    cfg: &EconomicsConfig,
) -> Result<(Gwei, Gwei), RewardError> {
    if active_balance == 0 || active_balance < cfg.effective_balance_increment {
        return Err(RewardError::InvalidBalance(active_balance));
    }
    let total_increments = active_balance
        .checked_div(cfg.effective_balance_increment)
        .ok_or(RewardError::InvalidBalance(active_balance))?;

    let boost = state.epoch_feedback_boost(cfg);
    let total_reward = epoch_issuance(state.current_epoch(), cfg).saturating_add(boost);

    Ok((total_reward / total_increments, boost / total_increments))
}

/// Base reward of validator `index` at the state's current epoch.
///
/// # Errors
///
/// * `ValidatorNotFound` for an index outside the registry
/// * `InvalidBalance` from [`base_reward_per_increment`]
pub fn base_reward(
    state: &BeaconState,
    index: ValidatorIndex,
    cache: &BalanceCache,
    cfg: &EconomicsConfig,
) -> Result<Gwei, RewardError> {
    let validator = state
        .validator(index)
        .ok_or(RewardError::ValidatorNotFound(index))?;
    let active_balance = state.total_active_balance(cache, cfg);
    let (unit_reward, _) = base_reward_per_increment(state, active_balance, cfg)?;
    let increments = validator.effective_balance / cfg.effective_balance_increment;
    Ok(unit_reward.saturating_mul(increments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Validator;

    const GWEI: u64 = 1_000_000_000;

    #[test]
    fn rejects_sub_increment_balance() {
        let cfg = EconomicsConfig::default();
        let s = BeaconState::new(0, vec![], vec![]);
        assert_eq!(
            base_reward_per_increment(&s, 0, &cfg),
            Err(RewardError::InvalidBalance(0))
        );
        assert_eq!(
            base_reward_per_increment(&s, GWEI - 1, &cfg),
            Err(RewardError::InvalidBalance(GWEI - 1))
        );
    }

    #[test]
    fn per_increment_without_boost() {
        let cfg = EconomicsConfig::default();
        let s = BeaconState::new(0, vec![], vec![]);
        let (unit, usage) = base_reward_per_increment(&s, 64 * GWEI, &cfg).unwrap();
        assert_eq!(unit, 243_531_202_435 / 64);
        assert_eq!(usage, 0);
    }

    #[test]
    fn per_increment_with_boost() {
        let cfg = EconomicsConfig::default();
        let mut s = BeaconState::new(0, vec![], vec![]);
        s.set_reward_adjustment_factor(1_500_000);
        s.set_previous_epoch_reserve(u64::MAX);
        let boost = s.epoch_feedback_boost(&cfg);
        assert!(boost > 0);

        let (unit, usage) = base_reward_per_increment(&s, 32 * GWEI, &cfg).unwrap();
        assert_eq!(unit, (243_531_202_435 + boost) / 32);
        assert_eq!(usage, boost / 32);
    }

    #[test]
    fn base_reward_single_validator_genesis() {
        let cfg = EconomicsConfig::default();
        let cache = BalanceCache::new();
        let s = BeaconState::new(0, vec![Validator::new_active(32 * GWEI, 0)], vec![32 * GWEI]);
        assert_eq!(base_reward(&s, 0, &cache, &cfg), Ok(243_531_202_432));
        assert_eq!(
            base_reward(&s, 1, &cache, &cfg),
            Err(RewardError::ValidatorNotFound(1))
        );
    }
}
