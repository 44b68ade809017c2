//! # Reward Adjustment Controller
//!
//! Once per epoch the reward adjustment factor is nudged toward the value
//! that makes the projected total deposit meet the deposit plan.
//!
//! ## Algorithm
//!
//! ```text
//! gap          = |future - target|
//! error_rate   = gap * PRECISION / target
//! mitigating   = clamp(error_rate * THRESHOLD_RECIPROCAL, MIN_MITIGATING, PRECISION)
//! change       = TARGET_CHANGE_RATE * mitigating / PRECISION
//!
//! future >= target  → factor = max(factor - change, 0)
//! future <  target  → factor = factor + change
//!
//! factor       = clamp(factor, -MAX_BOOST_YIELD(epoch), +MAX_BOOST_YIELD(epoch))
//! ```
//!
//! All intermediates are exact 256-bit integers; divisions truncate.
//!
//! ## Epoch Boundary Order
//!
//! | Step | Write |
//! |------|-------|
//! | 1 | `reward_adjustment_factor := calculate(...)` |
//! | 2 | `previous_epoch_reserve := current_epoch_reserve` |
//! | 3 | rewards and penalties drain `current_epoch_reserve` |

use orbit_common::{EconomicsConfig, Uint256};
use thiserror::Error;
use tracing::debug;

use crate::balance_cache::BalanceCache;
use crate::issuance::{max_boost_yield, target_deposit_plan};
use crate::state::BeaconState;
use crate::types::{Epoch, Gwei};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardFactorError {
    /// Deposit plan yields zero; the network config is broken.
    #[error("target deposit is zero at epoch {epoch}")]
    ZeroTargetDeposit { epoch: Epoch },

    /// Only reachable with an unvalidated config (zero feedback precision).
    #[error("reward feedback arithmetic failed: {0}")]
    Arithmetic(&'static str),
}

/// Compute the next reward adjustment factor.
///
/// # Arguments
///
/// * `current_bias` - factor currently stored in state
/// * `future_deposit` - projected total deposit (active + pending - exiting)
/// * `target_deposit` - deposit plan value for `epoch`
/// * `epoch` - epoch whose `MAX_BOOST_YIELD` bounds the result
///
/// # Errors
///
/// `ZeroTargetDeposit` when `target_deposit == 0`.
pub fn calculate_reward_adjustment_factor(
    current_bias: i64,
    future_deposit: Gwei,
    target_deposit: Gwei,
    epoch: Epoch,
    cfg: &EconomicsConfig,
) -> Result<i64, RewardFactorError> {
    if target_deposit == 0 {
        return Err(RewardFactorError::ZeroTargetDeposit { epoch });
    }

    let precision = Uint256::from(cfg.reward_feedback_precision);
    let future = Uint256::from(future_deposit);
    let target = Uint256::from(target_deposit);

    let error_rate = future
        .abs_diff(target)
        .checked_mul(precision)
        .and_then(|v| v.checked_div(target))
        .ok_or(RewardFactorError::Arithmetic("error rate"))?;

    let mitigating = error_rate
        .checked_mul(Uint256::from(cfg.reward_feedback_threshold_reciprocal))
        .ok_or(RewardFactorError::Arithmetic("mitigating factor"))?
        .max(Uint256::from(cfg.min_mitigating_factor))
        .min(precision);

    let change = Uint256::from(cfg.target_change_rate)
        .checked_mul(mitigating)
        .and_then(|v| v.checked_div(precision))
        .ok_or(RewardFactorError::Arithmetic("change rate"))?;
    // mitigating <= precision, so change <= target_change_rate
    let change = u64::try_from(change)
        .ok()
        .and_then(|c| i64::try_from(c).ok())
        .unwrap_or(i64::MAX);

    let next = if future_deposit >= target_deposit {
        current_bias.saturating_sub(change).max(0)
    } else {
        current_bias.saturating_add(change)
    };

    let bound = i64::try_from(max_boost_yield(epoch, cfg)).unwrap_or(i64::MAX);
    Ok(next.clamp(-bound, bound))
}

/// Epoch-boundary factor update followed by the reserve roll.
///
/// Reads the projected deposit through `cache`, targets the deposit plan of
/// the next epoch, writes the new factor, then sets
/// `previous_epoch_reserve := current_epoch_reserve`.
///
/// # Errors
///
/// Propagates `ZeroTargetDeposit`; the state is left untouched in that case.
pub fn process_reward_factor_update(
    state: &mut BeaconState,
    cache: &BalanceCache,
    cfg: &EconomicsConfig,
) -> Result<i64, RewardFactorError> {
    let next_epoch = state.current_epoch().saturating_add(1);
    let future = state.total_balance_with_queue(cache, cfg);
    let target = target_deposit_plan(next_epoch, cfg);
    let previous_factor = state.reward_adjustment_factor();

    let factor =
        calculate_reward_adjustment_factor(previous_factor, future, target, next_epoch, cfg)?;
    state.set_reward_adjustment_factor(factor);

    let reserve = state.current_epoch_reserve();
    state.set_previous_epoch_reserve(reserve);

    debug!(
        epoch = next_epoch,
        future_deposit = future,
        target_deposit = target,
        previous_factor,
        factor,
        reserve,
        "reward adjustment factor updated"
    );
    Ok(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EconomicsConfig {
        EconomicsConfig::default()
    }

    #[test]
    fn zero_target_is_error() {
        assert_eq!(
            calculate_reward_adjustment_factor(0, 1, 0, 3, &cfg()),
            Err(RewardFactorError::ZeroTargetDeposit { epoch: 3 })
        );
    }

    #[test]
    fn exact_target_moves_by_floor_change() {
        // error rate 0 → mitigating floored at 1e6 → change = 1.5e6 * 1e6 / 1e12 = 1
        let c = cfg();
        assert_eq!(calculate_reward_adjustment_factor(10, 100, 100, 0, &c), Ok(9));
        assert_eq!(calculate_reward_adjustment_factor(0, 100, 100, 0, &c), Ok(0));
    }

    #[test]
    fn large_shortfall_moves_by_full_rate() {
        // future at half of target: error rate 0.5 * 10 saturates at precision
        let c = cfg();
        assert_eq!(
            calculate_reward_adjustment_factor(0, 50, 100, 0, &c),
            Ok(c.target_change_rate as i64)
        );
    }

    #[test]
    fn proportional_region() {
        // 1% gap → error rate 1e10 → mitigating 1e11 → change 150_000
        let c = cfg();
        assert_eq!(calculate_reward_adjustment_factor(0, 99, 100, 0, &c), Ok(150_000));
        assert_eq!(
            calculate_reward_adjustment_factor(1_000_000, 101, 100, 0, &c),
            Ok(850_000)
        );
    }

    #[test]
    fn surplus_floors_at_zero() {
        let c = cfg();
        assert_eq!(calculate_reward_adjustment_factor(5, 1_000, 100, 0, &c), Ok(0));
        // negative bias on surplus is lifted to the floor
        assert_eq!(calculate_reward_adjustment_factor(-5, 1_000, 100, 0, &c), Ok(0));
    }

    #[test]
    fn clamped_to_max_boost_yield() {
        let c = cfg();
        let bound = max_boost_yield(0, &c) as i64;
        assert_eq!(calculate_reward_adjustment_factor(bound, 0, 100, 0, &c), Ok(bound));
        assert_eq!(
            calculate_reward_adjustment_factor(i64::MIN, 1, 100, 0, &c),
            Ok(-bound)
        );
    }

    #[test]
    fn update_rolls_reserve_after_factor() {
        let c = cfg();
        let cache = BalanceCache::new();
        let mut s = BeaconState::new(0, vec![], vec![]);
        s.set_current_epoch_reserve(777);
        s.set_previous_epoch_reserve(1);

        // empty registry: future deposit is one increment, far below plan
        let f = process_reward_factor_update(&mut s, &cache, &c).unwrap();
        assert_eq!(f, c.target_change_rate as i64);
        assert_eq!(s.reward_adjustment_factor(), f);
        assert_eq!(s.previous_epoch_reserve(), 777);
        assert_eq!(s.current_epoch_reserve(), 777);
    }

    #[test]
    fn update_leaves_state_on_zero_target() {
        let mut c = cfg();
        c.deposit_plan.early_slope = 0;
        c.deposit_plan.early_offset = 0;
        let cache = BalanceCache::new();
        let mut s = BeaconState::new(0, vec![], vec![]);
        s.set_current_epoch_reserve(5);
        s.set_reward_adjustment_factor(3);

        assert!(process_reward_factor_update(&mut s, &cache, &c).is_err());
        assert_eq!(s.reward_adjustment_factor(), 3);
        assert_eq!(s.previous_epoch_reserve(), 0);
    }
}
