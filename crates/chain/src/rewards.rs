//! # Epoch Rewards & Penalties
//!
//! Computes per-validator attester and proposer deltas from the participation
//! records of the previous epoch and applies them to balances.
//!
//! ## Attester Delta
//!
//! ```text
//! br = increments(v) * total_reward / (total_increments * BASE_REWARDS_PER_EPOCH)
//!
//! for component in [source, target, head]:
//!     participated && !slashed:
//!         leak      → reward += br
//!         otherwise → reward += br * attested_increments / total_increments
//!     else:
//!         penalty += br
//!
//! attested source && !slashed && inclusion_distance > 0:
//!     reward += (br - br / PROPOSER_REWARD_QUOTIENT) / inclusion_distance
//!
//! leak:
//!     penalty += BASE_REWARDS_PER_EPOCH * br - br / PROPOSER_REWARD_QUOTIENT
//!     missed target || slashed:
//!         penalty += effective_balance * finality_delay / INACTIVITY_PENALTY_QUOTIENT
//! ```
//!
//! During a leak an optimal attester (every component, inclusion distance 1)
//! nets zero: `3 * br + (br - br / q)` against `4 * br - br / q`.
//!
//! Validators that are neither active in the previous epoch nor slashed and
//! still awaiting withdrawal receive nothing and lose nothing.
//!
//! ## Proposer Delta
//!
//! Each unslashed previous-epoch attester credits the proposer that included
//! its attestation with `br / PROPOSER_REWARD_QUOTIENT`.
//!
//! ## Reserve Usage
//!
//! When the feedback boost is positive, a slice of every attester reward is
//! funded by the reserve: `reward * boost / total_reward`, where `reward`
//! includes the inclusion-delay component. The sum is drained
//! from `current_epoch_reserve` after balances are written.
//!
//! ## Consensus-Critical
//!
//! Rewards are added with overflow checks (overflow is fatal). Penalties
//! saturate at zero.

use orbit_common::EconomicsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::issuance::epoch_issuance;
use crate::precompute::{EpochBalanceTotals, ValidatorEpochStats};
use crate::state::BeaconState;
use crate::types::{Epoch, Gwei, ValidatorIndex, GENESIS_EPOCH};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("invalid active balance {0}: below one effective balance increment")]
    InvalidBalance(Gwei),

    #[error("validator {0} not found")]
    ValidatorNotFound(ValidatorIndex),

    #[error("proposer index {index} out of range for {validator_count} validators")]
    IndexOutOfRange {
        index: ValidatorIndex,
        validator_count: usize,
    },

    #[error("length mismatch: {stats} records, {validators} validators, {balances} balances")]
    LengthMismatch {
        stats: usize,
        validators: usize,
        balances: usize,
    },

    #[error("balance overflow for validator {0}")]
    BalanceOverflow(ValidatorIndex),
}

// ════════════════════════════════════════════════════════════════════════════════
// TYPES
// ════════════════════════════════════════════════════════════════════════════════

/// Attester deltas, one entry per participation record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestationDeltas {
    pub rewards: Vec<Gwei>,
    pub penalties: Vec<Gwei>,
    pub reserve_usage: Vec<Gwei>,
}

/// Outcome of one rewards-and-penalties pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsSummary {
    pub total_rewards: Gwei,
    pub total_penalties: Gwei,
    pub reserve_usage: Gwei,
}

/// Epoch-wide inputs shared by every per-validator delta.
#[derive(Debug, Clone, Copy)]
struct RewardContext {
    total_reward: u128,
    boost: u128,
    total_increments: u128,
    increment: u64,
    finality_delay: u64,
    in_leak: bool,
}

impl RewardContext {
    fn new(
        state: &BeaconState,
        bp: &EpochBalanceTotals,
        cfg: &EconomicsConfig,
    ) -> Result<Self, RewardError> {
        let active = bp.active_current_epoch;
        if active == 0 || active < cfg.effective_balance_increment {
            return Err(RewardError::InvalidBalance(active));
        }
        let total_increments = active
            .checked_div(cfg.effective_balance_increment)
            .ok_or(RewardError::InvalidBalance(active))?;

        let boost = state.epoch_feedback_boost(cfg);
        let total_reward = epoch_issuance(state.current_epoch(), cfg).saturating_add(boost);
        let finality_delay = finality_delay(state.previous_epoch(), state.finalized_checkpoint().epoch);

        Ok(RewardContext {
            total_reward: total_reward as u128,
            boost: boost as u128,
            total_increments: total_increments as u128,
            increment: cfg.effective_balance_increment,
            finality_delay,
            in_leak: finality_delay > cfg.min_epochs_to_inactivity_penalty,
        })
    }

    fn base_reward(&self, effective_balance: Gwei, cfg: &EconomicsConfig) -> Gwei {
        let increments = (effective_balance / self.increment) as u128;
        let denominator = self
            .total_increments
            .saturating_mul(cfg.base_rewards_per_epoch as u128);
        let br = increments
            .saturating_mul(self.total_reward)
            .checked_div(denominator)
            .unwrap_or(0);
        u64::try_from(br).unwrap_or(u64::MAX)
    }

    /// Reward for a component attested by `attested` Gwei of stake.
    fn participation_share(&self, br: Gwei, attested: Gwei) -> Gwei {
        if self.in_leak {
            return br;
        }
        let attested_increments = (attested / self.increment) as u128;
        let share = (br as u128)
            .saturating_mul(attested_increments)
            .checked_div(self.total_increments)
            .unwrap_or(0);
        u64::try_from(share).unwrap_or(u64::MAX)
    }

    fn reserve_usage(&self, reward: Gwei) -> Gwei {
        if self.boost == 0 {
            return 0;
        }
        let usage = (reward as u128)
            .saturating_mul(self.boost)
            .checked_div(self.total_reward)
            .unwrap_or(0);
        u64::try_from(usage).unwrap_or(u64::MAX)
    }
}

/// `br / PROPOSER_REWARD_QUOTIENT`; zero when the quotient is zero.
fn proposer_share(br: Gwei, cfg: &EconomicsConfig) -> Gwei {
    br.checked_div(cfg.proposer_reward_quotient).unwrap_or(0)
}

/// Attester share of `br` after the proposer cut, scaled by inclusion speed.
/// A zero distance earns nothing.
fn inclusion_delay_reward(br: Gwei, inclusion_distance: u64, cfg: &EconomicsConfig) -> Gwei {
    br.saturating_sub(proposer_share(br, cfg))
        .checked_div(inclusion_distance)
        .unwrap_or(0)
}

/// Epochs since finality, measured from the previous epoch.
pub fn finality_delay(prev_epoch: Epoch, finalized_epoch: Epoch) -> u64 {
    prev_epoch.saturating_sub(finalized_epoch)
}

// ════════════════════════════════════════════════════════════════════════════════
// DELTAS
// ════════════════════════════════════════════════════════════════════════════════

fn is_eligible(v: &ValidatorEpochStats) -> bool {
    v.is_active_prev_epoch || (v.is_slashed && !v.is_withdrawable_current_epoch)
}

/// (reward, penalty, reserve usage) for one validator.
fn attestation_delta(
    v: &ValidatorEpochStats,
    bp: &EpochBalanceTotals,
    ctx: &RewardContext,
    cfg: &EconomicsConfig,
) -> (Gwei, Gwei, Gwei) {
    if !is_eligible(v) {
        return (0, 0, 0);
    }

    let eb = v.current_epoch_effective_balance;
    let br = ctx.base_reward(eb, cfg);
    let mut reward: Gwei = 0;
    let mut penalty: Gwei = 0;

    let components = [
        (v.is_prev_epoch_attester, bp.prev_epoch_attested),
        (v.is_prev_epoch_target_attester, bp.prev_epoch_target_attested),
        (v.is_prev_epoch_head_attester, bp.prev_epoch_head_attested),
    ];
    for (participated, attested) in components {
        if participated && !v.is_slashed {
            reward = reward.saturating_add(ctx.participation_share(br, attested));
        } else {
            penalty = penalty.saturating_add(br);
        }
    }

    if v.is_prev_epoch_attester && !v.is_slashed {
        reward = reward.saturating_add(inclusion_delay_reward(br, v.inclusion_distance, cfg));
    }

    if ctx.in_leak {
        // offsets the optimal attester's rewards exactly
        penalty = penalty.saturating_add(
            cfg.base_rewards_per_epoch
                .saturating_mul(br)
                .saturating_sub(proposer_share(br, cfg)),
        );
        if !v.is_prev_epoch_target_attester || v.is_slashed {
            let leak = (eb as u128)
                .saturating_mul(ctx.finality_delay as u128)
                .checked_div(cfg.inactivity_penalty_quotient as u128)
                .unwrap_or(0);
            penalty = penalty.saturating_add(u64::try_from(leak).unwrap_or(u64::MAX));
        }
    }

    (reward, penalty, ctx.reserve_usage(reward))
}

/// Attester rewards, penalties and reserve usage for every record in `vp`.
///
/// # Errors
///
/// `InvalidBalance` when `bp.active_current_epoch` is below one increment.
pub fn attestations_delta(
    state: &BeaconState,
    bp: &EpochBalanceTotals,
    vp: &[ValidatorEpochStats],
    cfg: &EconomicsConfig,
) -> Result<AttestationDeltas, RewardError> {
    let ctx = RewardContext::new(state, bp, cfg)?;
    let mut deltas = AttestationDeltas {
        rewards: Vec::with_capacity(vp.len()),
        penalties: Vec::with_capacity(vp.len()),
        reserve_usage: Vec::with_capacity(vp.len()),
    };
    for v in vp {
        let (r, p, u) = attestation_delta(v, bp, &ctx, cfg);
        deltas.rewards.push(r);
        deltas.penalties.push(p);
        deltas.reserve_usage.push(u);
    }
    Ok(deltas)
}

/// Proposer inclusion rewards, indexed by validator.
///
/// # Errors
///
/// * `IndexOutOfRange` if any record names a proposer outside the registry,
///   whether or not that record earns a reward
/// * `InvalidBalance` as for [`attestations_delta`]
pub fn proposers_delta(
    state: &BeaconState,
    bp: &EpochBalanceTotals,
    vp: &[ValidatorEpochStats],
    cfg: &EconomicsConfig,
) -> Result<Vec<Gwei>, RewardError> {
    let ctx = RewardContext::new(state, bp, cfg)?;
    let validator_count = state.num_validators();
    let mut rewards: Vec<Gwei> = vec![0; validator_count];

    for v in vp {
        let slot = usize::try_from(v.proposer_index)
            .ok()
            .filter(|&i| i < validator_count)
            .ok_or(RewardError::IndexOutOfRange {
                index: v.proposer_index,
                validator_count,
            })?;
        if v.is_prev_epoch_attester && !v.is_slashed {
            let br = ctx.base_reward(v.current_epoch_effective_balance, cfg);
            rewards[slot] = rewards[slot].saturating_add(proposer_share(br, cfg));
        }
    }
    Ok(rewards)
}

// ════════════════════════════════════════════════════════════════════════════════
// APPLICATION
// ════════════════════════════════════════════════════════════════════════════════

/// Apply attester and proposer deltas to balances and drain reserve usage.
///
/// No-op at the genesis epoch.
///
/// # Behavior
///
/// For each validator `i`:
///
/// ```text
/// balance[i] = checked_add(balance[i], attester_reward[i] + proposer_reward[i])
/// balance[i] = saturating_sub(balance[i], attester_penalty[i])
/// ```
///
/// then `current_epoch_reserve -= Σ reserve_usage` (saturating).
///
/// # Errors
///
/// * `LengthMismatch` when `vp`, the registry and the balance list differ in length
/// * `BalanceOverflow` when a reward would overflow a balance
/// * anything from [`attestations_delta`] / [`proposers_delta`]
///
/// State is only written after every delta has been computed without error.
pub fn process_rewards_and_penalties_precompute(
    state: &mut BeaconState,
    bp: &EpochBalanceTotals,
    vp: &[ValidatorEpochStats],
    cfg: &EconomicsConfig,
) -> Result<RewardsSummary, RewardError> {
    if state.current_epoch() == GENESIS_EPOCH {
        return Ok(RewardsSummary::default());
    }

    let validators = state.num_validators();
    let balances_len = state.balances().len();
    if vp.len() != validators || balances_len != validators {
        return Err(RewardError::LengthMismatch {
            stats: vp.len(),
            validators,
            balances: balances_len,
        });
    }

    let attester = attestations_delta(state, bp, vp, cfg)?;
    let proposer = proposers_delta(state, bp, vp, cfg)?;

    let mut summary = RewardsSummary::default();
    let mut balances = state.balances().to_vec();
    for (i, balance) in balances.iter_mut().enumerate() {
        let index = i as ValidatorIndex;
        let reward = attester.rewards[i]
            .checked_add(proposer[i])
            .ok_or(RewardError::BalanceOverflow(index))?;
        let penalty = attester.penalties[i];

        *balance = balance
            .checked_add(reward)
            .ok_or(RewardError::BalanceOverflow(index))?
            .saturating_sub(penalty);

        summary.total_rewards = summary.total_rewards.saturating_add(reward);
        summary.total_penalties = summary.total_penalties.saturating_add(penalty);
        summary.reserve_usage = summary.reserve_usage.saturating_add(attester.reserve_usage[i]);
    }

    state.set_balances(balances);
    state.decrease_current_reserve(summary.reserve_usage);

    debug!(
        epoch = state.current_epoch(),
        total_rewards = summary.total_rewards,
        total_penalties = summary.total_penalties,
        reserve_usage = summary.reserve_usage,
        "rewards and penalties applied"
    );
    Ok(summary)
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Validator;
    use crate::types::{Checkpoint, SLOTS_PER_EPOCH};

    const GWEI: u64 = 1_000_000_000;

    fn state_at(epoch: Epoch, n: usize) -> BeaconState {
        let validators = vec![Validator::new_active(32 * GWEI, 0); n];
        BeaconState::new(epoch * SLOTS_PER_EPOCH, validators, vec![32 * GWEI; n])
    }

    #[test]
    fn finality_delay_saturates() {
        assert_eq!(finality_delay(0, 5), 0);
        assert_eq!(finality_delay(9, 0), 9);
    }

    #[test]
    fn ineligible_validator_untouched() {
        let cfg = EconomicsConfig::default();
        let s = state_at(3, 2);
        let mut withdrawn = ValidatorEpochStats::default();
        withdrawn.is_slashed = true;
        withdrawn.is_withdrawable_current_epoch = true;
        let vp = vec![ValidatorEpochStats::default(), withdrawn];
        let bp = EpochBalanceTotals {
            active_current_epoch: 64 * GWEI,
            ..Default::default()
        };
        let d = attestations_delta(&s, &bp, &vp, &cfg).unwrap();
        assert_eq!(d.rewards, vec![0, 0]);
        assert_eq!(d.penalties, vec![0, 0]);
    }

    #[test]
    fn slashed_unwithdrawn_is_penalized() {
        let cfg = EconomicsConfig::default();
        let s = state_at(3, 1);
        let mut v = ValidatorEpochStats::full_participant(32 * GWEI, 0);
        v.is_slashed = true;
        v.is_active_prev_epoch = false;
        let bp = EpochBalanceTotals::accumulate(std::slice::from_ref(&v), &cfg);
        let d = attestations_delta(&s, &bp, &[v], &cfg).unwrap();
        assert_eq!(d.rewards, vec![0]);
        assert!(d.penalties[0] > 0);
    }

    #[test]
    fn zero_active_balance_is_invalid() {
        let cfg = EconomicsConfig::default();
        let s = state_at(3, 1);
        let bp = EpochBalanceTotals::default();
        assert_eq!(
            attestations_delta(&s, &bp, &[], &cfg),
            Err(RewardError::InvalidBalance(0))
        );
    }

    #[test]
    fn proposer_index_checked_for_every_record() {
        let cfg = EconomicsConfig::default();
        let s = state_at(3, 2);
        // non-attester still trips the range check
        let mut v = ValidatorEpochStats::non_participant(32 * GWEI);
        v.proposer_index = 2;
        let vp = vec![ValidatorEpochStats::full_participant(32 * GWEI, 0), v];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);
        assert_eq!(
            proposers_delta(&s, &bp, &vp, &cfg),
            Err(RewardError::IndexOutOfRange { index: 2, validator_count: 2 })
        );
    }

    #[test]
    fn genesis_is_noop() {
        let cfg = EconomicsConfig::default();
        let mut s = state_at(0, 1);
        s.set_current_epoch_reserve(50);
        let before = s.clone();
        // even malformed inputs are ignored at genesis
        let summary =
            process_rewards_and_penalties_precompute(&mut s, &EpochBalanceTotals::default(), &[], &cfg)
                .unwrap();
        assert_eq!(summary, RewardsSummary::default());
        assert_eq!(s, before);
    }

    #[test]
    fn length_mismatch_rejected() {
        let cfg = EconomicsConfig::default();
        let mut s = state_at(2, 2);
        let vp = vec![ValidatorEpochStats::full_participant(32 * GWEI, 0)];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);
        assert_eq!(
            process_rewards_and_penalties_precompute(&mut s, &bp, &vp, &cfg),
            Err(RewardError::LengthMismatch { stats: 1, validators: 2, balances: 2 })
        );
    }

    #[test]
    fn leak_penalizes_missed_target() {
        let cfg = EconomicsConfig::default();
        let mut s = state_at(10, 2);
        s.set_finalized_checkpoint(Checkpoint { epoch: 0, root: [0; 32] });
        let vp = vec![
            ValidatorEpochStats::full_participant(32 * GWEI, 0),
            ValidatorEpochStats::non_participant(32 * GWEI),
        ];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);
        let d = attestations_delta(&s, &bp, &vp, &cfg).unwrap();

        let ctx = RewardContext::new(&s, &bp, &cfg).unwrap();
        assert!(ctx.in_leak);
        let br = ctx.base_reward(32 * GWEI, &cfg);
        let neutral = 4 * br - br / 8;
        let leak = 32 * GWEI * 9 / (1 << 26);

        assert_eq!(d.rewards, vec![neutral, 0]);
        assert_eq!(d.penalties, vec![neutral, 3 * br + neutral + leak]);
    }

    #[test]
    fn leak_neutralizes_optimal_attester() {
        let cfg = EconomicsConfig::default();
        let mut s = state_at(10, 4);
        s.set_finalized_checkpoint(Checkpoint { epoch: 0, root: [0; 32] });
        let vp = vec![ValidatorEpochStats::full_participant(32 * GWEI, 0); 4];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);

        process_rewards_and_penalties_precompute(&mut s, &bp, &vp, &cfg).unwrap();

        let ctx = RewardContext::new(&state_at(10, 4), &bp, &cfg).unwrap();
        let br = ctx.base_reward(32 * GWEI, &cfg);
        // only the proposer cut of four inclusions remains
        assert_eq!(s.balances()[0], 32 * GWEI + 4 * (br / 8));
        assert_eq!(&s.balances()[1..], &[32 * GWEI; 3]);
    }

    #[test]
    fn inclusion_reward_scales_with_distance() {
        let cfg = EconomicsConfig::default();
        let s = state_at(3, 3);
        let mut slow = ValidatorEpochStats::full_participant(32 * GWEI, 0);
        slow.inclusion_distance = 4;
        let mut unset = ValidatorEpochStats::full_participant(32 * GWEI, 0);
        unset.inclusion_distance = 0;
        let vp = vec![ValidatorEpochStats::full_participant(32 * GWEI, 0), slow, unset];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);
        let d = attestations_delta(&s, &bp, &vp, &cfg).unwrap();

        let br = RewardContext::new(&s, &bp, &cfg).unwrap().base_reward(32 * GWEI, &cfg);
        let max_attester = br - br / 8;
        assert_eq!(d.rewards[0], 3 * br + max_attester);
        assert_eq!(d.rewards[1], 3 * br + max_attester / 4);
        assert_eq!(d.rewards[2], 3 * br);
    }

    #[test]
    fn zero_proposer_quotient_pays_no_proposer_share() {
        let cfg = EconomicsConfig {
            proposer_reward_quotient: 0,
            ..EconomicsConfig::default()
        };
        let s = state_at(3, 1);
        let vp = vec![ValidatorEpochStats::full_participant(32 * GWEI, 0)];
        let bp = EpochBalanceTotals::accumulate(&vp, &cfg);
        assert_eq!(proposers_delta(&s, &bp, &vp, &cfg), Ok(vec![0]));
    }
}
