//! Per-validator participation records and epoch-wide balance totals.
//!
//! Both are produced by the participation pass that runs ahead of rewards and
//! penalties. The economic transition only reads them.

use orbit_common::EconomicsConfig;
use serde::{Deserialize, Serialize};

use crate::types::{Gwei, ValidatorIndex};

/// Participation summary of one validator for the epoch being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEpochStats {
    pub is_slashed: bool,
    pub is_withdrawable_current_epoch: bool,
    pub is_active_current_epoch: bool,
    pub is_active_prev_epoch: bool,
    pub is_current_epoch_attester: bool,
    pub is_prev_epoch_attester: bool,
    pub is_prev_epoch_target_attester: bool,
    pub is_prev_epoch_head_attester: bool,
    pub current_epoch_effective_balance: Gwei,
    /// Slots between the attested slot and its inclusion.
    pub inclusion_distance: u64,
    /// Proposer of the block that included this validator's attestation.
    pub proposer_index: ValidatorIndex,
    pub before_epoch_transition_balance: Gwei,
    pub after_epoch_transition_balance: Gwei,
}

impl ValidatorEpochStats {
    /// Active in both epochs, attested source, target and head in the previous one.
    pub fn full_participant(effective_balance: Gwei, proposer_index: ValidatorIndex) -> Self {
        ValidatorEpochStats {
            is_active_current_epoch: true,
            is_active_prev_epoch: true,
            is_current_epoch_attester: true,
            is_prev_epoch_attester: true,
            is_prev_epoch_target_attester: true,
            is_prev_epoch_head_attester: true,
            current_epoch_effective_balance: effective_balance,
            inclusion_distance: 1,
            proposer_index,
            ..Default::default()
        }
    }

    /// Active in both epochs without any previous-epoch attestation.
    pub fn non_participant(effective_balance: Gwei) -> Self {
        ValidatorEpochStats {
            is_active_current_epoch: true,
            is_active_prev_epoch: true,
            current_epoch_effective_balance: effective_balance,
            ..Default::default()
        }
    }
}

/// Epoch-wide effective balance aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochBalanceTotals {
    pub active_current_epoch: Gwei,
    pub active_prev_epoch: Gwei,
    pub prev_epoch_attested: Gwei,
    pub prev_epoch_target_attested: Gwei,
    pub prev_epoch_head_attested: Gwei,
}

impl EpochBalanceTotals {
    /// Aggregate `stats`. Slashed validators never count as attesters.
    /// Each total is floored at one effective balance increment.
    pub fn accumulate(stats: &[ValidatorEpochStats], cfg: &EconomicsConfig) -> Self {
        let mut t = EpochBalanceTotals::default();
        for v in stats {
            let eb = v.current_epoch_effective_balance;
            if v.is_active_current_epoch {
                t.active_current_epoch = t.active_current_epoch.saturating_add(eb);
            }
            if v.is_active_prev_epoch {
                t.active_prev_epoch = t.active_prev_epoch.saturating_add(eb);
            }
            if v.is_slashed {
                continue;
            }
            if v.is_prev_epoch_attester {
                t.prev_epoch_attested = t.prev_epoch_attested.saturating_add(eb);
            }
            if v.is_prev_epoch_target_attester {
                t.prev_epoch_target_attested = t.prev_epoch_target_attested.saturating_add(eb);
            }
            if v.is_prev_epoch_head_attester {
                t.prev_epoch_head_attested = t.prev_epoch_head_attested.saturating_add(eb);
            }
        }

        let floor = cfg.effective_balance_increment;
        t.active_current_epoch = t.active_current_epoch.max(floor);
        t.active_prev_epoch = t.active_prev_epoch.max(floor);
        t.prev_epoch_attested = t.prev_epoch_attested.max(floor);
        t.prev_epoch_target_attested = t.prev_epoch_target_attested.max(floor);
        t.prev_epoch_head_attested = t.prev_epoch_head_attested.max(floor);
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWEI: u64 = 1_000_000_000;

    #[test]
    fn accumulate_excludes_slashed_attesters() {
        let cfg = EconomicsConfig::default();
        let mut slashed = ValidatorEpochStats::full_participant(32 * GWEI, 0);
        slashed.is_slashed = true;
        let stats = vec![
            ValidatorEpochStats::full_participant(32 * GWEI, 0),
            ValidatorEpochStats::non_participant(16 * GWEI),
            slashed,
        ];
        let t = EpochBalanceTotals::accumulate(&stats, &cfg);
        assert_eq!(t.active_current_epoch, 80 * GWEI);
        assert_eq!(t.active_prev_epoch, 80 * GWEI);
        assert_eq!(t.prev_epoch_attested, 32 * GWEI);
        assert_eq!(t.prev_epoch_target_attested, 32 * GWEI);
        assert_eq!(t.prev_epoch_head_attested, 32 * GWEI);
    }

    #[test]
    fn accumulate_empty_floors_at_increment() {
        let cfg = EconomicsConfig::default();
        let t = EpochBalanceTotals::accumulate(&[], &cfg);
        assert_eq!(t.active_current_epoch, GWEI);
        assert_eq!(t.prev_epoch_head_attested, GWEI);
    }
}
