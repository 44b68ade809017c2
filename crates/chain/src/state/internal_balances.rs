//! Internal balance totals
//! Registry-wide sums over effective balances, with the cached variants

use orbit_common::EconomicsConfig;

use super::{BeaconState, StateError};
use crate::balance_cache::BalanceCache;
use crate::types::{Gwei, ValidatorIndex};

impl BeaconState {
    // ============================================================
    // BALANCE TOTALS
    // ============================================================

    /// Sum of effective balances of `indices`, floored at one increment.
    ///
    /// The floor keeps every divisor built from this total non-zero.
    pub fn total_balance(
        &self,
        indices: &[ValidatorIndex],
        cfg: &EconomicsConfig,
    ) -> Result<Gwei, StateError> {
        let mut total: Gwei = 0;
        for &index in indices {
            let v = self
                .validator(index)
                .ok_or(StateError::ValidatorNotFound(index))?;
            total = total.saturating_add(v.effective_balance);
        }
        Ok(total.max(cfg.effective_balance_increment))
    }

    /// Sum of effective balances of validators active in the current epoch,
    /// floored at one increment. Served from `cache` when present.
    pub fn total_active_balance(&self, cache: &BalanceCache, cfg: &EconomicsConfig) -> Gwei {
        let epoch = self.current_epoch();
        let key = (epoch, self.latest_block_root);
        if let Some(total) = cache.active_balance(&key) {
            return total;
        }

        let total = self
            .validators
            .iter()
            .filter(|v| v.is_active_at(epoch))
            .fold(0u64, |acc, v| acc.saturating_add(v.effective_balance))
            .max(cfg.effective_balance_increment);

        cache.put_active_balance(key, total);
        total
    }

    /// Projected future total deposit: active + pending activation - exiting.
    ///
    /// Exiting validators are still active, so they are counted in the
    /// active sum and subtracted again here.
    pub fn total_balance_with_queue(&self, cache: &BalanceCache, cfg: &EconomicsConfig) -> Gwei {
        let epoch = self.current_epoch();
        let key = (epoch, self.latest_block_root);
        if let Some(total) = cache.balance_with_queue(&key) {
            return total;
        }

        let active = self.total_active_balance(cache, cfg);
        let mut pending: Gwei = 0;
        let mut exiting: Gwei = 0;
        for v in &self.validators {
            if v.is_pending_at(epoch) {
                pending = pending.saturating_add(v.effective_balance);
            } else if v.is_exiting_at(epoch) {
                exiting = exiting.saturating_add(v.effective_balance);
            }
        }

        let total = active.saturating_add(pending).saturating_sub(exiting);
        cache.put_balance_with_queue(key, total);
        total
    }
}
