//! Internal reserve account management
//! Feedback boost funded by the previous epoch reserve

use orbit_common::EconomicsConfig;
use tracing::debug;

use super::BeaconState;
use crate::types::Gwei;

impl BeaconState {
    // ============================================================
    // RESERVE ACCOUNT
    // ============================================================

    /// Extra per-epoch issuance paid out of the reserve.
    ///
    /// ```text
    /// factor <= 0 → 0
    /// factor  > 0 → MAX_SUPPLY / REWARD_FEEDBACK_PRECISION * factor / EPOCHS_PER_YEAR
    /// ```
    ///
    /// Clamped to `previous_epoch_reserve`, so the boost can never spend more
    /// than the reserve held at the start of the epoch.
    pub fn epoch_feedback_boost(&self, cfg: &EconomicsConfig) -> Gwei {
        let factor = match u64::try_from(self.reward_adjustment_factor) {
            Ok(f) if f > 0 => f,
            _ => return 0,
        };

        let per_unit = cfg
            .max_token_supply
            .checked_div(cfg.reward_feedback_precision)
            .unwrap_or(0);
        let boost = (per_unit as u128)
            .saturating_mul(factor as u128)
            .checked_div(cfg.epochs_per_year as u128)
            .unwrap_or(0);
        let boost = u64::try_from(boost).unwrap_or(u64::MAX);

        boost.min(self.previous_epoch_reserve)
    }

    /// Drain `amount` from the current epoch reserve, flooring at zero.
    pub fn decrease_current_reserve(&mut self, amount: Gwei) {
        let before = self.current_epoch_reserve;
        self.current_epoch_reserve = before.saturating_sub(amount);
        if amount > before {
            debug!(requested = amount, available = before, "reserve overdrawn, floored at zero");
        }
    }
}
