//! # Issuance Schedule
//!
//! Maps an epoch to the base token issuance for that epoch and to the target
//! total deposit the reward feedback controller steers toward.
//!
//! ## Formulas
//!
//! ```text
//! year(epoch)            = epoch / EPOCHS_PER_YEAR
//! epoch_issuance(epoch)  = MAX_SUPPLY / ISSUANCE_PRECISION
//!                          * ISSUANCE_RATE[min(year, last)]
//!                          / EPOCHS_PER_YEAR
//!
//! target_deposit(epoch)  = early_slope * epoch + early_offset   (year < early_end)
//!                        = later_slope * epoch + later_offset   (year < later_end)
//!                        = final_amount                          (otherwise)
//! ```
//!
//! ## Consensus-Critical
//!
//! Integer division truncates at each step in the order written above. The
//! truncation is part of the rule; reordering the operations changes results.
//! Every function here is pure and total for a validated `EconomicsConfig`.

use orbit_common::EconomicsConfig;

use crate::types::{Epoch, Gwei};

/// Year index of `epoch` (year 0 starts at genesis).
pub fn epoch_to_year(epoch: Epoch, cfg: &EconomicsConfig) -> u64 {
    epoch.checked_div(cfg.epochs_per_year).unwrap_or(0)
}

/// Per-year table lookup that repeats the last entry past the table end.
/// Returns 0 for an empty table.
pub(crate) fn year_table_lookup(table: &[u64], year: u64) -> u64 {
    let idx = usize::try_from(year).unwrap_or(usize::MAX);
    table
        .get(idx)
        .or_else(|| table.last())
        .copied()
        .unwrap_or(0)
}

/// Base issuance for `epoch`, in Gwei.
///
/// ```text
/// epoch 0 with mainnet defaults:
///   1e18 / 1000 * 20 / 82125 = 243_531_202_435
/// ```
pub fn epoch_issuance(epoch: Epoch, cfg: &EconomicsConfig) -> Gwei {
    let year = epoch_to_year(epoch, cfg);
    let rate = year_table_lookup(&cfg.issuance_rate, year);

    let per_rate_unit = cfg
        .max_token_supply
        .checked_div(cfg.issuance_precision)
        .unwrap_or(0);
    let yearly = (per_rate_unit as u128).saturating_mul(rate as u128);
    let per_epoch = yearly.checked_div(cfg.epochs_per_year as u128).unwrap_or(0);

    u64::try_from(per_epoch).unwrap_or(u64::MAX)
}

/// Target total deposit at `epoch`, in Gwei.
///
/// Phase ends are exclusive: the first epoch of year `early_end_year` is
/// already in the later phase.
pub fn target_deposit_plan(epoch: Epoch, cfg: &EconomicsConfig) -> Gwei {
    let plan = &cfg.deposit_plan;
    let early_end = cfg.epochs_per_year.saturating_mul(plan.early_end_year);
    let later_end = cfg.epochs_per_year.saturating_mul(plan.later_end_year);

    let line = |slope: u64, offset: u64| -> Gwei {
        let v = (slope as u128)
            .saturating_mul(epoch as u128)
            .saturating_add(offset as u128);
        u64::try_from(v).unwrap_or(u64::MAX)
    };

    if epoch < early_end {
        line(plan.early_slope, plan.early_offset)
    } else if epoch < later_end {
        line(plan.later_slope, plan.later_offset)
    } else {
        plan.final_amount
    }
}

/// Bound on the reward adjustment factor magnitude at `epoch`.
pub fn max_boost_yield(epoch: Epoch, cfg: &EconomicsConfig) -> u64 {
    year_table_lookup(&cfg.max_boost_yield, epoch_to_year(epoch, cfg))
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
