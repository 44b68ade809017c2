//! # Bail-Out
//!
//! Threshold-gated forced exit for validators whose bail-out score has grown
//! past `BAIL_OUT_SCORE_THRESHOLD`.
//!
//! ## Flow
//!
//! ```text
//!  state scores ──► BailOutPool::initialize / update_bail_outs
//!                            │
//!                            ▼
//!              BailOutPool::bail_outs_for_inclusion ──► block proposer
//!                                                            │
//!                                                            ▼
//!                                       process_bail_outs (block.rs)
//!                                                            │
//!                                                            ▼
//!                                          BailOutPool::mark_included
//! ```
//!
//! | Module | Fungsi |
//! |--------|--------|
//! | `mod.rs` | recovery curve, single-validator eligibility |
//! | `pool` | pending admission queue |
//! | `block` | block-level application under churn |

use orbit_common::EconomicsConfig;
use thiserror::Error;

use crate::exit::ExitError;
use crate::state::{BeaconState, ValidatorBailoutState};
use crate::types::{Epoch, ValidatorIndex};

pub mod block;
pub mod pool;

pub use block::process_bail_outs;
pub use pool::BailOutPool;

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BailOutError {
    #[error("validator {0} not found")]
    ValidatorNotFound(ValidatorIndex),

    #[error("validator {index} not active at epoch {epoch}")]
    NotActive { index: ValidatorIndex, epoch: Epoch },

    #[error("validator {0} already exited or bailed out")]
    AlreadyExited(ValidatorIndex),

    #[error("validator {index} score {score} below threshold {threshold}")]
    BelowThreshold {
        index: ValidatorIndex,
        score: u64,
        threshold: u64,
    },

    #[error("nil bail-out at position {position}")]
    NilExit { position: usize },

    #[error("exit initiation failed for validator {index}: {source}")]
    ExitInitiation {
        index: ValidatorIndex,
        #[source]
        source: ExitError,
    },
}

// ════════════════════════════════════════════════════════════════════════════════
// RECOVERY CURVE
// ════════════════════════════════════════════════════════════════════════════════

/// Score recovered per epoch by a participating validator, indexed by
/// `floor(log2(validator_set_size)) - 13`.
const RECOVERY_SCORES: [u64; 10] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32];
const RECOVERY_MIN_LOG2: u32 = 13;

/// Per-epoch score recovery for a validator set of `validator_set_size`.
///
/// ```text
/// log2(n) <= 13 → 1      log2(n) = 18 → 8
/// log2(n)  = 14 → 2      log2(n) = 19 → 12
/// log2(n)  = 15 → 3      log2(n) = 20 → 16
/// log2(n)  = 16 → 4      log2(n) = 21 → 24
/// log2(n)  = 17 → 6      log2(n) >= 22 → 32
/// ```
///
/// Monotonically non-decreasing in `validator_set_size`. An empty set takes
/// the lowest bucket.
pub fn recovery_score(validator_set_size: u64) -> u64 {
    let log2 = validator_set_size.checked_ilog2().unwrap_or(0);
    let bucket = log2.saturating_sub(RECOVERY_MIN_LOG2) as usize;
    RECOVERY_SCORES[bucket.min(RECOVERY_SCORES.len() - 1)]
}

// ════════════════════════════════════════════════════════════════════════════════
// ELIGIBILITY
// ════════════════════════════════════════════════════════════════════════════════

/// Check that validator `index` may be bailed out at the state's current epoch.
///
/// # Errors
///
/// Checked in this order:
///
/// 1. `ValidatorNotFound` - index outside the registry or score list
/// 2. `NotActive` - not active in the current epoch
/// 3. `AlreadyExited` - exit scheduled, or score is `AlreadyBailedOut`
/// 4. `BelowThreshold` - score under `bail_out_score_threshold`
pub fn verify_bail_out(
    state: &BeaconState,
    index: ValidatorIndex,
    cfg: &EconomicsConfig,
) -> Result<(), BailOutError> {
    let validator = state
        .validator(index)
        .ok_or(BailOutError::ValidatorNotFound(index))?;
    let bail_out = state
        .bail_out_state(index)
        .ok_or(BailOutError::ValidatorNotFound(index))?;

    let epoch = state.current_epoch();
    if !validator.is_active_at(epoch) {
        return Err(BailOutError::NotActive { index, epoch });
    }
    if validator.has_initiated_exit() {
        return Err(BailOutError::AlreadyExited(index));
    }

    match bail_out {
        ValidatorBailoutState::AlreadyBailedOut => Err(BailOutError::AlreadyExited(index)),
        ValidatorBailoutState::Eligible(score) if score < cfg.bail_out_score_threshold => {
            Err(BailOutError::BelowThreshold {
                index,
                score,
                threshold: cfg.bail_out_score_threshold,
            })
        }
        ValidatorBailoutState::Eligible(_) => Ok(()),
    }
}
