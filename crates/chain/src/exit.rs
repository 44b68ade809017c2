//! # Validator Exit Initiation
//!
//! Seam between bail-out processing and the validator lifecycle. Block
//! processing drives exits through the [`ExitInitiator`] trait and threads the
//! running `(max_exit_epoch, churn)` pair through successive calls, so a
//! block with many exits never rescans the registry.
//!
//! [`RegistryExitInitiator`] is the churn-limited queue used on mainnet:
//!
//! ```text
//! exitable   = current_epoch + 1 + MAX_SEED_LOOKAHEAD
//! queue      = max(max_exit_epoch, exitable)        (churn resets if exitable wins)
//! limit      = max(MIN_PER_EPOCH_CHURN_LIMIT, active_count / CHURN_LIMIT_QUOTIENT)
//! churn >= limit → queue += 1
//! exit_epoch = queue
//! withdrawable_epoch = queue + MIN_VALIDATOR_WITHDRAWABILITY_DELAY
//! ```

use orbit_common::EconomicsConfig;
use thiserror::Error;
use tracing::debug;

use crate::state::{BeaconState, StateError};
use crate::types::{Epoch, ValidatorIndex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExitError {
    /// Recoverable: block processing skips the entry.
    #[error("validator {index} already exited at epoch {exit_epoch}")]
    AlreadyExited {
        index: ValidatorIndex,
        exit_epoch: Epoch,
    },

    #[error("validator {0} not found")]
    ValidatorNotFound(ValidatorIndex),

    #[error("exit epoch overflow")]
    EpochOverflow,
}

impl From<StateError> for ExitError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::ValidatorNotFound(index) => ExitError::ValidatorNotFound(index),
        }
    }
}

pub trait ExitInitiator {
    /// Schedule an exit for `index` and return its exit epoch.
    ///
    /// `max_exit_epoch` and `churn` describe the exit queue as seen by the
    /// caller; the caller updates them from the returned epoch.
    fn initiate_validator_exit(
        &self,
        state: &mut BeaconState,
        index: ValidatorIndex,
        max_exit_epoch: Epoch,
        churn: u64,
        is_bail_out: bool,
    ) -> Result<Epoch, ExitError>;
}

/// Exit-queue parameters taken from the economics config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryExitInitiator {
    min_per_epoch_churn_limit: u64,
    churn_limit_quotient: u64,
    max_seed_lookahead: u64,
    min_validator_withdrawability_delay: u64,
}

impl RegistryExitInitiator {
    pub fn new(cfg: &EconomicsConfig) -> Self {
        RegistryExitInitiator {
            min_per_epoch_churn_limit: cfg.min_per_epoch_churn_limit,
            churn_limit_quotient: cfg.churn_limit_quotient,
            max_seed_lookahead: cfg.max_seed_lookahead,
            min_validator_withdrawability_delay: cfg.min_validator_withdrawability_delay,
        }
    }

    /// First epoch at which an exit initiated in `epoch` may take effect.
    pub fn activation_exit_epoch(&self, epoch: Epoch) -> Option<Epoch> {
        epoch.checked_add(1)?.checked_add(self.max_seed_lookahead)
    }

    pub fn churn_limit(&self, active_validator_count: u64) -> u64 {
        let scaled = active_validator_count
            .checked_div(self.churn_limit_quotient)
            .unwrap_or(0);
        self.min_per_epoch_churn_limit.max(scaled)
    }
}

impl ExitInitiator for RegistryExitInitiator {
    fn initiate_validator_exit(
        &self,
        state: &mut BeaconState,
        index: ValidatorIndex,
        max_exit_epoch: Epoch,
        churn: u64,
        is_bail_out: bool,
    ) -> Result<Epoch, ExitError> {
        let validator = state
            .validator(index)
            .ok_or(ExitError::ValidatorNotFound(index))?;
        if validator.has_initiated_exit() {
            return Err(ExitError::AlreadyExited {
                index,
                exit_epoch: validator.exit_epoch,
            });
        }

        let current = state.current_epoch();
        let exitable = self
            .activation_exit_epoch(current)
            .ok_or(ExitError::EpochOverflow)?;

        let mut queue_epoch = max_exit_epoch;
        let mut queue_churn = churn;
        if exitable > queue_epoch {
            queue_epoch = exitable;
            queue_churn = 0;
        }
        if queue_churn >= self.churn_limit(state.active_validator_count(current)) {
            queue_epoch = queue_epoch.checked_add(1).ok_or(ExitError::EpochOverflow)?;
        }

        let withdrawable = queue_epoch
            .checked_add(self.min_validator_withdrawability_delay)
            .ok_or(ExitError::EpochOverflow)?;
        state.set_validator_exit(index, queue_epoch, withdrawable)?;

        debug!(index, exit_epoch = queue_epoch, withdrawable, is_bail_out, "validator exit initiated");
        Ok(queue_epoch)
    }
}
