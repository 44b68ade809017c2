//! Internal validator registry helpers
//! Exit queue bookkeeping shared by exit initiation and bail-out processing

use super::{BeaconState, StateError};
use crate::types::{Epoch, ValidatorIndex, FAR_FUTURE_EPOCH};

impl BeaconState {
    // ============================================================
    // REGISTRY
    // ============================================================

    pub fn active_validator_count(&self, epoch: Epoch) -> u64 {
        self.validators.iter().filter(|v| v.is_active_at(epoch)).count() as u64
    }

    /// Latest scheduled exit epoch and how many validators exit in it.
    ///
    /// Returns `(0, 0)` when no validator has an exit scheduled.
    pub fn validators_max_exit_epoch_and_churn(&self) -> (Epoch, u64) {
        let mut max_exit_epoch: Epoch = 0;
        let mut churn: u64 = 0;
        for v in &self.validators {
            let e = v.exit_epoch;
            if e == FAR_FUTURE_EPOCH {
                continue;
            }
            if e > max_exit_epoch {
                max_exit_epoch = e;
                churn = 1;
            } else if e == max_exit_epoch {
                churn += 1;
            }
        }
        (max_exit_epoch, churn)
    }

    /// Write a validator's exit and withdrawable epochs.
    pub fn set_validator_exit(
        &mut self,
        index: ValidatorIndex,
        exit_epoch: Epoch,
        withdrawable_epoch: Epoch,
    ) -> Result<(), StateError> {
        let v = usize::try_from(index)
            .ok()
            .and_then(|i| self.validators.get_mut(i))
            .ok_or(StateError::ValidatorNotFound(index))?;
        v.exit_epoch = exit_epoch;
        v.withdrawable_epoch = withdrawable_epoch;
        Ok(())
    }
}
