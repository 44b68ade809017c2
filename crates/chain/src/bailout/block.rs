//! Block-level bail-out processing.

use orbit_common::EconomicsConfig;
use tracing::{debug, warn};

use super::{verify_bail_out, BailOutError};
use crate::exit::{ExitError, ExitInitiator};
use crate::state::BeaconState;
use crate::types::BailOut;

/// Apply a block's bail-out operations to `state`.
///
/// # Behavior
///
/// 1. Any `None` entry fails the whole list before state is touched.
/// 2. The exit queue position starts from the state's current
///    `(max_exit_epoch, churn)` and is carried across entries.
/// 3. Each entry must pass [`verify_bail_out`]; then `initiator` schedules
///    the exit with `is_bail_out = true`.
/// 4. An exit landing after the running max resets churn to 1; one landing
///    on it increments churn.
///
/// An initiator reporting `AlreadyExited` is skipped. Every other failure is
/// fatal and the caller must discard `state`.
///
/// # Returns
///
/// Number of exits initiated.
pub fn process_bail_outs<I>(
    state: &mut BeaconState,
    exits: &[Option<BailOut>],
    initiator: &I,
    cfg: &EconomicsConfig,
) -> Result<usize, BailOutError>
where
    I: ExitInitiator + ?Sized,
{
    if let Some(position) = exits.iter().position(Option::is_none) {
        return Err(BailOutError::NilExit { position });
    }

    let (mut max_exit_epoch, mut churn) = state.validators_max_exit_epoch_and_churn();
    let mut initiated = 0usize;

    for exit in exits.iter().flatten() {
        let index = exit.validator_index;
        verify_bail_out(state, index, cfg)?;

        match initiator.initiate_validator_exit(state, index, max_exit_epoch, churn, true) {
            Ok(exit_epoch) => {
                if exit_epoch > max_exit_epoch {
                    max_exit_epoch = exit_epoch;
                    churn = 1;
                } else if exit_epoch == max_exit_epoch {
                    churn += 1;
                }
                initiated += 1;
            }
            Err(ExitError::AlreadyExited { exit_epoch, .. }) => {
                warn!(validator = index, exit_epoch, "bail-out for already exited validator skipped");
            }
            Err(source) => return Err(BailOutError::ExitInitiation { index, source }),
        }
    }

    debug!(initiated, max_exit_epoch, churn, "bail-outs processed");
    Ok(initiated)
}
