//! Core consensus types shared by every epoch-processing module.

use serde::{Deserialize, Serialize};

pub use orbit_common::economic_constants::SLOTS_PER_EPOCH;

pub type Slot = u64;
pub type Epoch = u64;
pub type Gwei = u64;
pub type ValidatorIndex = u64;
pub type Root = [u8; 32];

/// Sentinel for "not scheduled" lifecycle epochs.
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;
pub const GENESIS_EPOCH: Epoch = 0;

/// Epoch containing `slot`.
pub fn slot_to_epoch(slot: Slot) -> Epoch {
    slot / SLOTS_PER_EPOCH
}

/// Finalized (epoch, block root) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Root,
}

/// A pending or included bail-out exit for one validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BailOut {
    pub validator_index: ValidatorIndex,
}

impl BailOut {
    pub fn new(validator_index: ValidatorIndex) -> Self {
        BailOut { validator_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_to_epoch_boundaries() {
        assert_eq!(slot_to_epoch(0), 0);
        assert_eq!(slot_to_epoch(SLOTS_PER_EPOCH - 1), 0);
        assert_eq!(slot_to_epoch(SLOTS_PER_EPOCH), 1);
    }

    #[test]
    fn bail_out_json_shape() {
        let b = BailOut::new(7);
        assert_eq!(serde_json::to_string(&b).unwrap(), r#"{"validator_index":7}"#);
    }
}
