//! # Beacon State Module
//!
//! Module ini adalah **FACADE** untuk state yang dibaca dan ditulis oleh
//! transisi ekonomi per-epoch.
//!
//! ## Arsitektur
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         mod.rs (FACADE)                         │
//! │  - BeaconState, Validator, ValidatorBailoutState                │
//! │  - Constructor new(), readers, narrow writers                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//!  ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!  │   Reserve    │         │   Balances   │         │   Registry   │
//!  │   Account    │         │  (cached)    │         │  exit queue  │
//!  └──────────────┘         └──────────────┘         └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! | Module | Fungsi |
//! |--------|--------|
//! | `internal_reserve` | Feedback boost, reserve drain |
//! | `internal_balances` | Total balance, total active balance, total balance with queue |
//! | `internal_registry` | Active count, max exit epoch & churn, exit epoch writes |
//!
//! ## Write Discipline
//!
//! Economic processing writes only: balances, current/previous epoch reserve,
//! reward adjustment factor, and validator exit/withdrawable epochs (through
//! exit initiation). Everything else is set up by the surrounding pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    slot_to_epoch, Checkpoint, Epoch, Gwei, Root, Slot, ValidatorIndex, FAR_FUTURE_EPOCH,
    GENESIS_EPOCH,
};

/// Reserve account: epoch_feedback_boost, decrease_current_reserve
mod internal_reserve;

/// Balance totals: total_balance, total_active_balance, total_balance_with_queue
mod internal_balances;

/// Validator registry: active_validator_count, validators_max_exit_epoch_and_churn, set_validator_exit
mod internal_registry;

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("validator index {0} out of range")]
    ValidatorNotFound(ValidatorIndex),
}

// ════════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub effective_balance: Gwei,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
}

impl Validator {
    /// Unslashed validator active from `activation_epoch` with no exit scheduled.
    pub fn new_active(effective_balance: Gwei, activation_epoch: Epoch) -> Self {
        Validator {
            effective_balance,
            slashed: false,
            activation_eligibility_epoch: activation_epoch,
            activation_epoch,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    /// Validator eligible for activation but not yet activated.
    pub fn new_pending(effective_balance: Gwei, eligibility_epoch: Epoch) -> Self {
        Validator {
            effective_balance,
            slashed: false,
            activation_eligibility_epoch: eligibility_epoch,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    pub fn is_active_at(&self, epoch: Epoch) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }

    /// In the activation queue at `epoch`.
    pub fn is_pending_at(&self, epoch: Epoch) -> bool {
        self.activation_eligibility_epoch != FAR_FUTURE_EPOCH && epoch < self.activation_epoch
    }

    /// Active at `epoch` with an exit already scheduled.
    pub fn is_exiting_at(&self, epoch: Epoch) -> bool {
        self.is_active_at(epoch) && self.exit_epoch != FAR_FUTURE_EPOCH
    }

    pub fn has_initiated_exit(&self) -> bool {
        self.exit_epoch != FAR_FUTURE_EPOCH
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// BAIL-OUT SCORE
// ════════════════════════════════════════════════════════════════════════════════

/// Per-validator bail-out score state.
///
/// On the wire the score is a plain `u64` with `u64::MAX` meaning the
/// validator has already been bailed out; [`from_raw`](Self::from_raw) and
/// [`to_raw`](Self::to_raw) convert at that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorBailoutState {
    Eligible(u64),
    AlreadyBailedOut,
}

impl ValidatorBailoutState {
    pub const RAW_ALREADY_BAILED_OUT: u64 = u64::MAX;

    pub fn from_raw(raw: u64) -> Self {
        if raw == Self::RAW_ALREADY_BAILED_OUT {
            ValidatorBailoutState::AlreadyBailedOut
        } else {
            ValidatorBailoutState::Eligible(raw)
        }
    }

    pub fn to_raw(self) -> u64 {
        match self {
            ValidatorBailoutState::Eligible(score) => score,
            ValidatorBailoutState::AlreadyBailedOut => Self::RAW_ALREADY_BAILED_OUT,
        }
    }

    /// Score if still eligible.
    pub fn score(self) -> Option<u64> {
        match self {
            ValidatorBailoutState::Eligible(score) => Some(score),
            ValidatorBailoutState::AlreadyBailedOut => None,
        }
    }
}

impl Default for ValidatorBailoutState {
    fn default() -> Self {
        ValidatorBailoutState::Eligible(0)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// BEACON STATE
// ════════════════════════════════════════════════════════════════════════════════

/// State object consumed by the epoch economic transition.
///
/// Not internally synchronized: callers own it and pass `&` or `&mut`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconState {
    slot: Slot,
    latest_block_root: Root,
    finalized_checkpoint: Checkpoint,
    validators: Vec<Validator>,
    balances: Vec<Gwei>,
    bail_out_scores: Vec<ValidatorBailoutState>,
    current_epoch_reserve: Gwei,
    previous_epoch_reserve: Gwei,
    reward_adjustment_factor: i64,
}

impl BeaconState {
    /// Build a state at `slot`. Every validator starts with a zero bail-out score.
    ///
    /// `balances` is taken as-is; the epoch transition rejects a registry and
    /// balance list of different lengths.
    pub fn new(slot: Slot, validators: Vec<Validator>, balances: Vec<Gwei>) -> Self {
        let bail_out_scores = vec![ValidatorBailoutState::default(); validators.len()];
        BeaconState {
            slot,
            latest_block_root: [0u8; 32],
            finalized_checkpoint: Checkpoint::default(),
            validators,
            balances,
            bail_out_scores,
            current_epoch_reserve: 0,
            previous_epoch_reserve: 0,
            reward_adjustment_factor: 0,
        }
    }

    // ============================================================
    // READERS
    // ============================================================

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn current_epoch(&self) -> Epoch {
        slot_to_epoch(self.slot)
    }

    /// Previous epoch, or genesis at genesis.
    pub fn previous_epoch(&self) -> Epoch {
        self.current_epoch().saturating_sub(1).max(GENESIS_EPOCH)
    }

    pub fn latest_block_root(&self) -> Root {
        self.latest_block_root
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.finalized_checkpoint
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn num_validators(&self) -> usize {
        self.validators.len()
    }

    pub fn validator(&self, index: ValidatorIndex) -> Option<&Validator> {
        usize::try_from(index).ok().and_then(|i| self.validators.get(i))
    }

    pub fn balances(&self) -> &[Gwei] {
        &self.balances
    }

    pub fn balance(&self, index: ValidatorIndex) -> Option<Gwei> {
        usize::try_from(index).ok().and_then(|i| self.balances.get(i)).copied()
    }

    pub fn bail_out_scores(&self) -> &[ValidatorBailoutState] {
        &self.bail_out_scores
    }

    pub fn bail_out_state(&self, index: ValidatorIndex) -> Option<ValidatorBailoutState> {
        usize::try_from(index).ok().and_then(|i| self.bail_out_scores.get(i)).copied()
    }

    pub fn current_epoch_reserve(&self) -> Gwei {
        self.current_epoch_reserve
    }

    pub fn previous_epoch_reserve(&self) -> Gwei {
        self.previous_epoch_reserve
    }

    pub fn reward_adjustment_factor(&self) -> i64 {
        self.reward_adjustment_factor
    }

    // ============================================================
    // ECONOMIC WRITERS
    // ============================================================

    pub fn set_balances(&mut self, balances: Vec<Gwei>) {
        self.balances = balances;
    }

    pub fn set_current_epoch_reserve(&mut self, amount: Gwei) {
        self.current_epoch_reserve = amount;
    }

    pub fn set_previous_epoch_reserve(&mut self, amount: Gwei) {
        self.previous_epoch_reserve = amount;
    }

    pub fn set_reward_adjustment_factor(&mut self, factor: i64) {
        self.reward_adjustment_factor = factor;
    }

    // ============================================================
    // PIPELINE SETUP
    // ============================================================

    pub fn set_slot(&mut self, slot: Slot) {
        self.slot = slot;
    }

    pub fn set_latest_block_root(&mut self, root: Root) {
        self.latest_block_root = root;
    }

    pub fn set_finalized_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.finalized_checkpoint = checkpoint;
    }

    pub fn set_bail_out_state(
        &mut self,
        index: ValidatorIndex,
        bail_out: ValidatorBailoutState,
    ) -> Result<(), StateError> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| self.bail_out_scores.get_mut(i))
            .ok_or(StateError::ValidatorNotFound(index))?;
        *slot = bail_out;
        Ok(())
    }

    /// Append a validator with its balance and a zero bail-out score.
    /// Returns the new validator's index.
    pub fn push_validator(&mut self, validator: Validator, balance: Gwei) -> ValidatorIndex {
        self.validators.push(validator);
        self.balances.push(balance);
        self.bail_out_scores.push(ValidatorBailoutState::default());
        (self.validators.len() - 1) as ValidatorIndex
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SLOTS_PER_EPOCH;

    #[test]
    fn validator_lifecycle_predicates() {
        let mut v = Validator::new_active(32_000_000_000, 2);
        assert!(!v.is_active_at(1));
        assert!(v.is_active_at(2));
        assert!(!v.is_exiting_at(2));

        v.exit_epoch = 10;
        assert!(v.is_exiting_at(9));
        assert!(!v.is_active_at(10));
        assert!(v.has_initiated_exit());

        let p = Validator::new_pending(32_000_000_000, 3);
        assert!(p.is_pending_at(5));
        assert!(!p.is_active_at(5));
    }

    #[test]
    fn bail_out_state_raw_sentinel() {
        assert_eq!(
            ValidatorBailoutState::from_raw(u64::MAX),
            ValidatorBailoutState::AlreadyBailedOut
        );
        assert_eq!(ValidatorBailoutState::from_raw(7), ValidatorBailoutState::Eligible(7));
        assert_eq!(ValidatorBailoutState::AlreadyBailedOut.to_raw(), u64::MAX);
        assert_eq!(ValidatorBailoutState::AlreadyBailedOut.score(), None);
    }

    #[test]
    fn epochs_from_slot() {
        let mut s = BeaconState::new(0, vec![], vec![]);
        assert_eq!(s.current_epoch(), 0);
        assert_eq!(s.previous_epoch(), 0);
        s.set_slot(3 * SLOTS_PER_EPOCH + 5);
        assert_eq!(s.current_epoch(), 3);
        assert_eq!(s.previous_epoch(), 2);
    }

    #[test]
    fn push_validator_keeps_vectors_aligned() {
        let mut s = BeaconState::new(0, vec![], vec![]);
        let idx = s.push_validator(Validator::new_active(1, 0), 5);
        assert_eq!(idx, 0);
        assert_eq!(s.balance(0), Some(5));
        assert_eq!(s.bail_out_state(0), Some(ValidatorBailoutState::Eligible(0)));
        assert!(s.set_bail_out_state(1, ValidatorBailoutState::AlreadyBailedOut).is_err());
    }
}
