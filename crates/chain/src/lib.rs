//! # Orbit Chain Economics
//!
//! Per-epoch economic state transition of the Orbit beacon chain: issuance,
//! reward feedback, attester/proposer rewards and penalties, and the
//! bail-out exit queue.
//!
//! ## Module Overview
//!
//! | Module | Fungsi |
//! |--------|--------|
//! | `types` | Epoch, Slot, Gwei, ValidatorIndex, Checkpoint, BailOut |
//! | `state` | BeaconState facade: reserve account, balance totals, registry |
//! | `balance_cache` | Explicit cache for total active balance / balance with queue |
//! | `issuance` | Epoch issuance, target deposit plan, max boost yield |
//! | `reward_factor` | Reward adjustment controller and reserve roll |
//! | `base_reward` | Reward per effective-balance increment |
//! | `precompute` | ValidatorEpochStats, EpochBalanceTotals |
//! | `rewards` | Attester/proposer deltas and their application |
//! | `exit` | ExitInitiator seam, churn-limited exit queue |
//! | `bailout` | Score gate, pending pool, block processing |
//! | `epoch` | Epoch economics orchestration |
//!
//! ## Epoch Boundary
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────────┐   ┌──────────────────────┐
//! │ IssuanceSchedule │──►│ RewardAdjustment     │──►│ BaseReward / Deltas  │
//! │ + ReserveAccount │   │ Controller           │   │ balances, reserve    │
//! └──────────────────┘   └──────────────────────┘   └──────────────────────┘
//! ```
//!
//! ## Block
//!
//! ```text
//! BailOutPool::bail_outs_for_inclusion → process_bail_outs → BailOutPool::mark_included
//! ```
//!
//! Everything here is deterministic: identical inputs yield bit-identical
//! state on every node.

pub mod types;
pub mod state;
pub mod balance_cache;
pub mod issuance;
pub mod reward_factor;
pub mod base_reward;
pub mod precompute;
pub mod rewards;
pub mod exit;
pub mod bailout;
pub mod epoch;

pub use bailout::{process_bail_outs, recovery_score, verify_bail_out, BailOutError, BailOutPool};
pub use balance_cache::BalanceCache;
pub use base_reward::{base_reward, base_reward_per_increment};
pub use epoch::{process_epoch_economics, EpochEconomicsSummary, EpochProcessingError};
pub use exit::{ExitError, ExitInitiator, RegistryExitInitiator};
pub use issuance::{epoch_issuance, epoch_to_year, max_boost_yield, target_deposit_plan};
pub use precompute::{EpochBalanceTotals, ValidatorEpochStats};
pub use reward_factor::{
    calculate_reward_adjustment_factor, process_reward_factor_update, RewardFactorError,
};
pub use rewards::{
    attestations_delta, process_rewards_and_penalties_precompute, proposers_delta,
    AttestationDeltas, RewardError, RewardsSummary,
};
pub use state::{BeaconState, StateError, Validator, ValidatorBailoutState};
pub use types::{BailOut, Checkpoint, Epoch, Gwei, Slot, ValidatorIndex, FAR_FUTURE_EPOCH};

pub use orbit_common::EconomicsConfig;
