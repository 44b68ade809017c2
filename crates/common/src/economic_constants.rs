//! # Economic Constants
//!
//! Mainnet defaults for every economic parameter of the epoch transition.
//!
//! These values seed [`EconomicsConfig::default`](crate::config::EconomicsConfig).
//! Nodes that load a TOML config override individual fields; anything the
//! file leaves out falls back to the values below.
//!
//! All token amounts are in Gwei (1 token = 10^9 Gwei).

// ════════════════════════════════════════════════════════════════════════════════
// TIME
// ════════════════════════════════════════════════════════════════════════════════

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Epochs per year (12s slots, 32 slots per epoch, 365 days).
pub const EPOCHS_PER_YEAR: u64 = 82_125;

// ════════════════════════════════════════════════════════════════════════════════
// BALANCES & SUPPLY
// ════════════════════════════════════════════════════════════════════════════════

/// Effective balance granularity.
pub const EFFECTIVE_BALANCE_INCREMENT: u64 = 1_000_000_000;

/// Upper bound on a validator's effective balance (32 tokens).
pub const MAX_EFFECTIVE_BALANCE: u64 = 32_000_000_000;

/// Maximum token supply (10^9 tokens).
pub const MAX_TOKEN_SUPPLY: u64 = 1_000_000_000_000_000_000;

// ════════════════════════════════════════════════════════════════════════════════
// ISSUANCE
// ════════════════════════════════════════════════════════════════════════════════

/// Denominator of the per-year issuance rate table.
pub const ISSUANCE_PRECISION: u64 = 1_000;

/// Issuance rate per year, in units of `1 / ISSUANCE_PRECISION` of max supply.
/// The last entry applies to every year past the end of the table.
pub const ISSUANCE_RATE: [u64; 11] = [20, 20, 18, 16, 14, 12, 10, 8, 6, 4, 2];

// ════════════════════════════════════════════════════════════════════════════════
// TARGET DEPOSIT PLAN
// ════════════════════════════════════════════════════════════════════════════════

/// End of the early deposit phase, in years.
pub const DEPOSIT_PLAN_EARLY_END: u64 = 4;

/// Gwei added to the early-phase target per epoch.
pub const DEPOSIT_PLAN_EARLY_SLOPE: u64 = 913_242_009_132;

/// Early-phase target at genesis.
pub const DEPOSIT_PLAN_EARLY_OFFSET: u64 = 100_000_000_000_000_000;

/// End of the later deposit phase, in years.
pub const DEPOSIT_PLAN_LATER_END: u64 = 10;

/// Gwei added to the later-phase target per epoch.
pub const DEPOSIT_PLAN_LATER_SLOPE: u64 = 405_885_337_392;

/// Later-phase line intercept, continuous with the early phase at its end.
pub const DEPOSIT_PLAN_LATER_OFFSET: u64 = 266_666_666_666_728_000;

/// Constant target once the later phase is over.
pub const DEPOSIT_PLAN_FINAL: u64 = 600_000_000_000_000_000;

// ════════════════════════════════════════════════════════════════════════════════
// REWARD FEEDBACK
// ════════════════════════════════════════════════════════════════════════════════

/// Fixed-point precision of the reward feedback controller.
pub const REWARD_FEEDBACK_PRECISION: u64 = 1_000_000_000_000;

/// Error-rate amplification before clamping the mitigating factor.
pub const REWARD_FEEDBACK_THRESHOLD_RECIPROCAL: u64 = 10;

/// Maximum change of the adjustment factor per epoch.
pub const TARGET_CHANGE_RATE: u64 = 1_500_000;

/// Lower bound of the mitigating factor.
pub const MIN_MITIGATING_FACTOR: u64 = 1_000_000;

/// Per-year bound on the adjustment factor magnitude.
pub const MAX_BOOST_YIELD: [u64; 7] = [
    50_000_000_000,
    45_000_000_000,
    40_000_000_000,
    35_000_000_000,
    30_000_000_000,
    25_000_000_000,
    20_000_000_000,
];

// ════════════════════════════════════════════════════════════════════════════════
// REWARDS & PENALTIES
// ════════════════════════════════════════════════════════════════════════════════

/// Number of attestation components a base reward is split across.
pub const BASE_REWARDS_PER_EPOCH: u64 = 4;

/// Proposer share divisor of an attester base reward.
pub const PROPOSER_REWARD_QUOTIENT: u64 = 8;

/// Divisor of the finality-delay penalty during an inactivity leak.
pub const INACTIVITY_PENALTY_QUOTIENT: u64 = 1 << 26;

/// Finality delay beyond which the chain is considered leaking.
pub const MIN_EPOCHS_TO_INACTIVITY_PENALTY: u64 = 4;

// ════════════════════════════════════════════════════════════════════════════════
// BAIL-OUT
// ════════════════════════════════════════════════════════════════════════════════

/// Score at which a validator becomes eligible for a bail-out exit.
pub const BAIL_OUT_SCORE_THRESHOLD: u64 = 5_120;

/// Per-epoch score increment of a non-participating validator.
pub const BAIL_OUT_SCORE_BIAS: u64 = 32;

/// Maximum exits (voluntary and bail-out) per block.
pub const MAX_VOLUNTARY_EXITS: u64 = 16;

// ════════════════════════════════════════════════════════════════════════════════
// VALIDATOR LIFECYCLE
// ════════════════════════════════════════════════════════════════════════════════

pub const MIN_PER_EPOCH_CHURN_LIMIT: u64 = 4;
pub const CHURN_LIMIT_QUOTIENT: u64 = 65_536;
pub const MAX_SEED_LOOKAHEAD: u64 = 4;
pub const MIN_VALIDATOR_WITHDRAWABILITY_DELAY: u64 = 256;

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_effective_balance_is_whole_increments() {
        assert_eq!(MAX_EFFECTIVE_BALANCE % EFFECTIVE_BALANCE_INCREMENT, 0);
    }

    #[test]
    fn issuance_rate_is_non_increasing() {
        assert!(ISSUANCE_RATE.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn max_boost_yield_is_non_increasing() {
        assert!(MAX_BOOST_YIELD.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn deposit_plan_phases_join_without_jump() {
        let early_end = EPOCHS_PER_YEAR * DEPOSIT_PLAN_EARLY_END;
        let early = DEPOSIT_PLAN_EARLY_SLOPE * early_end + DEPOSIT_PLAN_EARLY_OFFSET;
        let later = DEPOSIT_PLAN_LATER_SLOPE * early_end + DEPOSIT_PLAN_LATER_OFFSET;
        // both lines meet within one slope step at the phase boundary
        assert!(early.abs_diff(later) < DEPOSIT_PLAN_EARLY_SLOPE);
    }

    #[test]
    fn deposit_plan_final_bounded_by_supply() {
        assert!(DEPOSIT_PLAN_FINAL < MAX_TOKEN_SUPPLY);
    }

    #[test]
    fn mitigating_floor_below_precision() {
        assert!(MIN_MITIGATING_FACTOR <= REWARD_FEEDBACK_PRECISION);
    }
}
