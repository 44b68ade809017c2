//! Bail-Out Integration Tests
//!
//! Pool admission, proposer selection, block application and retirement
//! wired together the way a node runs them.

use std::sync::Arc;

use orbit_chain::{
    process_bail_outs, BailOut, BailOutError, BailOutPool, BeaconState, EconomicsConfig,
    RegistryExitInitiator, Validator, ValidatorBailoutState, FAR_FUTURE_EPOCH,
};
use orbit_chain::types::SLOTS_PER_EPOCH;

// ════════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════════

fn cfg() -> Arc<EconomicsConfig> {
    Arc::new(EconomicsConfig::default())
}

fn state_with_scores(scores: &[u64], epoch: u64) -> BeaconState {
    let validators = vec![Validator::new_active(32_000_000_000, 0); scores.len()];
    let mut s = BeaconState::new(epoch * SLOTS_PER_EPOCH, validators, vec![0; scores.len()]);
    for (i, &score) in scores.iter().enumerate() {
        s.set_bail_out_state(i as u64, ValidatorBailoutState::from_raw(score))
            .expect("index in range");
    }
    s
}

// ════════════════════════════════════════════════════════════════════════════════
// A. INCLUSION
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn test_inclusion_caps_at_max_exits_and_skips_exited() {
    let c = cfg();
    let max = c.max_voluntary_exits as usize;
    let mut s = state_with_scores(&vec![6_000; 2 * max], 3);
    // a few already-exiting validators at the front of the queue
    for i in [0u64, 3, 5] {
        s.set_validator_exit(i, 50, 306).unwrap();
    }

    let pool = BailOutPool::new(c.clone());
    pool.initialize(&s);
    assert_eq!(pool.len(), 2 * max);

    let picked = pool.bail_outs_for_inclusion(&s, 0);
    assert_eq!(picked.len(), max);
    for b in &picked {
        assert_eq!(s.validators()[b.validator_index as usize].exit_epoch, FAR_FUTURE_EPOCH);
    }
    // invalid records evicted
    assert_eq!(pool.len(), 2 * max - 3);
}

#[test]
fn test_inclusion_respects_already_included() {
    let c = cfg();
    let s = state_with_scores(&[6_000; 10], 1);
    let pool = BailOutPool::new(c);
    pool.initialize(&s);
    assert_eq!(pool.bail_outs_for_inclusion(&s, 13).len(), 3);
}

// ════════════════════════════════════════════════════════════════════════════════
// B. END TO END
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pool_to_block_to_retirement() {
    let c = cfg();
    let init = RegistryExitInitiator::new(&c);
    let mut s = state_with_scores(&[5_200, 0, 9_999, u64::MAX, 5_120], 4);

    let pool = BailOutPool::new(c.clone());
    pool.initialize(&s);
    let picked = pool.bail_outs_for_inclusion(&s, 0);
    assert_eq!(
        picked,
        vec![BailOut::new(2), BailOut::new(0), BailOut::new(4)]
    );

    let exits: Vec<_> = picked.iter().copied().map(Some).collect();
    assert_eq!(process_bail_outs(&mut s, &exits, &init, &c), Ok(3));
    for b in &picked {
        assert_eq!(s.validators()[b.validator_index as usize].exit_epoch, 4 + 1 + 4);
        pool.mark_included(b);
    }
    assert!(pool.is_empty());

    // the same operations cannot be replayed
    assert_eq!(
        process_bail_outs(&mut s, &exits, &init, &c),
        Err(BailOutError::AlreadyExited(2))
    );
}

#[test]
fn test_new_threshold_crossings_join_queue_tail() {
    let c = cfg();
    let pool = BailOutPool::new(c.clone());
    pool.initialize(&state_with_scores(&[7_000, 0, 0], 1));

    let later = state_with_scores(&[7_000, 5_130, 6_000], 1);
    pool.update_bail_outs(&later);
    // 6_000 is past the admission window and waits for a re-initialization
    assert_eq!(pool.pending_bail_outs(), vec![BailOut::new(0), BailOut::new(1)]);
}

#[test]
fn test_pool_shared_across_threads() {
    let c = cfg();
    let pool = Arc::new(BailOutPool::new(c));
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for i in 0..50u64 {
                    pool.insert_bail_out(BailOut::new(i % 25 + t * 25));
                    if i % 3 == 0 {
                        pool.mark_included(&BailOut::new(i % 25 + t * 25));
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker");
    }

    let pending = pool.pending_bail_outs();
    let mut unique = pending.clone();
    unique.sort_by_key(|b| b.validator_index);
    unique.dedup();
    assert_eq!(unique.len(), pending.len());
    assert_eq!(pool.len(), pending.len());
}
