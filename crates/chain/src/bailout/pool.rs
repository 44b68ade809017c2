//! # Bail-Out Pool
//!
//! Pending bail-out admission queue shared between epoch processing (which
//! admits validators) and block production (which pulls them for inclusion).
//!
//! ## Structure
//!
//! ```text
//!  index: HashMap<ValidatorIndex, NodeHandle>
//!            │
//!            ▼
//!  slots: [ Some(node) | None(free) | Some(node) | ... ]
//!  head ─► node ⇄ node ⇄ node ◄─ tail        (insertion order)
//! ```
//!
//! Nodes live in an arena and link to each other by slot handle. Removal
//! pushes the slot onto a free list for reuse, so insert and remove are O(1)
//! and handles stay valid until their node is removed.
//!
//! ## Invariants
//!
//! - `index` and the linked list hold exactly the same validator indices
//! - at most one pending record per validator index
//!
//! Every operation takes the single pool lock for its whole duration.

use orbit_common::EconomicsConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::verify_bail_out;
use crate::state::{BeaconState, ValidatorBailoutState};
use crate::types::{BailOut, ValidatorIndex};

type NodeHandle = usize;

// ════════════════════════════════════════════════════════════════════════════════
// ARENA LIST
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct Node {
    record: BailOut,
    prev: Option<NodeHandle>,
    next: Option<NodeHandle>,
}

#[derive(Debug, Default)]
struct PendingList {
    slots: Vec<Option<Node>>,
    free: Vec<NodeHandle>,
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    len: usize,
}

impl PendingList {
    fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.slots.get_mut(handle).and_then(Option::as_mut)
    }

    fn push_back(&mut self, record: BailOut) -> NodeHandle {
        let node = Node {
            record,
            prev: self.tail,
            next: None,
        };
        let handle = match self.free.pop() {
            Some(h) => {
                self.slots[h] = Some(node);
                h
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(t) => {
                if let Some(n) = self.node_mut(t) {
                    n.next = Some(handle);
                }
            }
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
        handle
    }

    fn remove(&mut self, handle: NodeHandle) -> Option<BailOut> {
        let node = self.slots.get_mut(handle)?.take()?;

        match node.prev {
            Some(p) => {
                if let Some(n) = self.node_mut(p) {
                    n.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(nx) => {
                if let Some(n) = self.node_mut(nx) {
                    n.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.free.push(handle);
        self.len -= 1;
        Some(node.record)
    }

    fn iter(&self) -> PendingIter<'_> {
        PendingIter {
            list: self,
            cursor: self.head,
        }
    }
}

struct PendingIter<'a> {
    list: &'a PendingList,
    cursor: Option<NodeHandle>,
}

impl<'a> Iterator for PendingIter<'a> {
    type Item = &'a BailOut;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let node = self.list.slots.get(handle)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.record)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POOL
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct PoolInner {
    list: PendingList,
    index: HashMap<ValidatorIndex, NodeHandle>,
    initialized: bool,
}

impl PoolInner {
    fn insert(&mut self, record: BailOut) -> bool {
        if self.index.contains_key(&record.validator_index) {
            return false;
        }
        let handle = self.list.push_back(record);
        self.index.insert(record.validator_index, handle);
        true
    }

    fn remove(&mut self, validator_index: ValidatorIndex) -> bool {
        match self.index.remove(&validator_index) {
            Some(handle) => self.list.remove(handle).is_some(),
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct BailOutPool {
    inner: Mutex<PoolInner>,
    cfg: Arc<EconomicsConfig>,
}

impl BailOutPool {
    pub fn new(cfg: Arc<EconomicsConfig>) -> Self {
        BailOutPool {
            inner: Mutex::new(PoolInner::default()),
            cfg,
        }
    }

    /// Seed the pool from every score at or above the threshold.
    ///
    /// Candidates are admitted highest score first; equal scores keep
    /// validator index order. Only the first call has any effect.
    pub fn initialize(&self, state: &BeaconState) {
        let mut inner = self.inner.lock();
        if inner.initialized {
            return;
        }

        let threshold = self.cfg.bail_out_score_threshold;
        let mut candidates: Vec<(ValidatorIndex, u64)> = state
            .bail_out_scores()
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match *s {
                ValidatorBailoutState::Eligible(score) if score >= threshold => {
                    Some((i as ValidatorIndex, score))
                }
                _ => None,
            })
            .collect();
        // stable: ties stay in index order
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        for (index, _) in &candidates {
            inner.insert(BailOut::new(*index));
        }
        inner.initialized = true;

        debug!(admitted = candidates.len(), threshold, "bail-out pool initialized");
    }

    /// Admit validators whose score just crossed the threshold, i.e. lies in
    /// `[threshold, threshold + bias)`. Does nothing before [`initialize`](Self::initialize).
    pub fn update_bail_outs(&self, state: &BeaconState) {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return;
        }

        let lower = self.cfg.bail_out_score_threshold;
        let upper = lower.saturating_add(self.cfg.bail_out_score_bias);
        let mut admitted = 0usize;
        for (i, s) in state.bail_out_scores().iter().enumerate() {
            if let ValidatorBailoutState::Eligible(score) = *s {
                if score >= lower && score < upper && inner.insert(BailOut::new(i as ValidatorIndex)) {
                    admitted += 1;
                }
            }
        }

        if admitted > 0 {
            debug!(admitted, pending = inner.list.len, "bail-out pool updated");
        }
    }

    /// Up to `max_voluntary_exits - already_included` pending bail-outs that
    /// pass [`verify_bail_out`] against `state`, oldest first.
    ///
    /// Records found invalid while scanning are evicted.
    pub fn bail_outs_for_inclusion(&self, state: &BeaconState, already_included: u64) -> Vec<BailOut> {
        let limit = self.cfg.max_voluntary_exits.saturating_sub(already_included);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let mut inner = self.inner.lock();
        let mut selected = Vec::new();
        let mut invalid = Vec::new();
        for record in inner.list.iter() {
            if selected.len() >= limit {
                break;
            }
            match verify_bail_out(state, record.validator_index, &self.cfg) {
                Ok(()) => selected.push(*record),
                Err(e) => {
                    debug!(validator = record.validator_index, error = %e, "evicting invalid bail-out");
                    invalid.push(record.validator_index);
                }
            }
        }
        for index in invalid {
            inner.remove(index);
        }
        selected
    }

    /// Add `record` unless its validator already has one pending.
    pub fn insert_bail_out(&self, record: BailOut) -> bool {
        self.inner.lock().insert(record)
    }

    /// Retire the pending record for `record.validator_index`, if any.
    pub fn mark_included(&self, record: &BailOut) {
        self.inner.lock().remove(record.validator_index);
    }

    /// Snapshot of every pending record in insertion order.
    pub fn pending_bail_outs(&self) -> Vec<BailOut> {
        self.inner.lock().list.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().list.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
