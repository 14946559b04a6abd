// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Registry of Büchi states
//!
//! All states live in one arena, indexed by [BStateId]. The registry maps every
//! (GBA state, counter) pair to at most one state, and each state belongs to
//! exactly one of three pools:
//! - pending: created but transitions not built yet
//! - finalized: part of the automaton
//! - tombstoned: removed, but possibly still the target of some transitions.
//!   A tombstone has a forward reference to the state that replaces it, or no
//!   forward if the state was dead.
//!
//! Tombstones are cleaned up by [retarget_all](StateRegistry::retarget_all): transitions to
//! a tombstone are redirected to its forward (or deleted if there's no forward), then
//! the tombstoned states are freed.
//!

use std::collections::HashMap;

use tracing::trace;

use crate::{
    buchi::{BState, BStateId, BTransition},
    generalized::GStateId,
};

///
/// Pool a state belongs to
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pool {
    Pending,
    Finalized,
    Tombstoned,
}

#[derive(Debug)]
struct Slot {
    pool: Pool,
    state: BState,
}

//
// Invariants:
// - slots[i] is None iff state i has been freed
// - keys maps (source, counter) to the unique non-freed state with that identity
// - finalized lists the finalized states in the order they were finalized
// - tombstoned lists the tombstones; the forward of a tombstone is never a tombstone
//
#[derive(Debug, Default)]
pub(crate) struct StateRegistry {
    slots: Vec<Option<Slot>>,
    keys: HashMap<(GStateId, u32), BStateId>,
    pending: Vec<BStateId>,
    finalized: Vec<BStateId>,
    tombstoned: Vec<BStateId>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: BStateId) -> &Slot {
        match &self.slots[id] {
            Some(slot) => slot,
            None => panic!("state {} has been freed", id),
        }
    }

    fn slot_mut(&mut self, id: BStateId) -> &mut Slot {
        match &mut self.slots[id] {
            Some(slot) => slot,
            None => panic!("state {} has been freed", id),
        }
    }

    /// Number of slots (including freed states)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get a state
    /// - panics if the state has been freed
    pub fn state(&self, id: BStateId) -> &BState {
        &self.slot(id).state
    }

    pub fn state_mut(&mut self, id: BStateId) -> &mut BState {
        &mut self.slot_mut(id).state
    }

    /// Pool of a non-freed state
    pub fn pool(&self, id: BStateId) -> Pool {
        self.slot(id).pool
    }

    /// Check whether id is a finalized state
    pub fn is_live(&self, id: BStateId) -> bool {
        matches!(self.slots.get(id), Some(Some(slot)) if slot.pool == Pool::Finalized)
    }

    /// Finalized states in finalization order
    pub fn finalized(&self) -> &[BStateId] {
        &self.finalized
    }

    /// Copy of the finalized list (for passes that modify the registry)
    pub fn live_states(&self) -> Vec<BStateId> {
        self.finalized.clone()
    }

    /// Number of finalized states
    pub fn num_live(&self) -> usize {
        self.finalized.len()
    }

    /// Number of tombstones not freed yet
    pub fn num_tombstones(&self) -> usize {
        self.tombstoned.len()
    }

    fn allocate(&mut self, source: Option<GStateId>, identity_id: i32, counter: u32, pool: Pool) -> BStateId {
        let id = self.slots.len();
        self.slots.push(Some(Slot {
            pool,
            state: BState::new(id, source, identity_id, counter),
        }));
        id
    }

    ///
    /// Create the initial state: it has no source and goes straight to the
    /// finalized pool
    ///
    pub fn add_initial(&mut self, identity_id: i32, counter: u32) -> BStateId {
        let id = self.allocate(None, identity_id, counter, Pool::Finalized);
        self.finalized.push(id);
        id
    }

    ///
    /// Find the state for (source, counter) or create it
    /// - if the state exists and is live or pending, return it
    /// - if it's a tombstone, return its forward if any, or the tombstone itself
    /// - otherwise, create a pending state
    ///
    pub fn resolve(&mut self, source: GStateId, identity_id: i32, counter: u32) -> BStateId {
        if let Some(&id) = self.keys.get(&(source, counter)) {
            let slot = self.slot(id);
            return match (slot.pool, slot.state.forward) {
                (Pool::Tombstoned, Some(f)) => f,
                _ => id,
            };
        }
        let id = self.allocate(Some(source), identity_id, counter, Pool::Pending);
        self.keys.insert((source, counter), id);
        self.pending.push(id);
        trace!(state = id, source, counter, "new pending state");
        id
    }

    /// Take the most recent pending state
    pub fn pop_pending(&mut self) -> Option<BStateId> {
        self.pending.pop()
    }

    /// Move a pending state to the finalized pool
    pub fn finalize(&mut self, id: BStateId) {
        let slot = self.slot_mut(id);
        debug_assert_eq!(slot.pool, Pool::Pending);
        slot.pool = Pool::Finalized;
        self.finalized.push(id);
    }

    ///
    /// Free a pending state that nothing refers to
    ///
    pub fn destroy(&mut self, id: BStateId) {
        let slot = self.slot(id);
        debug_assert_eq!(slot.pool, Pool::Pending);
        debug_assert_eq!(slot.state.incoming, 0);
        self.forget(id);
    }

    // remove a state from the key map and free its slot
    fn forget(&mut self, id: BStateId) {
        if let Some(source) = self.state(id).source {
            let key = (source, self.state(id).counter);
            if self.keys.get(&key) == Some(&id) {
                self.keys.remove(&key);
            }
        }
        self.slots[id] = None;
    }

    ///
    /// Move a pending or finalized state to the tombstone pool
    /// - forward = state to use instead of id (None if id is dead)
    /// - the transitions of id are dropped
    /// - tombstones that were forwarding to id now forward to the same state as id
    ///
    pub fn tombstone(&mut self, id: BStateId, forward: Option<BStateId>) {
        debug_assert!(forward != Some(id));
        debug_assert!(forward.map_or(true, |f| self.pool(f) != Pool::Tombstoned));

        let slot = self.slot_mut(id);
        let previous = slot.pool;
        debug_assert!(previous != Pool::Tombstoned);
        slot.pool = Pool::Tombstoned;
        slot.state.forward = forward;
        slot.state.transitions.clear();
        if previous == Pool::Finalized {
            self.finalized.retain(|&x| x != id);
        }

        for i in 0..self.tombstoned.len() {
            let t = self.tombstoned[i];
            let s = self.state_mut(t);
            if s.forward == Some(id) {
                s.forward = forward;
            }
        }
        self.tombstoned.push(id);
    }

    ///
    /// Redirect all transitions to tombstones then free the tombstones
    ///
    /// A transition to a tombstone with a forward now goes to the forward.
    /// A transition to a tombstone without forward is removed. If this removes the
    /// last transition of a state, that state is dead too. It's tombstoned and the
    /// redirection repeats until no more state dies.
    ///
    /// - protected = a state that must not be removed even if it loses all its
    ///   transitions
    ///
    /// Return the number of states removed because they became dead.
    ///
    pub fn retarget_all(&mut self, protected: Option<BStateId>) -> usize {
        let mut removed = 0;
        loop {
            let mut dead = Vec::new();
            for id in self.live_states() {
                let transitions = std::mem::take(&mut self.state_mut(id).transitions);
                let had_transitions = !transitions.is_empty();
                let mut kept = Vec::with_capacity(transitions.len());
                for t in transitions {
                    let target = self.slot(t.target);
                    if target.pool != Pool::Tombstoned {
                        kept.push(t);
                    } else if let Some(f) = target.state.forward {
                        assert!(self.pool(f) != Pool::Tombstoned, "forward to a tombstone");
                        kept.push(BTransition::new(f, t.label));
                    }
                }
                if had_transitions && kept.is_empty() && protected != Some(id) {
                    dead.push(id);
                }
                self.state_mut(id).transitions = kept;
            }
            if dead.is_empty() {
                break;
            }
            for id in dead {
                trace!(state = id, "state became dead after retargeting");
                self.tombstone(id, None);
                removed += 1;
            }
        }
        self.free_tombstones();
        removed
    }

    ///
    /// Free all tombstones
    /// - no finalized state may refer to a tombstone
    ///
    pub fn free_tombstones(&mut self) {
        for id in std::mem::take(&mut self.tombstoned) {
            self.forget(id);
        }
    }
}
