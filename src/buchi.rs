// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Büchi automata produced by degeneralization
//!
//! A state of a [BuchiAutomaton] is a pair (GBA state, counter) plus a synthetic
//! initial state. The counter is in the interval `[0, k]` where `k` is the number of
//! acceptance sets of the source GBA. States whose counter is `k` are accepting.
//!
//! Each state carries a display id (inherited from its GBA state, `-1` for the
//! initial state) and a list of transitions. A transition has a target state and a
//! [Label]: a conjunction of positive and negative literals.
//!
//! States are referred to by a [BStateId]. Ids are stable for the lifetime of the
//! automaton but not contiguous: states removed by minimization leave holes.
//!

use std::fmt::Display;

use crate::{
    degeneralize::{BuildStats, MinimizeStats},
    generalized::GStateId,
    label_sets::{Label, LabelSet},
    lasso::{Lasso, Product},
    registry::StateRegistry,
    simplify,
};

/// Index of a state
pub type BStateId = usize;

/// Display id of the initial state
pub const INITIAL_ID: i32 = -1;

/// Display id of the universally accepting state
pub const ACCEPT_ALL_ID: i32 = 0;

///
/// Status of a state with respect to the strongly connected components
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SccStatus {
    /// Not analyzed yet
    Unresolved,
    /// In a non-trivial SCC: the acceptance marking matters
    Rigid,
    /// Alone in its SCC without a self-loop: no run visits this state more than once,
    /// so its acceptance marking can be changed freely.
    Trivial,
}

///
/// Transition of a Büchi automaton
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BTransition {
    pub(crate) target: BStateId,
    pub(crate) label: Label,
}

impl BTransition {
    pub(crate) fn new(target: BStateId, label: Label) -> Self {
        BTransition { target, label }
    }

    /// Target state
    pub fn target(&self) -> BStateId {
        self.target
    }

    /// Condition for taking this transition
    pub fn label(&self) -> &Label {
        &self.label
    }
}

///
/// State of a Büchi automaton
///
#[derive(Debug, Clone)]
pub struct BState {
    pub(crate) id: BStateId,
    // GBA state this state comes from (None for the initial state)
    pub(crate) source: Option<GStateId>,
    // display id
    pub(crate) identity_id: i32,
    // acceptance counter in [0, k]
    pub(crate) counter: u32,
    // number of transitions to this state (maintained during construction only)
    pub(crate) incoming: u32,
    pub(crate) scc: SccStatus,
    pub(crate) transitions: Vec<BTransition>,
    // where references to this state go once it's been removed
    pub(crate) forward: Option<BStateId>,
}

impl BState {
    pub(crate) fn new(id: BStateId, source: Option<GStateId>, identity_id: i32, counter: u32) -> Self {
        BState {
            id,
            source,
            identity_id,
            counter,
            incoming: 0,
            scc: SccStatus::Unresolved,
            transitions: Vec::new(),
            forward: None,
        }
    }

    /// Index of this state
    pub fn id(&self) -> BStateId {
        self.id
    }

    /// The GBA state this state was built from (None for the initial state)
    pub fn source_state(&self) -> Option<GStateId> {
        self.source
    }

    /// Display id
    pub fn identity_id(&self) -> i32 {
        self.identity_id
    }

    /// Acceptance counter
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// SCC status
    pub fn scc_status(&self) -> SccStatus {
        self.scc
    }

    /// Check whether the acceptance marking of this state can be changed
    pub fn is_flexible(&self) -> bool {
        self.scc == SccStatus::Trivial
    }

    /// Check whether this is the initial state
    pub fn is_initial(&self) -> bool {
        self.source.is_none()
    }

    /// Outgoing transitions
    pub fn transitions(&self) -> &[BTransition] {
        &self.transitions
    }
}

///
/// Büchi automaton
/// - accept = number of acceptance sets of the source GBA = counter of accepting states
/// - next_identity = largest display id in use (fresh ids are allocated above it)
///
#[derive(Debug)]
pub struct BuchiAutomaton {
    pub(crate) registry: StateRegistry,
    pub(crate) initial: Option<BStateId>,
    pub(crate) accept: u32,
    pub(crate) next_identity: i32,
    pub(crate) propositions: Vec<String>,
    pub(crate) stats: BuildStats,
}

impl BuchiAutomaton {
    pub(crate) fn new(
        registry: StateRegistry,
        initial: BStateId,
        accept: u32,
        next_identity: i32,
        propositions: Vec<String>,
        stats: BuildStats,
    ) -> Self {
        let mut a = BuchiAutomaton {
            registry,
            initial: Some(initial),
            accept,
            next_identity,
            propositions,
            stats,
        };
        a.refresh_initial();
        a
    }

    // forget the initial state if it's been removed
    pub(crate) fn refresh_initial(&mut self) {
        if let Some(i) = self.initial {
            if !self.registry.is_live(i) {
                self.initial = None;
            }
        }
    }

    /// Number of acceptance sets of the source GBA (counter value of accepting states)
    pub fn num_acceptance_sets(&self) -> u32 {
        self.accept
    }

    /// Names of the atomic propositions
    pub fn propositions(&self) -> &[String] {
        &self.propositions
    }

    /// Statistics collected during construction
    pub fn build_stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Check whether the automaton has no state (it refuses all words)
    pub fn is_empty(&self) -> bool {
        self.registry.num_live() == 0
    }

    /// Initial state or None if the automaton is empty
    pub fn initial_state(&self) -> Option<&BState> {
        self.initial.map(|i| self.registry.state(i))
    }

    /// Get a state from its id
    /// panics if the state has been removed
    pub fn state(&self, id: BStateId) -> &BState {
        debug_assert!(self.registry.is_live(id));
        self.registry.state(id)
    }

    /// Check whether a state id refers to a state of this automaton
    pub fn contains(&self, id: BStateId) -> bool {
        self.registry.is_live(id)
    }

    /// Iterator through the states: initial state first, then the others in
    /// construction order
    pub fn states(&self) -> impl Iterator<Item = &BState> {
        self.registry.finalized().iter().map(move |&i| self.registry.state(i))
    }

    /// Number of states
    pub fn num_states(&self) -> usize {
        self.registry.num_live()
    }

    /// Number of transitions
    pub fn num_transitions(&self) -> usize {
        self.states().map(|s| s.transitions.len()).sum()
    }

    /// Check whether a state is accepting
    pub fn is_accepting(&self, s: &BState) -> bool {
        s.counter == self.accept
    }

    /// Target state of a transition
    pub fn target(&self, t: &BTransition) -> &BState {
        self.state(t.target)
    }

    ///
    /// Run the minimization loop
    /// - scc_refinement: use the SCC analysis to find states whose acceptance
    ///   marking can be changed
    ///
    /// Minimizing an automaton that's already minimal removes nothing.
    ///
    pub fn minimize(&mut self, scc_refinement: bool) -> MinimizeStats {
        simplify::minimize(self, scc_refinement)
    }

    ///
    /// Check whether a lasso word is accepted
    ///
    /// The word is accepted if there's a run that visits accepting states
    /// infinitely often.
    ///
    pub fn accepts_lasso(&self, word: &Lasso) -> bool {
        let product = Product::explore(word, self.initial, |s: BStateId, v: &LabelSet| {
            self.state(s)
                .transitions
                .iter()
                .filter(|t| t.label.is_satisfied_by(v))
                .map(|t| (t.target, LabelSet::new()))
                .collect()
        });
        product.cycles().iter().any(|c| {
            c.nodes
                .iter()
                .any(|&n| self.is_accepting(self.state(product.state(n))))
        })
    }

    // name used in the verbose dump
    fn dump_name(&self, s: &BState) -> String {
        if s.identity_id == INITIAL_ID {
            "init".to_string()
        } else if self.is_accepting(s) {
            format!("accept_{}", s.identity_id)
        } else {
            format!("T{}_{}", s.counter, s.identity_id)
        }
    }
}

impl Display for BuchiAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return writeln!(f, "empty automaton, refuses all words");
        }
        for s in self.states() {
            writeln!(f, "state {}", self.dump_name(s))?;
            for t in &s.transitions {
                writeln!(
                    f,
                    "{} -> {}",
                    t.label.with_names(&self.propositions),
                    self.dump_name(self.target(t))
                )?;
            }
        }
        Ok(())
    }
}
