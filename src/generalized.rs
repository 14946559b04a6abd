// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Generalized Büchi automata
//!
//! This is the input of degeneralization. A [GeneralizedBuchi] automaton has
//! - a set of states, indexed from 0 to N-1 (see [GStateId]),
//! - a set of initial states,
//! - `k` acceptance sets, numbered from 0 to `k-1`,
//! - a table of atomic propositions.
//!
//! Every transition has a target state, a [Label], and the set of acceptance sets
//! it belongs to. A run is accepting if, for every acceptance set, it takes transitions
//! of that set infinitely often.
//!
//! Every state also has a display id, used to name the states of the Büchi automaton
//! built from it. Display id 0 is reserved for the state that accepts everything
//! (its name is rendered as `accept_all`). By default, display ids are assigned from 1
//! in the order states are created.
//!
//! Automata are constructed with a [GbaBuilder].
//!

use std::{collections::HashMap, fmt::Display, hash::Hash};

use crate::{
    errors::Error,
    label_sets::{Label, LabelSet},
    lasso::{Lasso, Product},
};

/// Index of a GBA state
pub type GStateId = usize;

///
/// Transition of a generalized Büchi automaton
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GTransition {
    to: GStateId,
    label: Label,
    acceptance: LabelSet,
}

impl GTransition {
    /// Target state
    pub fn to(&self) -> GStateId {
        self.to
    }

    /// Condition to take this transition
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Acceptance sets this transition belongs to
    pub fn acceptance(&self) -> &LabelSet {
        &self.acceptance
    }
}

///
/// State of a generalized Büchi automaton
///
#[derive(Debug, Clone)]
pub struct GState {
    index: GStateId,
    id: i32,
    transitions: Vec<GTransition>,
}

impl GState {
    /// Index of this state
    pub fn index(&self) -> GStateId {
        self.index
    }

    /// Display id
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Outgoing transitions
    pub fn transitions(&self) -> &[GTransition] {
        &self.transitions
    }
}

///
/// Generalized Büchi automaton
///
#[derive(Debug, Clone)]
pub struct GeneralizedBuchi {
    states: Box<[GState]>,
    initial_states: Vec<GStateId>,
    num_acceptance_sets: u32,
    propositions: Vec<String>,
}

impl GeneralizedBuchi {
    /// Get a state from its index
    /// panics if the index is out of range
    pub fn state(&self, index: GStateId) -> &GState {
        &self.states[index]
    }

    /// Iterator to go through the states
    pub fn states(&self) -> impl Iterator<Item = &GState> {
        self.states.iter()
    }

    /// Number of states
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Initial states
    pub fn initial_states(&self) -> &[GStateId] {
        &self.initial_states
    }

    /// Number of acceptance sets
    pub fn num_acceptance_sets(&self) -> u32 {
        self.num_acceptance_sets
    }

    /// Names of the atomic propositions
    pub fn propositions(&self) -> &[String] {
        &self.propositions
    }

    /// Largest display id (0 if there are no states)
    pub fn max_state_id(&self) -> i32 {
        self.states.iter().map(|s| s.id).max().unwrap_or(0).max(0)
    }

    ///
    /// Check whether a lasso word is accepted
    ///
    /// The word is accepted if there's a run that takes transitions from every
    /// acceptance set infinitely often.
    ///
    pub fn accepts_lasso(&self, word: &Lasso) -> bool {
        let product = Product::explore(
            word,
            self.initial_states.iter().copied(),
            |g: GStateId, v: &LabelSet| {
                self.states[g]
                    .transitions
                    .iter()
                    .filter(|t| t.label.is_satisfied_by(v))
                    .map(|t| (t.to, t.acceptance.clone()))
                    .collect()
            },
        );
        let k = self.num_acceptance_sets;
        product
            .cycles()
            .iter()
            .any(|c| (0..k).all(|set| c.acceptance.contains(set)))
    }
}

impl Display for GeneralizedBuchi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} states, {} acceptance sets",
            self.num_states(),
            self.num_acceptance_sets
        )?;
        write!(f, "initial states:")?;
        for &i in &self.initial_states {
            write!(f, " g{}", self.states[i].id)?;
        }
        writeln!(f)?;
        for s in self.states.iter() {
            for t in &s.transitions {
                writeln!(
                    f,
                    "  g{} --[{}]{}--> g{}",
                    s.id, t.label, t.acceptance, self.states[t.to].id
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct StateInConstruction {
    id: Option<i32>,
    transitions: Vec<TransitionInConstruction>,
}

#[derive(Debug)]
struct TransitionInConstruction {
    to: GStateId,
    must_hold: LabelSet,
    must_not_hold: LabelSet,
    acceptance: LabelSet,
}

impl StateInConstruction {
    fn new() -> Self {
        StateInConstruction {
            id: None,
            transitions: Vec::new(),
        }
    }
}

///
/// Builder for generalized Büchi automata
/// - T = type of the client's state keys
///
/// Labels and acceptance sets are checked by [build](Self::build).
///
#[derive(Debug)]
pub struct GbaBuilder<T> {
    num_acceptance_sets: u32,
    propositions: Vec<String>,
    id_map: HashMap<T, GStateId>,
    states: Vec<StateInConstruction>,
    initial_states: Vec<GStateId>,
}

impl<T: Eq + Hash + Clone> GbaBuilder<T> {
    fn get_state_index(&mut self, state: &T) -> GStateId {
        match self.id_map.get(state) {
            Some(i) => *i,
            None => {
                let i = self.states.len();
                self.states.push(StateInConstruction::new());
                self.id_map.insert(state.clone(), i);
                i
            }
        }
    }

    ///
    /// Create a builder for an automaton with num_acceptance_sets acceptance sets
    ///
    pub fn new(num_acceptance_sets: u32) -> Self {
        GbaBuilder {
            num_acceptance_sets,
            propositions: Vec::new(),
            id_map: HashMap::new(),
            states: Vec::new(),
            initial_states: Vec::new(),
        }
    }

    ///
    /// Declare an atomic proposition and return its index
    ///
    pub fn add_proposition(&mut self, name: &str) -> u32 {
        self.propositions.push(name.to_string());
        (self.propositions.len() - 1) as u32
    }

    ///
    /// Declare a state (no effect if the state exists)
    ///
    pub fn add_state(&mut self, state: &T) -> &mut Self {
        self.get_state_index(state);
        self
    }

    ///
    /// Set the display id of a state
    ///
    pub fn set_state_id(&mut self, state: &T, id: i32) -> &mut Self {
        let i = self.get_state_index(state);
        self.states[i].id = Some(id);
        self
    }

    ///
    /// Mark a state as initial
    ///
    pub fn mark_initial(&mut self, state: &T) -> &mut Self {
        let i = self.get_state_index(state);
        if !self.initial_states.contains(&i) {
            self.initial_states.push(i);
        }
        self
    }

    ///
    /// Add a transition
    /// - must_hold, must_not_hold = positive and negative literals of the label
    /// - acceptance = acceptance sets the transition belongs to
    ///
    pub fn add_transition(
        &mut self,
        state: &T,
        must_hold: LabelSet,
        must_not_hold: LabelSet,
        acceptance: LabelSet,
        next: &T,
    ) -> &mut Self {
        let i = self.get_state_index(state);
        let to = self.get_state_index(next);
        self.states[i].transitions.push(TransitionInConstruction {
            to,
            must_hold,
            must_not_hold,
            acceptance,
        });
        self
    }

    // check a transition and convert it
    fn make_transition(&self, t: &TransitionInConstruction) -> Result<GTransition, Error> {
        let count = self.propositions.len() as u32;
        for set in [&t.must_hold, &t.must_not_hold] {
            if let Some(index) = set.max_element() {
                if index >= count {
                    return Err(Error::PropositionOutOfRange { index, count });
                }
            }
        }
        if let Some(proposition) = t.must_hold.intersection(&t.must_not_hold).iter().next() {
            return Err(Error::ContradictoryLabel { proposition });
        }
        if let Some(set) = t.acceptance.max_element() {
            if set >= self.num_acceptance_sets {
                return Err(Error::AcceptanceSetOutOfRange {
                    set,
                    count: self.num_acceptance_sets,
                });
            }
        }
        Ok(GTransition {
            to: t.to,
            label: Label::new(t.must_hold.clone(), t.must_not_hold.clone()),
            acceptance: t.acceptance.clone(),
        })
    }

    ///
    /// Construct the automaton
    /// - fails if a label refers to an undeclared proposition
    /// - fails if a label requires a proposition to be both true and false
    /// - fails if a transition belongs to an acceptance set that doesn't exist
    ///
    pub fn build(&self) -> Result<GeneralizedBuchi, Error> {
        let mut states = Vec::with_capacity(self.states.len());
        for (i, s) in self.states.iter().enumerate() {
            let transitions = s
                .transitions
                .iter()
                .map(|t| self.make_transition(t))
                .collect::<Result<Vec<_>, _>>()?;
            states.push(GState {
                index: i,
                id: s.id.unwrap_or(i as i32 + 1),
                transitions,
            });
        }
        Ok(GeneralizedBuchi {
            states: states.into(),
            initial_states: self.initial_states.clone(),
            num_acceptance_sets: self.num_acceptance_sets,
            propositions: self.propositions.clone(),
        })
    }
}
