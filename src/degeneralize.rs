// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Degeneralization: conversion of a generalized Büchi automaton to a Büchi automaton
//!
//! The states of the Büchi automaton are pairs (GBA state, counter) where the counter
//! tracks progress through the acceptance sets. They are built on the fly, starting from
//! a synthetic initial state, and only reachable states are constructed.
//!
//! With [Options::on_the_fly], the construction also removes redundant transitions and
//! merges a new state into an existing one when both have exactly the same transitions.
//! With [Options::simplify], the result is then minimized (see [BuchiAutomaton::minimize]).
//!
//! # Example
//!
//! ```
//! use buchi_degen::degeneralize::{degeneralize, Options};
//! use buchi_degen::generalized::GbaBuilder;
//! use buchi_degen::label_sets::LabelSet;
//!
//! // G F p
//! let mut builder = GbaBuilder::new(1);
//! let p = builder.add_proposition("p");
//! builder
//!     .mark_initial(&0)
//!     .add_transition(&0, LabelSet::singleton(p), LabelSet::new(), LabelSet::singleton(0), &0)
//!     .add_transition(&0, LabelSet::new(), LabelSet::singleton(p), LabelSet::new(), &0);
//! let gba = builder.build().unwrap();
//!
//! let buchi = degeneralize(&gba, &Options::default());
//! assert_eq!(buchi.num_states(), 2);
//! ```
//!

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    acceptance::{next_counter, restart},
    buchi::{BStateId, BTransition, BuchiAutomaton, INITIAL_ID},
    generalized::{GTransition, GeneralizedBuchi},
    label_sets::Label,
    registry::StateRegistry,
    simplify,
};

///
/// Switches of the degeneralization pipeline
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Remove subsumed transitions and merge identical states during construction
    pub on_the_fly: bool,
    /// Run the minimization loop after construction
    pub simplify: bool,
    /// Use the SCC analysis in each minimization round
    pub scc_refinement: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            on_the_fly: true,
            simplify: true,
            scc_refinement: true,
        }
    }
}

impl Options {
    /// Set the on_the_fly switch
    pub fn with_on_the_fly(mut self, on_the_fly: bool) -> Self {
        self.on_the_fly = on_the_fly;
        self
    }

    /// Set the simplify switch
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Set the scc_refinement switch
    pub fn with_scc_refinement(mut self, scc_refinement: bool) -> Self {
        self.scc_refinement = scc_refinement;
        self
    }
}

///
/// Statistics about the construction
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Finalized states, including the initial state
    pub states: usize,
    /// Transitions of the finalized states when they were finalized
    pub transitions: usize,
    /// States merged into an identical state on the fly
    pub merged: usize,
    /// States without transitions, removed on the fly
    pub dead: usize,
    /// States destroyed before exploration because nothing referred to them
    pub unexplored: usize,
    /// States that lost all their transitions when references to removed states were deleted
    pub cascaded: usize,
}

///
/// Statistics about minimization
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MinimizeStats {
    /// Number of rounds of the minimization loop
    pub rounds: usize,
    /// Total number of transitions removed
    pub transitions_removed: usize,
    /// Total number of states removed
    pub states_removed: usize,
}

// Construction context: owns the registry until the automaton is complete
#[derive(Debug)]
struct Construction<'a> {
    gba: &'a GeneralizedBuchi,
    options: &'a Options,
    registry: StateRegistry,
    accept: u32,
    stats: BuildStats,
}

impl<'a> Construction<'a> {
    fn new(gba: &'a GeneralizedBuchi, options: &'a Options) -> Self {
        Construction {
            gba,
            options,
            registry: StateRegistry::new(),
            accept: gba.num_acceptance_sets(),
            stats: BuildStats::default(),
        }
    }

    // state reached by a GBA transition from a state with counter start
    fn successor(&mut self, t: &GTransition, start: u32) -> BStateId {
        let fin = next_counter(t.acceptance(), start, self.accept);
        let to = t.to();
        self.registry.resolve(to, self.gba.state(to).id(), fin)
    }

    //
    // Add a transition from -> target, in front of the existing transitions.
    // In on-the-fly mode, existing transitions to the same target that are at least
    // as restrictive are removed, and the new transition is dropped if an existing
    // transition to the same target is more general.
    //
    fn add_transition(&mut self, from: BStateId, target: BStateId, label: &Label) {
        let mut transitions = std::mem::take(&mut self.registry.state_mut(from).transitions);
        let mut redundant = false;
        if self.options.on_the_fly {
            let before = transitions.len();
            transitions.retain(|t1| !(t1.target == target && t1.label.implies(label)));
            let removed = (before - transitions.len()) as u32;
            self.registry.state_mut(target).incoming -= removed;
            redundant = transitions
                .iter()
                .any(|t1| t1.target == target && label.implies(&t1.label));
        }
        if !redundant {
            transitions.insert(0, BTransition::new(target, label.clone()));
            self.registry.state_mut(target).incoming += 1;
        }
        self.registry.state_mut(from).transitions = transitions;
    }

    // create the initial state and its transitions
    fn build_initial(&mut self) -> BStateId {
        let init = self.registry.add_initial(INITIAL_ID, 0);
        let gba = self.gba;
        for &g in gba.initial_states() {
            for t in gba.state(g).transitions() {
                let target = self.successor(t, 0);
                self.add_transition(init, target, t.label());
            }
        }
        self.stats.states += 1;
        self.stats.transitions += self.registry.state(init).transitions.len();
        init
    }

    // build the transitions of a pending state then finalize it, merge it, or remove it
    fn make_transitions(&mut self, id: BStateId) {
        let gba = self.gba;
        let (source, counter) = {
            let s = self.registry.state(id);
            (s.source.expect("pending states have a source"), s.counter)
        };
        let start = restart(counter, self.accept);
        for t in gba.state(source).transitions() {
            let target = self.successor(t, start);
            self.add_transition(id, target, t.label());
        }

        if self.options.on_the_fly {
            if self.registry.state(id).transitions.is_empty() {
                trace!(state = id, "dead state");
                self.registry.tombstone(id, None);
                self.stats.dead += 1;
                return;
            }
            let accept = self.accept;
            let registry = &self.registry;
            let partner = registry
                .finalized()
                .iter()
                .copied()
                .find(|&s1| simplify::states_match(registry, accept, id, s1));
            if let Some(s1) = partner {
                trace!(state = id, into = s1, "state merged on the fly");
                let targets: Vec<BStateId> = registry.state(id).transitions.iter().map(|t| t.target).collect();
                for t in targets {
                    self.registry.state_mut(t).incoming -= 1;
                }
                self.registry.tombstone(id, Some(s1));
                self.stats.merged += 1;
                return;
            }
        }

        self.stats.states += 1;
        self.stats.transitions += self.registry.state(id).transitions.len();
        self.registry.finalize(id);
    }

    // explore all reachable states
    fn run(&mut self) -> BStateId {
        let init = self.build_initial();
        while let Some(id) = self.registry.pop_pending() {
            if self.registry.state(id).incoming == 0 {
                trace!(state = id, "unreferenced state destroyed");
                self.registry.destroy(id);
                self.stats.unexplored += 1;
                continue;
            }
            self.make_transitions(id);
        }
        debug!(tombstones = self.registry.num_tombstones(), "retargeting");
        self.stats.cascaded = self.registry.retarget_all(Some(init));
        init
    }
}

///
/// Build the Büchi automaton equivalent to a generalized Büchi automaton
///
/// Only the construction runs here: the result is not minimized, even if
/// options.simplify is true.
///
pub fn build(gba: &GeneralizedBuchi, options: &Options) -> BuchiAutomaton {
    let start = Instant::now();
    debug!(
        states = gba.num_states(),
        acceptance_sets = gba.num_acceptance_sets(),
        ?options,
        "building the Büchi automaton"
    );

    let mut construction = Construction::new(gba, options);
    let init = construction.run();
    let Construction {
        registry,
        accept,
        stats,
        ..
    } = construction;

    info!(
        states = stats.states,
        transitions = stats.transitions,
        elapsed = ?start.elapsed(),
        "Büchi automaton built"
    );
    debug!(?stats, "construction statistics");

    let automaton = BuchiAutomaton::new(
        registry,
        init,
        accept,
        gba.max_state_id(),
        gba.propositions().to_vec(),
        stats,
    );
    trace!("Büchi automaton before simplification\n{}", automaton);
    automaton
}

///
/// Degeneralize then minimize if options.simplify is set
///
pub fn degeneralize(gba: &GeneralizedBuchi, options: &Options) -> BuchiAutomaton {
    let mut automaton = build(gba, options);
    if options.simplify {
        automaton.minimize(options.scc_refinement);
        trace!("Büchi automaton after simplification\n{}", automaton);
    }
    automaton
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{generalized::GbaBuilder, label_sets::LabelSet};

    fn set(elements: &[u32]) -> LabelSet {
        elements.iter().copied().collect()
    }

    fn no_simplification() -> Options {
        Options::default().with_simplify(false)
    }

    //
    // GBA with one initial state g and an accepting self-loop: g --true {0}--> g
    //
    fn accepting_loop() -> GeneralizedBuchi {
        let mut builder = GbaBuilder::new(1);
        builder
            .mark_initial(&"g")
            .add_transition(&"g", set(&[]), set(&[]), set(&[0]), &"g");
        builder.build().unwrap()
    }

    #[test]
    fn test_options() {
        let o = Options::default();
        assert!(o.on_the_fly && o.simplify && o.scc_refinement);
        let o = o.with_on_the_fly(false).with_scc_refinement(false);
        assert!(!o.on_the_fly && o.simplify && !o.scc_refinement);

        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(json, r#"{"on_the_fly":false,"simplify":true,"scc_refinement":false}"#);
        let back: Options = serde_json::from_str(r#"{"simplify":false}"#).unwrap();
        assert_eq!(back, Options::default().with_simplify(false));
    }

    #[test]
    fn test_accepting_loop() {
        let gba = accepting_loop();
        let buchi = build(&gba, &no_simplification());
        println!("{}", buchi);

        // init --true--> (g, 1) --true--> (g, 1)
        assert_eq!(buchi.num_states(), 2);
        assert_eq!(buchi.num_transitions(), 2);
        let init = buchi.initial_state().unwrap();
        assert_eq!(init.identity_id(), INITIAL_ID);
        assert_eq!(init.counter(), 0);
        assert!(!buchi.is_accepting(init));
        let next = buchi.target(&init.transitions()[0]);
        assert_eq!(next.counter(), 1);
        assert!(buchi.is_accepting(next));
        assert_eq!(next.transitions()[0].target(), next.id());
        assert_eq!(buchi.build_stats().states, 2);
    }

    #[test]
    fn test_no_initial_state() {
        let mut builder: GbaBuilder<u32> = GbaBuilder::new(1);
        builder.add_transition(&0, set(&[]), set(&[]), set(&[0]), &0);
        let gba = builder.build().unwrap();
        let buchi = build(&gba, &Options::default());
        assert_eq!(buchi.num_states(), 1);
        assert!(buchi.initial_state().unwrap().transitions().is_empty());
    }

    //
    // g0 --p0--> g1, g0 --true--> g1, g1 --true {0}--> g1
    // on the fly: the transition on p0 is subsumed by the transition on true
    //
    #[test]
    fn test_subsumption() {
        let mut builder = GbaBuilder::new(1);
        let p = builder.add_proposition("p");
        builder
            .mark_initial(&0)
            .add_transition(&0, set(&[p]), set(&[]), set(&[]), &1)
            .add_transition(&0, set(&[]), set(&[]), set(&[]), &1)
            .add_transition(&1, set(&[]), set(&[]), set(&[0]), &1);
        let gba = builder.build().unwrap();

        let buchi = build(&gba, &no_simplification());
        let init = buchi.initial_state().unwrap();
        assert_eq!(init.transitions().len(), 1);
        assert!(init.transitions()[0].label().is_true());

        let buchi = build(&gba, &no_simplification().with_on_the_fly(false));
        let init = buchi.initial_state().unwrap();
        assert_eq!(init.transitions().len(), 2);
    }

    #[test]
    fn test_transition_order() {
        // g0 --a {0}--> g0, g0 --b {0}--> g0: the last transition built comes first
        let mut builder = GbaBuilder::new(1);
        let a = builder.add_proposition("a");
        let b = builder.add_proposition("b");
        builder
            .mark_initial(&0)
            .add_transition(&0, set(&[a]), set(&[]), set(&[0]), &0)
            .add_transition(&0, set(&[b]), set(&[]), set(&[0]), &0);
        let gba = builder.build().unwrap();
        let buchi = build(&gba, &no_simplification());
        println!("{}", buchi);
        for s in buchi.states() {
            let labels: Vec<&LabelSet> = s.transitions().iter().map(|t| t.label().must_hold()).collect();
            assert_eq!(labels, vec![&set(&[b]), &set(&[a])]);
        }
    }

    //
    // Two states with identical transitions to g3:
    //   g0 --p--> g1, g0 --!p--> g2, g1 --true--> g3, g2 --true--> g3, g3 --true {0}--> g3
    // (g1, 0) is merged into (g2, 0) on the fly
    //
    #[test]
    fn test_on_the_fly_merge() {
        let mut builder = GbaBuilder::new(1);
        let p = builder.add_proposition("p");
        builder
            .mark_initial(&0)
            .add_transition(&0, set(&[p]), set(&[]), set(&[]), &1)
            .add_transition(&0, set(&[]), set(&[p]), set(&[]), &2)
            .add_transition(&1, set(&[]), set(&[]), set(&[]), &3)
            .add_transition(&2, set(&[]), set(&[]), set(&[]), &3)
            .add_transition(&3, set(&[]), set(&[]), set(&[0]), &3);
        let gba = builder.build().unwrap();

        let buchi = build(&gba, &no_simplification());
        println!("{}", buchi);
        assert_eq!(buchi.build_stats().merged, 1);
        let init = buchi.initial_state().unwrap();
        assert_eq!(init.transitions().len(), 2);
        assert_eq!(init.transitions()[0].target(), init.transitions()[1].target());

        let unmerged = build(&gba, &no_simplification().with_on_the_fly(false));
        assert_eq!(unmerged.num_states(), buchi.num_states() + 1);
    }

    //
    // g0 --true--> g1, g0 --true {0}--> g0, g1 has no transitions
    // (g1, 0) is dead and the transition to it is removed
    //
    #[test]
    fn test_dead_state() {
        let mut builder = GbaBuilder::new(1);
        builder
            .mark_initial(&0)
            .add_transition(&0, set(&[]), set(&[]), set(&[]), &1)
            .add_transition(&0, set(&[]), set(&[]), set(&[0]), &0)
            .add_state(&1);
        let gba = builder.build().unwrap();
        let buchi = build(&gba, &no_simplification());
        println!("{}", buchi);
        assert_eq!(buchi.build_stats().dead, 1);
        for s in buchi.states() {
            for t in s.transitions() {
                assert!(buchi.contains(t.target()));
                assert_eq!(buchi.target(t).source_state(), Some(0));
            }
        }
    }

    #[test]
    fn test_degeneralize() {
        let gba = accepting_loop();
        let buchi = degeneralize(&gba, &Options::default());
        assert_eq!(buchi.num_states(), 1);
        let init = buchi.initial_state().unwrap();
        assert!(buchi.is_accepting(init));
        assert_eq!(init.transitions()[0].target(), init.id());
    }
}
