// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Minimization of Büchi automata
//!
//! Each round of the minimization loop
//! 1) removes transitions that are subsumed by a more general transition to the same target,
//! 2) optionally runs the SCC analysis to remove unreachable states and find the states
//!    whose acceptance marking can change,
//! 3) merges states that have the same transitions.
//!
//! The loop stops after a round that doesn't remove any state.
//!

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::{
    buchi::{BStateId, BuchiAutomaton},
    degeneralize::MinimizeStats,
    registry::StateRegistry,
    scc,
};

///
/// Remove every transition whose label implies the label of another transition of the
/// same state with the same target.
///
/// If two transitions are identical, the first one is removed.
/// Return the number of transitions removed.
///
pub(crate) fn simplify_transitions(registry: &mut StateRegistry) -> usize {
    let mut removed = 0;
    for id in registry.live_states() {
        let transitions = std::mem::take(&mut registry.state_mut(id).transitions);
        let n = transitions.len();
        let mut dropped = vec![false; n];
        for i in 0..n {
            let t = &transitions[i];
            let subsumed = transitions
                .iter()
                .enumerate()
                .any(|(j, t1)| j != i && !dropped[j] && t1.target == t.target && t.label.implies(&t1.label));
            dropped[i] = subsumed;
        }
        let kept: Vec<_> = transitions
            .into_iter()
            .zip(dropped)
            .filter_map(|(t, d)| if d { None } else { Some(t) })
            .collect();
        removed += n - kept.len();
        registry.state_mut(id).transitions = kept;
    }
    removed
}

///
/// Check whether states a and b can be merged:
/// - they are both accepting or both non-accepting, or one of them is acceptance-flexible
/// - they have the same transitions (same target and same label)
///
pub(crate) fn states_match(registry: &StateRegistry, accept: u32, a: BStateId, b: BStateId) -> bool {
    let sa = registry.state(a);
    let sb = registry.state(b);
    if (sa.counter == accept) != (sb.counter == accept) && !sa.is_flexible() && !sb.is_flexible() {
        return false;
    }
    sa.transitions.iter().all(|t| sb.transitions.contains(t))
        && sb.transitions.iter().all(|t| sa.transitions.contains(t))
}

// give a fresh display id to states that have the same id and counter as an older state
fn disambiguate(automaton: &mut BuchiAutomaton) {
    let BuchiAutomaton {
        registry,
        next_identity,
        ..
    } = automaton;
    let ids: Vec<BStateId> = registry.live_states().into_iter().rev().collect();
    for (i, &s) in ids.iter().enumerate() {
        for &s2 in &ids[i + 1..] {
            let (a, b) = (registry.state(s), registry.state(s2));
            if a.identity_id == b.identity_id && a.counter == b.counter {
                *next_identity += 1;
                trace!(state = s, id = *next_identity, "fresh display id");
                registry.state_mut(s).identity_id = *next_identity;
            }
        }
    }
}

///
/// Remove dead states and merge equivalent states
///
/// States are visited from the most recent to the oldest. A state is merged into
/// the first older state that matches it. If that state is acceptance-flexible, it
/// takes the acceptance marking and SCC status of the state merged into it.
///
/// Return the number of states removed.
///
pub(crate) fn simplify_states(automaton: &mut BuchiAutomaton) -> usize {
    let accept = automaton.accept;
    let registry = &mut automaton.registry;
    let order: Vec<BStateId> = registry.live_states().into_iter().rev().collect();
    let mut removed = 0;

    for (i, &s) in order.iter().enumerate() {
        if registry.state(s).transitions.is_empty() {
            trace!(state = s, "dead state removed");
            registry.tombstone(s, None);
            removed += 1;
            continue;
        }
        let reg = &*registry;
        let partner = order[i + 1..]
            .iter()
            .copied()
            .find(|&s1| reg.is_live(s1) && states_match(reg, accept, s, s1));
        if let Some(s1) = partner {
            let (counter, scc) = {
                let st = registry.state(s);
                (st.counter, st.scc)
            };
            let kept = registry.state_mut(s1);
            if kept.is_flexible() {
                kept.counter = counter;
                kept.scc = scc;
            }
            trace!(state = s, into = s1, "state merged");
            registry.tombstone(s, Some(s1));
            removed += 1;
        }
    }
    removed += registry.retarget_all(None);

    automaton.refresh_initial();
    if automaton.initial.is_none() {
        // nothing is reachable anymore
        let registry = &mut automaton.registry;
        for id in registry.live_states() {
            registry.tombstone(id, None);
            removed += 1;
        }
        registry.free_tombstones();
    }

    disambiguate(automaton);
    removed
}

///
/// Minimization loop
///
pub(crate) fn minimize(automaton: &mut BuchiAutomaton, scc_refinement: bool) -> MinimizeStats {
    let mut stats = MinimizeStats::default();
    debug!(
        states = automaton.num_states(),
        transitions = automaton.num_transitions(),
        scc_refinement,
        "minimizing"
    );
    loop {
        let start = Instant::now();
        stats.rounds += 1;
        let transitions = simplify_transitions(&mut automaton.registry);
        let mut states = 0;
        if scc_refinement {
            states += scc::analyze(&mut automaton.registry, automaton.initial);
            automaton.registry.free_tombstones();
            automaton.refresh_initial();
        }
        states += simplify_states(automaton);
        stats.transitions_removed += transitions;
        stats.states_removed += states;
        info!(
            round = stats.rounds,
            transitions_removed = transitions,
            states_removed = states,
            states = automaton.num_states(),
            transitions = automaton.num_transitions(),
            elapsed = ?start.elapsed(),
            "simplification round"
        );
        if states == 0 {
            break;
        }
    }
    stats
}
