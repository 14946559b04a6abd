// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for degeneralization and minimization.
//!
//! Random small generalized Büchi automata are converted with every combination of
//! options, then checked for:
//!
//! 1. **Language preservation**: the GBA and the Büchi automaton accept the same
//!    lasso words, before and after minimization
//! 2. **Idempotence**: minimizing a minimized automaton removes nothing
//! 3. **Well-formedness**: counters are in [0, k] and every transition goes to a state
//!    of the automaton
//! 4. **Unique names**: no two states share a display id and a counter after minimization

use buchi_degen::{
    buchi::BuchiAutomaton,
    degeneralize::{build, degeneralize, Options},
    generalized::{GbaBuilder, GeneralizedBuchi},
    label_sets::LabelSet,
    lasso::Lasso,
};
use proptest::prelude::*;

const NUM_PROPOSITIONS: u32 = 2;

// transition = (source, literal per proposition, acceptance bits, target)
// literal: 0 = absent, 1 = positive, 2 = negative
type TransitionShape = (usize, Vec<u8>, u32, usize);

#[derive(Debug, Clone)]
struct GbaShape {
    states: usize,
    sets: u32,
    initial: Vec<usize>,
    transitions: Vec<TransitionShape>,
}

fn arb_gba() -> impl Strategy<Value = GbaShape> {
    (1usize..=4, 0u32..=2).prop_flat_map(|(states, sets)| {
        let transition = (
            0..states,
            prop::collection::vec(0u8..3, NUM_PROPOSITIONS as usize),
            0u32..(1u32 << sets),
            0..states,
        );
        (
            prop::collection::vec(0..states, 0..=2),
            prop::collection::vec(transition, 0..=10),
        )
            .prop_map(move |(initial, transitions)| GbaShape {
                states,
                sets,
                initial,
                transitions,
            })
    })
}

fn arb_valuation() -> impl Strategy<Value = LabelSet> {
    (0u32..(1u32 << NUM_PROPOSITIONS)).prop_map(|mask| (0..NUM_PROPOSITIONS).filter(|b| mask & (1u32 << b) != 0).collect())
}

fn arb_lasso() -> impl Strategy<Value = Lasso> {
    (
        prop::collection::vec(arb_valuation(), 0..=2),
        prop::collection::vec(arb_valuation(), 1..=3),
    )
        .prop_map(|(prefix, cycle)| Lasso::new(prefix, cycle))
}

fn make_gba(shape: &GbaShape) -> GeneralizedBuchi {
    let mut builder = GbaBuilder::new(shape.sets);
    for i in 0..NUM_PROPOSITIONS {
        builder.add_proposition(&format!("p{}", i));
    }
    for s in 0..shape.states {
        builder.add_state(&s);
    }
    for i in &shape.initial {
        builder.mark_initial(i);
    }
    for (from, literals, bits, to) in &shape.transitions {
        let mut must_hold = LabelSet::new();
        let mut must_not_hold = LabelSet::new();
        for (p, l) in literals.iter().enumerate() {
            match l {
                1 => must_hold.insert(p as u32),
                2 => must_not_hold.insert(p as u32),
                _ => (),
            }
        }
        let acceptance: LabelSet = (0..shape.sets).filter(|b| *bits & (1u32 << b) != 0).collect();
        builder.add_transition(from, must_hold, must_not_hold, acceptance, to);
    }
    builder.build().unwrap()
}

fn all_options() -> Vec<Options> {
    let mut result = Vec::new();
    for on_the_fly in [false, true] {
        for scc_refinement in [false, true] {
            result.push(
                Options::default()
                    .with_on_the_fly(on_the_fly)
                    .with_scc_refinement(scc_refinement),
            );
        }
    }
    result
}

fn check_well_formed(buchi: &BuchiAutomaton) -> Result<(), TestCaseError> {
    let k = buchi.num_acceptance_sets();
    for s in buchi.states() {
        prop_assert!(s.counter() <= k, "counter {} out of range", s.counter());
        prop_assert_eq!(buchi.is_accepting(s), s.counter() == k);
        for t in s.transitions() {
            prop_assert!(buchi.contains(t.target()), "dangling transition to {}", t.target());
        }
    }
    if !buchi.is_empty() {
        prop_assert!(buchi.initial_state().is_some());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn construction_preserves_language(
        shape in arb_gba(),
        words in prop::collection::vec(arb_lasso(), 1..=8)
    ) {
        let gba = make_gba(&shape);
        for on_the_fly in [false, true] {
            let buchi = build(&gba, &Options::default().with_on_the_fly(on_the_fly));
            check_well_formed(&buchi)?;
            for w in &words {
                prop_assert_eq!(
                    gba.accepts_lasso(w),
                    buchi.accepts_lasso(w),
                    "on_the_fly = {}, word = {:?}\n{}\n{}", on_the_fly, w, gba, buchi
                );
            }
        }
    }

    #[test]
    fn minimization_preserves_language(
        shape in arb_gba(),
        words in prop::collection::vec(arb_lasso(), 1..=8)
    ) {
        let gba = make_gba(&shape);
        for options in all_options() {
            let buchi = degeneralize(&gba, &options);
            check_well_formed(&buchi)?;
            for w in &words {
                prop_assert_eq!(
                    gba.accepts_lasso(w),
                    buchi.accepts_lasso(w),
                    "options = {:?}, word = {:?}\n{}\n{}", options, w, gba, buchi
                );
            }
        }
    }

    #[test]
    fn minimization_is_idempotent(shape in arb_gba()) {
        let gba = make_gba(&shape);
        for options in all_options() {
            let mut buchi = degeneralize(&gba, &options);
            let states = buchi.num_states();
            let transitions = buchi.num_transitions();
            let stats = buchi.minimize(options.scc_refinement);
            prop_assert_eq!(stats.states_removed, 0);
            prop_assert_eq!(stats.transitions_removed, 0);
            prop_assert_eq!(buchi.num_states(), states);
            prop_assert_eq!(buchi.num_transitions(), transitions);
        }
    }

    #[test]
    fn minimized_names_are_unique(shape in arb_gba()) {
        let gba = make_gba(&shape);
        for options in all_options() {
            let buchi = degeneralize(&gba, &options);
            let names: Vec<(i32, u32)> = buchi.states().map(|s| (s.identity_id(), s.counter())).collect();
            for (i, x) in names.iter().enumerate() {
                prop_assert!(!names[i + 1..].contains(x), "duplicate name {:?}", x);
            }
        }
    }

    #[test]
    fn minimization_never_grows(shape in arb_gba()) {
        let gba = make_gba(&shape);
        let mut buchi = build(&gba, &Options::default());
        let before = buchi.num_states();
        buchi.minimize(true);
        prop_assert!(buchi.num_states() <= before);
        check_well_formed(&buchi)?;
    }
}
