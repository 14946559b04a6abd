// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end degeneralization scenarios: GBA in, never claim out.

use buchi_degen::{
    buchi::{SccStatus, INITIAL_ID},
    degeneralize::{build, degeneralize, Options},
    export::{write_never_claim, ExportOptions},
    generalized::GbaBuilder,
    label_sets::LabelSet,
    lasso::Lasso,
};

fn set(elements: &[u32]) -> LabelSet {
    elements.iter().copied().collect()
}

fn never_claim(buchi: &buchi_degen::buchi::BuchiAutomaton, formula: &str) -> String {
    let mut out = Vec::new();
    write_never_claim(&mut out, buchi, &ExportOptions::with_formula(formula)).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn accepting_self_loop() {
    // one state, one acceptance set, unconditional accepting self-loop
    let mut builder = GbaBuilder::new(1);
    builder
        .mark_initial(&"g")
        .add_transition(&"g", set(&[]), set(&[]), set(&[0]), &"g");
    let gba = builder.build().unwrap();

    let buchi = degeneralize(&gba, &Options::default());
    println!("{}", buchi);
    assert_eq!(buchi.num_states(), 1);
    let s = buchi.initial_state().unwrap();
    assert_eq!(s.identity_id(), INITIAL_ID);
    assert_eq!(s.counter(), buchi.num_acceptance_sets());
    assert!(buchi.is_accepting(s));
    assert!(!s.is_flexible());
    assert_eq!(s.scc_status(), SccStatus::Rigid);

    let text = never_claim(&buchi, "G true");
    println!("{}", text);
    assert_eq!(
        text,
        "never { /* G true */\n\
         accept_init:\n\
         \tif\n\
         \t:: (1) -> goto accept_init\n\
         \tfi;\n\
         }\n"
    );
}

#[test]
fn no_initial_state() {
    let mut builder = GbaBuilder::new(1);
    builder.add_proposition("p");
    builder.add_transition(&0, set(&[0]), set(&[]), set(&[0]), &0);
    let gba = builder.build().unwrap();

    // construction alone: the initial state without transitions
    let raw = build(&gba, &Options::default());
    assert_eq!(raw.num_states(), 1);
    assert!(raw.initial_state().unwrap().transitions().is_empty());

    let buchi = degeneralize(&gba, &Options::default());
    assert!(buchi.is_empty());
    assert_eq!(buchi.to_string(), "empty automaton, refuses all words\n");
    assert_eq!(
        never_claim(&buchi, "false"),
        "never {    /* false */\nT0_init:\n\tfalse;\n}\n"
    );
    assert!(!buchi.accepts_lasso(&Lasso::new(vec![], vec![set(&[0])])));
}

#[test]
fn equivalent_states_are_merged() {
    //   g0 --p--> g1, g0 --!p--> g2, g1 --true--> g3, g2 --true--> g3, g3 --true {0}--> g3
    // g1 and g2 have the same transitions and the same acceptance status
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

    let options = Options::default().with_on_the_fly(false);
    let mut buchi = build(&gba, &options);
    assert_eq!(buchi.num_states(), 5);
    let stats = buchi.minimize(true);
    println!("{}", buchi);
    assert_eq!(stats.states_removed, 3);
    assert_eq!(buchi.num_states(), 2);

    // both transitions of the initial state go to the surviving state
    let init = buchi.initial_state().unwrap();
    let targets: Vec<usize> = init.transitions().iter().map(|t| t.target()).collect();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0], targets[1]);
    assert!(buchi.contains(targets[0]));

    assert_eq!(
        never_claim(&buchi, "X G true"),
        "never { /* X G true */\n\
         T0_init:\n\
         \tif\n\
         \t:: (!p) || (p) -> goto accept_S3\n\
         \tfi;\n\
         accept_S3:\n\
         \tif\n\
         \t:: (1) -> goto accept_S3\n\
         \tfi;\n\
         }\n"
    );

    // same language as the GBA
    for w in [
        Lasso::new(vec![], vec![set(&[])]),
        Lasso::new(vec![set(&[0])], vec![set(&[0]), set(&[])]),
    ] {
        assert!(gba.accepts_lasso(&w));
        assert!(buchi.accepts_lasso(&w));
    }
}

#[test]
fn generalized_acceptance() {
    // G F a && G F b
    let mut builder = GbaBuilder::new(2);
    let a = builder.add_proposition("a");
    let b = builder.add_proposition("b");
    builder
        .mark_initial(&0)
        .add_transition(&0, set(&[a, b]), set(&[]), set(&[0, 1]), &0)
        .add_transition(&0, set(&[a]), set(&[b]), set(&[0]), &0)
        .add_transition(&0, set(&[b]), set(&[a]), set(&[1]), &0)
        .add_transition(&0, set(&[]), set(&[a, b]), set(&[]), &0);
    let gba = builder.build().unwrap();
    let buchi = degeneralize(&gba, &Options::default());
    println!("{}", buchi);
    println!("{}", never_claim(&buchi, "G F a && G F b"));

    for s in buchi.states() {
        assert!(s.counter() <= 2);
    }
    let words = [
        (Lasso::new(vec![], vec![set(&[0]), set(&[1])]), true),
        (Lasso::new(vec![], vec![set(&[0, 1])]), true),
        (Lasso::new(vec![set(&[0, 1])], vec![set(&[0])]), false),
        (Lasso::new(vec![], vec![set(&[]), set(&[1]), set(&[]), set(&[0])]), true),
        (Lasso::new(vec![], vec![set(&[])]), false),
    ];
    for (w, expected) in &words {
        assert_eq!(gba.accepts_lasso(w), *expected);
        assert_eq!(buchi.accepts_lasso(w), *expected);
    }
}
