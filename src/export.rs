// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Output formats for Büchi automata
//!
//! - [NeverClaim]: Promela never claim for the SPIN model checker
//! - [BuchiDocument]: JSON document listing the states and transitions
//! - [DotGraph]: graph in the dot language of Graphviz
//!
//! States are named by their acceptance status and display id: `accept_S<id>` for
//! accepting states, `T<counter>_S<id>` for the others, `accept_init` or
//! `T<counter>_init` for the initial state, and `accept_all` for an accepting state
//! with display id 0.
//!
//! Labels are rendered as conjunctions of literals in proposition order: a positive
//! literal is the proposition name, a negative literal is `!name`, and the literals
//! are separated by ` && `. The empty conjunction is `1`.
//!

use std::{fmt::Display, io::Write};

use serde::{Deserialize, Serialize};

use crate::{
    buchi::{BState, BuchiAutomaton, ACCEPT_ALL_ID, INITIAL_ID},
    errors::Error,
    label_sets::{Label, LabelSet},
};

///
/// Export settings
/// - formula: text written in the comment of the never-claim header
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Formula the automaton was built from
    pub formula: String,
}

impl ExportOptions {
    /// Export options with the given formula
    pub fn with_formula(formula: &str) -> Self {
        ExportOptions {
            formula: formula.to_string(),
        }
    }
}

// name of proposition i
fn proposition_name(propositions: &[String], i: u32) -> String {
    match propositions.get(i as usize) {
        Some(name) => name.clone(),
        None => format!("p{}", i),
    }
}

// conjunction of literals
fn conjunction(label: &Label, propositions: &[String]) -> String {
    if label.is_true() {
        return "1".to_string();
    }
    let literals: Vec<String> = label
        .literals()
        .map(|(i, positive)| {
            let name = proposition_name(propositions, i);
            if positive {
                name
            } else {
                format!("!{}", name)
            }
        })
        .collect();
    literals.join(" && ")
}

fn is_accept_all(automaton: &BuchiAutomaton, s: &BState) -> bool {
    s.identity_id() == ACCEPT_ALL_ID && automaton.is_accepting(s)
}

// label of a state in the never claim and dot graph
fn state_name(automaton: &BuchiAutomaton, s: &BState) -> String {
    if is_accept_all(automaton, s) {
        return "accept_all".to_string();
    }
    let prefix = if automaton.is_accepting(s) {
        "accept".to_string()
    } else {
        format!("T{}", s.counter())
    };
    if s.identity_id() == INITIAL_ID {
        format!("{}_init", prefix)
    } else {
        format!("{}_S{}", prefix, s.identity_id())
    }
}

///
/// Promela never claim
///
/// Transitions of a state that go to states with the same name are grouped in a
/// single guard: `:: (a) || (b) -> goto target`.
///
/// An accepting state with display id 0 accepts everything: it's written last as
/// `accept_all: skip`.
///
#[derive(Debug)]
pub struct NeverClaim<'a> {
    automaton: &'a BuchiAutomaton,
    formula: &'a str,
}

impl<'a> NeverClaim<'a> {
    /// Never claim for an automaton, with options.formula in the header
    pub fn new(automaton: &'a BuchiAutomaton, options: &'a ExportOptions) -> Self {
        NeverClaim {
            automaton,
            formula: &options.formula,
        }
    }

    fn write_state(&self, f: &mut std::fmt::Formatter<'_>, s: &BState) -> std::fmt::Result {
        let a = self.automaton;
        writeln!(f, "{}:", state_name(a, s))?;
        if s.transitions().is_empty() {
            return writeln!(f, "\tfalse;");
        }
        // group guards by target name, in order of first occurrence
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for t in s.transitions() {
            let target = state_name(a, a.target(t));
            let guard = conjunction(t.label(), a.propositions());
            match groups.iter_mut().find(|(name, _)| *name == target) {
                Some((_, guards)) => guards.push(guard),
                None => groups.push((target, vec![guard])),
            }
        }
        writeln!(f, "\tif")?;
        for (target, guards) in &groups {
            writeln!(f, "\t:: ({}) -> goto {}", guards.join(") || ("), target)?;
        }
        writeln!(f, "\tfi;")
    }
}

impl<'a> Display for NeverClaim<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let a = self.automaton;
        if a.is_empty() {
            writeln!(f, "never {{    /* {} */", self.formula)?;
            writeln!(f, "T0_init:")?;
            writeln!(f, "\tfalse;")?;
            return writeln!(f, "}}");
        }
        if a.num_states() == 1 && a.states().all(|s| s.identity_id() == ACCEPT_ALL_ID) {
            writeln!(f, "never {{    /* {} */", self.formula)?;
            writeln!(f, "accept_init:")?;
            writeln!(f, "\tif")?;
            writeln!(f, "\t:: (1) -> goto accept_init")?;
            writeln!(f, "\tfi;")?;
            return writeln!(f, "}}");
        }

        writeln!(f, "never {{ /* {} */", self.formula)?;
        let mut accept_all = false;
        for s in a.states() {
            if is_accept_all(a, s) {
                accept_all = true;
                continue;
            }
            self.write_state(f, s)?;
        }
        if accept_all {
            writeln!(f, "accept_all:")?;
            writeln!(f, "\tskip")?;
        }
        writeln!(f, "}}")
    }
}

/// State in a [BuchiDocument]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Display id
    pub id: i32,
    /// Acceptance counter
    #[serde(rename = "final")]
    pub counter: u32,
    /// Whether the state is accepting
    pub accepting: bool,
    /// Name used in the never claim
    pub name: String,
}

/// Literals of a label in a [BuchiDocument]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Propositions that must be true
    pub pos: Vec<String>,
    /// Propositions that must be false
    pub neg: Vec<String>,
}

/// Transition in a [BuchiDocument]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Display id of the source state
    pub from: i32,
    /// Display id of the target state
    pub to: i32,
    /// Label
    pub conditions: Conditions,
}

///
/// Structured description of an automaton
///
/// States are listed with the initial state first.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuchiDocument {
    /// All states
    pub states: Vec<StateEntry>,
    /// All transitions
    pub transitions: Vec<TransitionEntry>,
}

impl BuchiDocument {
    /// Build the document for an automaton
    pub fn new(automaton: &BuchiAutomaton) -> Self {
        let props = automaton.propositions();
        let names = |set: &LabelSet| -> Vec<String> {
            set.iter().map(|i| proposition_name(props, i)).collect()
        };
        let mut states = Vec::new();
        let mut transitions = Vec::new();
        for s in automaton.states() {
            states.push(StateEntry {
                id: s.identity_id(),
                counter: s.counter(),
                accepting: automaton.is_accepting(s),
                name: state_name(automaton, s),
            });
            for t in s.transitions() {
                transitions.push(TransitionEntry {
                    from: s.identity_id(),
                    to: automaton.target(t).identity_id(),
                    conditions: Conditions {
                        pos: names(t.label().must_hold()),
                        neg: names(t.label().must_not_hold()),
                    },
                });
            }
        }
        BuchiDocument { states, transitions }
    }
}

///
/// Graphviz rendering: one edge per transition
///
/// Transitions out of the `accept_all` state are omitted.
///
#[derive(Debug)]
pub struct DotGraph<'a> {
    automaton: &'a BuchiAutomaton,
}

impl<'a> DotGraph<'a> {
    /// Dot graph of an automaton
    pub fn new(automaton: &'a BuchiAutomaton) -> Self {
        DotGraph { automaton }
    }
}

impl<'a> Display for DotGraph<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let a = self.automaton;
        writeln!(f, "digraph Buchi {{")?;
        for s in a.states() {
            if is_accept_all(a, s) {
                continue;
            }
            let source = state_name(a, s);
            for t in s.transitions() {
                writeln!(
                    f,
                    "\t{} -> {} [label=\"{}\"];",
                    source,
                    state_name(a, a.target(t)),
                    conjunction(t.label(), a.propositions())
                )?;
            }
        }
        writeln!(f, "}}")
    }
}

///
/// Write the never claim of an automaton
///
pub fn write_never_claim<W: Write>(
    out: &mut W,
    automaton: &BuchiAutomaton,
    options: &ExportOptions,
) -> Result<(), Error> {
    write!(out, "{}", NeverClaim::new(automaton, options))?;
    Ok(())
}

///
/// Write the JSON document of an automaton
///
pub fn write_json<W: Write>(out: &mut W, automaton: &BuchiAutomaton) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *out, &BuchiDocument::new(automaton))?;
    writeln!(out)?;
    Ok(())
}

///
/// Write the dot graph of an automaton
///
pub fn write_dot<W: Write>(out: &mut W, automaton: &BuchiAutomaton) -> Result<(), Error> {
    write!(out, "{}", DotGraph::new(automaton))?;
    Ok(())
}
