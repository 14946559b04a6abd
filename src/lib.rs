// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Degeneralization and minimization of generalized Büchi automata
//!
//! # Overview
//!
//! This crate converts a generalized Büchi automaton (GBA), as produced by an
//! LTL-to-automaton translator, into an equivalent Büchi automaton with a single
//! acceptance condition, then minimizes the result.
//!
//! The input automaton is built with a [GbaBuilder](crate::generalized::GbaBuilder).
//! Module [degeneralize](crate::degeneralize) implements the conversion. The states of the
//! result are pairs (GBA state, acceptance counter); only reachable states are constructed,
//! and redundant transitions and states can be removed on the fly.
//!
//! The minimization loop (see [BuchiAutomaton::minimize](crate::buchi::BuchiAutomaton::minimize))
//! removes subsumed transitions, uses a strongly-connected-component analysis to find the
//! states whose acceptance marking can change without changing the language, and merges
//! states with identical transitions.
//!
//! Module [export](crate::export) renders the result as a Promela never claim, as a JSON
//! document, or as a Graphviz graph.
//!
//! Module [lasso](crate::lasso) provides ultimately periodic words, for checking whether
//! an automaton accepts a word.
//!

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod acceptance;
pub mod buchi;
pub mod degeneralize;
pub mod errors;
pub mod export;
pub mod generalized;
pub mod label_sets;
pub mod lasso;

mod registry;
mod scc;
mod simplify;
