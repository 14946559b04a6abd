// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Lasso words and product exploration
//!
//! A lasso word is an infinite word of the form `u v v v ...` where `u` (the prefix)
//! and `v` (the cycle) are finite sequences of valuations and `v` is not empty.
//! Each valuation is the [LabelSet] of propositions that are true at that position.
//!
//! Whether an ω-automaton accepts a lasso word is decided on the product of the
//! automaton with the word. The product is finite: a node is a pair (automaton state,
//! position in `u v`). A run over the word is accepting iff it ends up in a strongly
//! connected component of the product that satisfies the acceptance condition.
//!

use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use crate::{label_sets::LabelSet, scc::tarjan};

///
/// Ultimately periodic word: prefix followed by the cycle repeated forever
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lasso {
    prefix: Vec<LabelSet>,
    cycle: Vec<LabelSet>,
}

impl Lasso {
    ///
    /// Create the word prefix.cycle<sup>ω</sup>
    ///
    /// # Panics
    ///
    /// If the cycle is empty.
    ///
    pub fn new(prefix: Vec<LabelSet>, cycle: Vec<LabelSet>) -> Self {
        assert!(!cycle.is_empty(), "the cycle of a lasso word cannot be empty");
        Lasso { prefix, cycle }
    }

    /// The finite prefix
    pub fn prefix(&self) -> &[LabelSet] {
        &self.prefix
    }

    /// The repeated part
    pub fn cycle(&self) -> &[LabelSet] {
        &self.cycle
    }

    /// Number of distinct positions (prefix length + cycle length)
    pub fn num_positions(&self) -> usize {
        self.prefix.len() + self.cycle.len()
    }

    /// Valuation read at position i
    pub fn letter(&self, i: usize) -> &LabelSet {
        let p = self.prefix.len();
        if i < p {
            &self.prefix[i]
        } else {
            &self.cycle[i - p]
        }
    }

    /// Position that follows i
    pub fn next_position(&self, i: usize) -> usize {
        if i + 1 < self.num_positions() {
            i + 1
        } else {
            self.prefix.len()
        }
    }
}

///
/// Product of an automaton with a lasso word
/// - nodes[i] = (automaton state, position)
/// - edges[i] = list of (successor node, acceptance sets of the transition)
///
#[derive(Debug)]
pub(crate) struct Product<S> {
    nodes: Vec<(S, usize)>,
    edges: Vec<Vec<(usize, LabelSet)>>,
}

///
/// Strongly connected component of a product that contains at least one edge
/// - nodes = the nodes in the component
/// - acceptance = union of the acceptance sets of the edges inside the component
///
#[derive(Debug)]
pub(crate) struct Cycle {
    pub nodes: Vec<usize>,
    pub acceptance: LabelSet,
}

//
// Queue + map for breadth-first construction of the product:
// a node is added to the queue the first time it's seen.
//
#[derive(Debug)]
struct ProductQueue<S> {
    queue: VecDeque<usize>,
    index: HashMap<(S, usize), usize>,
    nodes: Vec<(S, usize)>,
}

impl<S: Copy + Eq + Hash> ProductQueue<S> {
    fn new() -> Self {
        ProductQueue {
            queue: VecDeque::new(),
            index: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    // return the index of a node, add it to the queue if it's new
    fn push(&mut self, node: (S, usize)) -> usize {
        match self.index.get(&node) {
            Some(&i) => i,
            None => {
                let i = self.nodes.len();
                self.nodes.push(node);
                self.index.insert(node, i);
                self.queue.push_back(i);
                i
            }
        }
    }

    fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }
}

impl<S: Copy + Eq + Hash> Product<S> {
    ///
    /// Build the reachable part of the product
    /// - roots = initial automaton states (read position 0)
    /// - step(s, valuation) = successors of s when reading valuation, each with the
    ///   acceptance sets of the transition taken
    ///
    pub fn explore<I, F>(lasso: &Lasso, roots: I, mut step: F) -> Self
    where
        I: IntoIterator<Item = S>,
        F: FnMut(S, &LabelSet) -> Vec<(S, LabelSet)>,
    {
        let mut queue = ProductQueue::new();
        for r in roots {
            queue.push((r, 0));
        }
        let mut edges = Vec::new();
        while let Some(i) = queue.pop() {
            let (s, pos) = queue.nodes[i];
            let next = lasso.next_position(pos);
            let succ: Vec<(usize, LabelSet)> = step(s, lasso.letter(pos))
                .into_iter()
                .map(|(t, acc)| (queue.push((t, next)), acc))
                .collect();
            if edges.len() <= i {
                edges.resize_with(i + 1, Vec::new);
            }
            edges[i] = succ;
        }
        let nodes = queue.nodes;
        edges.resize_with(nodes.len(), Vec::new);
        Product { nodes, edges }
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Automaton state of node i
    pub fn state(&self, i: usize) -> S {
        self.nodes[i].0
    }

    ///
    /// Components that contain a cycle
    ///
    pub fn cycles(&self) -> Vec<Cycle> {
        let edges = &self.edges;
        let n = self.num_nodes();
        let components = tarjan(n, 0..n, |v| edges[v].iter().map(|e| e.0).collect());

        let mut result: Vec<Option<Cycle>> = (0..components.num_components()).map(|_| None).collect();
        for (v, succ) in edges.iter().enumerate() {
            let c = components.component(v);
            for (w, acc) in succ {
                if components.component(*w) == c {
                    if let Some(c) = c {
                        let cycle = result[c].get_or_insert_with(|| Cycle {
                            nodes: Vec::new(),
                            acceptance: LabelSet::new(),
                        });
                        cycle.acceptance = cycle.acceptance.union(acc);
                    }
                }
            }
        }
        for v in 0..n {
            if let Some(c) = components.component(v) {
                if let Some(cycle) = result[c].as_mut() {
                    cycle.nodes.push(v);
                }
            }
        }
        result.into_iter().flatten().collect()
    }
}
