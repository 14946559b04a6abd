// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Strongly connected components
//!
//! Tarjan's algorithm with an explicit stack, plus the SCC pass of the
//! Büchi automaton minimization: states that are not reachable from the
//! initial state are removed, and the remaining states are classified as
//! rigid or acceptance-flexible.
//!

use tracing::{debug, trace};

use crate::{
    buchi::{BStateId, SccStatus},
    registry::StateRegistry,
};

const UNVISITED: usize = usize::MAX;

///
/// Result of the decomposition of a graph with nodes [0 .. N-1]
/// - component[v] = Some(c) if node v was reached from a root
/// - size[c] = number of nodes in component c
///
#[derive(Debug)]
pub(crate) struct Components {
    component: Vec<Option<usize>>,
    size: Vec<usize>,
}

impl Components {
    /// Component of node v or None if v was not reached
    pub fn component(&self, v: usize) -> Option<usize> {
        self.component[v]
    }

    /// Number of components
    pub fn num_components(&self) -> usize {
        self.size.len()
    }

    /// Size of component c
    pub fn size(&self, c: usize) -> usize {
        self.size[c]
    }
}

// Frame of the explicit DFS stack: a node and its successors not yet explored
#[derive(Debug)]
struct Frame {
    node: usize,
    successors: Vec<usize>,
    next: usize,
}

///
/// Compute the strongly connected components of the nodes reachable from roots
/// - num_nodes = number of nodes (nodes are integers in [0 .. num_nodes-1])
/// - successors(v) = list of successors of v
///
/// Components are numbered in the order Tarjan's algorithm completes them, so a
/// component is numbered before any component that can reach it.
///
pub(crate) fn tarjan<I, F>(num_nodes: usize, roots: I, mut successors: F) -> Components
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> Vec<usize>,
{
    let mut rank = vec![UNVISITED; num_nodes];
    let mut lowlink = vec![UNVISITED; num_nodes];
    let mut on_stack = vec![false; num_nodes];
    let mut stack: Vec<usize> = Vec::new();
    let mut calls: Vec<Frame> = Vec::new();
    let mut component = vec![None; num_nodes];
    let mut size = Vec::new();
    let mut counter = 0;

    for root in roots {
        if rank[root] != UNVISITED {
            continue;
        }
        rank[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;
        calls.push(Frame {
            node: root,
            successors: successors(root),
            next: 0,
        });

        loop {
            // pick the next successor of the node on top of the call stack
            let (v, next) = match calls.last_mut() {
                None => break,
                Some(frame) => {
                    if frame.next < frame.successors.len() {
                        let w = frame.successors[frame.next];
                        frame.next += 1;
                        (frame.node, Some(w))
                    } else {
                        (frame.node, None)
                    }
                }
            };

            match next {
                Some(w) => {
                    if rank[w] == UNVISITED {
                        rank[w] = counter;
                        lowlink[w] = counter;
                        counter += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        calls.push(Frame {
                            node: w,
                            successors: successors(w),
                            next: 0,
                        });
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(rank[w]);
                    }
                }
                None => {
                    // all successors of v are done
                    calls.pop();
                    if let Some(parent) = calls.last() {
                        let p = parent.node;
                        lowlink[p] = lowlink[p].min(lowlink[v]);
                    }
                    if lowlink[v] == rank[v] {
                        let c = size.len();
                        let mut n = 0;
                        loop {
                            let w = stack.pop().expect("Tarjan stack cannot be empty here");
                            on_stack[w] = false;
                            component[w] = Some(c);
                            n += 1;
                            if w == v {
                                break;
                            }
                        }
                        size.push(n);
                    }
                }
            }
        }
    }

    Components { component, size }
}

///
/// SCC pass over the Büchi automaton
/// - every live state not reachable from the initial state is tombstoned
///   (dead, no forward)
/// - a reachable state alone in its component and without a self-loop is marked
///   trivial (acceptance-flexible)
/// - all other reachable states are marked rigid
///
/// A state that was rigid before stays rigid.
///
/// Return the number of states removed.
///
pub(crate) fn analyze(registry: &mut StateRegistry, initial: Option<BStateId>) -> usize {
    let root = initial.filter(|&i| registry.is_live(i));
    let components = {
        let reg = &*registry;
        tarjan(reg.capacity(), root, |v| {
            reg.state(v).transitions.iter().map(|t| t.target).collect()
        })
    };

    let mut removed = 0;
    let mut trivial = 0;
    for id in registry.live_states() {
        match components.component(id) {
            None => {
                trace!(state = id, "unreachable state removed");
                registry.tombstone(id, None);
                removed += 1;
            }
            Some(c) => {
                let s = registry.state_mut(id);
                let alone = components.size(c) == 1 && !s.transitions.iter().any(|t| t.target == id);
                if s.scc != SccStatus::Rigid {
                    s.scc = if alone {
                        SccStatus::Trivial
                    } else {
                        SccStatus::Rigid
                    };
                }
                if s.scc == SccStatus::Trivial {
                    trivial += 1;
                }
            }
        }
    }

    debug!(
        components = components.num_components(),
        trivial, removed, "SCC analysis done"
    );
    removed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        buchi::BuchiAutomaton,
        degeneralize::{build, Options},
        generalized::GbaBuilder,
        label_sets::LabelSet,
    };

    fn graph_successors(edges: &[(usize, usize)], v: usize) -> Vec<usize> {
        edges
            .iter()
            .filter(|(x, _)| *x == v)
            .map(|(_, y)| *y)
            .collect()
    }

    //
    // Test graph:
    //   0 -> 1, 1 -> 2, 2 -> 0    (component {0, 1, 2})
    //   2 -> 3, 3 -> 3            (component {3}, self-loop)
    //   3 -> 4                    (component {4}, trivial)
    //   5 -> 0                    (not reachable from 0)
    //
    #[test]
    fn test_tarjan() {
        let edges = vec![(0, 1), (1, 2), (2, 0), (2, 3), (3, 3), (3, 4), (5, 0)];
        let c = tarjan(6, vec![0], |v| graph_successors(&edges, v));

        for v in 0..6 {
            println!("node {}: component {:?}", v, c.component(v));
        }

        assert_eq!(c.num_components(), 3);
        let c0 = c.component(0).unwrap();
        assert_eq!(c.component(1), Some(c0));
        assert_eq!(c.component(2), Some(c0));
        assert_eq!(c.size(c0), 3);

        let c3 = c.component(3).unwrap();
        let c4 = c.component(4).unwrap();
        assert_ne!(c3, c0);
        assert_ne!(c3, c4);
        assert_eq!(c.size(c3), 1);
        assert_eq!(c.size(c4), 1);
        // reverse topological order
        assert!(c4 < c3 && c3 < c0);

        assert_eq!(c.component(5), None);
    }

    // init --true--> (g, 1) --true--> (g, 1)
    fn accepting_loop() -> BuchiAutomaton {
        let mut builder = GbaBuilder::new(1);
        builder
            .mark_initial(&"g")
            .add_transition(&"g", LabelSet::new(), LabelSet::new(), LabelSet::singleton(0), &"g");
        let gba = builder.build().unwrap();
        build(&gba, &Options::default().with_simplify(false))
    }

    #[test]
    fn test_rigid_is_monotone() {
        let mut buchi = accepting_loop();
        let init = buchi.initial.unwrap();
        let next = buchi.registry.state(init).transitions[0].target;

        assert_eq!(analyze(&mut buchi.registry, buchi.initial), 0);
        assert_eq!(buchi.registry.state(init).scc, SccStatus::Trivial);
        assert_eq!(buchi.registry.state(next).scc, SccStatus::Rigid);

        // a singleton component without self-loop doesn't make a rigid state flexible
        buchi.registry.state_mut(init).scc = SccStatus::Rigid;
        assert_eq!(analyze(&mut buchi.registry, buchi.initial), 0);
        assert_eq!(buchi.registry.state(init).scc, SccStatus::Rigid);
        assert!(!buchi.registry.state(init).is_flexible());
        assert_eq!(buchi.registry.state(next).scc, SccStatus::Rigid);
    }

    #[test]
    fn test_no_root() {
        let mut buchi = accepting_loop();
        assert_eq!(buchi.registry.num_live(), 2);
        // nothing is reachable without an initial state
        assert_eq!(analyze(&mut buchi.registry, None), 2);
        assert_eq!(buchi.registry.num_live(), 0);
    }

    #[test]
    fn test_long_chain() {
        // deep enough to overflow a recursive implementation
        let n = 200_000;
        let c = tarjan(n, vec![0], |v| if v + 1 < n { vec![v + 1] } else { vec![0] });
        assert_eq!(c.num_components(), 1);
        assert_eq!(c.size(0), n);
    }
}
