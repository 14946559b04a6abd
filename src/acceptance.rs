// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Acceptance counters for degeneralization
//!
//! A generalized Büchi automaton has `k` acceptance sets, numbered from 0 to `k-1`.
//! Every transition belongs to some of these sets. A run is accepting if it
//! takes transitions from each of the `k` sets infinitely often.
//!
//! The degeneralized automaton pairs every GBA state with a counter `c` in `[0, k]`:
//! - if `c < k`, set `c` is the first acceptance set not yet visited since the
//!   counter last wrapped,
//! - `c == k` means that all sets were visited in order. States with counter
//!   `k` are the accepting states of the Büchi automaton.
//!
//! After reaching `k`, a counter restarts from 0 on the next transition.
//!

use crate::label_sets::LabelSet;

///
/// Counter reached after a transition
/// - membership = acceptance sets the transition belongs to
/// - start = counter of the source state (0 if the source is accepting)
/// - accept = number of acceptance sets (k)
///
/// The counter moves forward as long as the transition belongs to the next
/// expected set, so a single transition can satisfy several sets in a row.
///
pub fn next_counter(membership: &LabelSet, start: u32, accept: u32) -> u32 {
    debug_assert!(start <= accept);
    let mut counter = start;
    while counter < accept && membership.contains(counter) {
        counter += 1;
    }
    counter
}

///
/// Counter to start from when leaving a state with counter c
///
pub fn restart(counter: u32, accept: u32) -> u32 {
    if counter == accept {
        0
    } else {
        counter
    }
}
