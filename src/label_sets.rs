// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Label sets: sets of proposition indices stored as bitvectors
//!
//! A [LabelSet] is a set of small non-negative integers. It's used for three
//! things:
//! - the positive and negative literals of a transition [Label],
//! - the acceptance sets a GBA transition belongs to,
//! - a valuation, that is, the set of propositions that are true at some
//!   position of a word.
//!
//! A [Label] is a conjunction of literals: a transition labeled by `(pos, neg)`
//! can be taken iff all propositions of `pos` are true and all propositions of
//! `neg` are false.
//!

use std::fmt::Display;

const WORD_BITS: u32 = 64;

///
/// A set of integers represented as a bitvector
/// - the set grows as needed
/// - trailing zero words are never stored so two equal sets have the
///   same representation (derived `Eq` and `Hash` are exact)
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    words: Vec<u64>,
}

///
/// Iterator to enumerate the elements of a label set in increasing order
///
#[derive(Debug)]
pub struct LabelSetIterator<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Display for LabelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for x in self.iter() {
            write!(f, " {}", x)?;
        }
        write!(f, " }}")
    }
}

impl LabelSet {
    ///
    /// Create an empty set
    ///
    pub fn new() -> Self {
        LabelSet { words: Vec::new() }
    }

    ///
    /// Create the set { x }
    ///
    pub fn singleton(x: u32) -> Self {
        let mut set = LabelSet::new();
        set.insert(x);
        set
    }

    // drop trailing zero words
    fn normalize(&mut self) {
        while let Some(&0) = self.words.last() {
            self.words.pop();
        }
    }

    ///
    /// Check whether the set is empty
    ///
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    ///
    /// Number of elements
    ///
    pub fn len(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    ///
    /// Check whether x is in the set
    ///
    pub fn contains(&self, x: u32) -> bool {
        let i = (x / WORD_BITS) as usize;
        i < self.words.len() && self.words[i] & (1 << (x % WORD_BITS)) != 0
    }

    ///
    /// Add x to the set
    ///
    pub fn insert(&mut self, x: u32) {
        let i = (x / WORD_BITS) as usize;
        if self.words.len() <= i {
            self.words.resize(i + 1, 0);
        }
        self.words[i] |= 1 << (x % WORD_BITS);
    }

    ///
    /// Remove x from the set
    ///
    pub fn remove(&mut self, x: u32) {
        let i = (x / WORD_BITS) as usize;
        if i < self.words.len() {
            self.words[i] &= !(1 << (x % WORD_BITS));
            self.normalize();
        }
    }

    ///
    /// Largest element or None if the set is empty
    ///
    pub fn max_element(&self) -> Option<u32> {
        self.words.last().map(|w| {
            let base = (self.words.len() as u32 - 1) * WORD_BITS;
            base + (WORD_BITS - 1 - w.leading_zeros())
        })
    }

    ///
    /// Check whether self is included in other
    ///
    pub fn is_subset(&self, other: &LabelSet) -> bool {
        self.words.len() <= other.words.len()
            && self
                .words
                .iter()
                .zip(other.words.iter())
                .all(|(a, b)| a & !b == 0)
    }

    ///
    /// Check whether self and other have no element in common
    ///
    pub fn is_disjoint(&self, other: &LabelSet) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    ///
    /// Union of self and other
    ///
    pub fn union(&self, other: &LabelSet) -> LabelSet {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut words = long.words.clone();
        for (w, x) in words.iter_mut().zip(short.words.iter()) {
            *w |= x;
        }
        LabelSet { words }
    }

    ///
    /// Intersection of self and other
    ///
    pub fn intersection(&self, other: &LabelSet) -> LabelSet {
        let mut result = LabelSet {
            words: self
                .words
                .iter()
                .zip(other.words.iter())
                .map(|(a, b)| a & b)
                .collect(),
        };
        result.normalize();
        result
    }

    ///
    /// Iterator: elements in increasing order
    ///
    pub fn iter(&self) -> LabelSetIterator<'_> {
        LabelSetIterator {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl<'a> Iterator for LabelSetIterator<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros();
                self.current &= self.current - 1;
                return Some(self.index as u32 * WORD_BITS + bit);
            }
            self.index += 1;
            if self.index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.index];
        }
    }
}

impl FromIterator<u32> for LabelSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for x in iter {
            set.insert(x);
        }
        set
    }
}

///
/// Conjunction of literals
/// - `must_hold` = propositions that must be true
/// - `must_not_hold` = propositions that must be false
///
/// The two sets are disjoint.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Label {
    must_hold: LabelSet,
    must_not_hold: LabelSet,
}

impl Label {
    ///
    /// Build a label from its positive and negative literals
    /// - the two sets must be disjoint
    ///
    pub fn new(must_hold: LabelSet, must_not_hold: LabelSet) -> Self {
        debug_assert!(must_hold.is_disjoint(&must_not_hold));
        Label {
            must_hold,
            must_not_hold,
        }
    }

    /// The label that's always satisfied
    pub fn tautology() -> Self {
        Label::default()
    }

    /// Propositions that must be true
    pub fn must_hold(&self) -> &LabelSet {
        &self.must_hold
    }

    /// Propositions that must be false
    pub fn must_not_hold(&self) -> &LabelSet {
        &self.must_not_hold
    }

    /// Check whether this label has no literal
    pub fn is_true(&self) -> bool {
        self.must_hold.is_empty() && self.must_not_hold.is_empty()
    }

    ///
    /// Check whether self implies other
    ///
    /// This holds when every literal of other is also a literal of self, that is,
    /// self is at least as restrictive as other. A transition whose label implies
    /// the label of another transition to the same target is redundant.
    ///
    pub fn implies(&self, other: &Label) -> bool {
        other.must_hold.is_subset(&self.must_hold)
            && other.must_not_hold.is_subset(&self.must_not_hold)
    }

    ///
    /// Check whether the label holds in a valuation
    /// - valuation = set of true propositions
    ///
    pub fn is_satisfied_by(&self, valuation: &LabelSet) -> bool {
        self.must_hold.is_subset(valuation) && self.must_not_hold.is_disjoint(valuation)
    }

    ///
    /// Literals in increasing proposition order
    /// - each literal is a pair (proposition, polarity)
    ///
    pub fn literals(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.must_hold
            .union(&self.must_not_hold)
            .iter()
            .map(|x| (x, self.must_hold.contains(x)))
            .collect::<Vec<_>>()
            .into_iter()
    }

    ///
    /// Display this label with proposition names
    /// - proposition i is written names[i], or p<i> if names has no entry i
    ///
    pub fn with_names<'a>(&'a self, names: &'a [String]) -> NamedLabel<'a> {
        NamedLabel { label: self, names }
    }
}

///
/// A label with a proposition table, for display
///
#[derive(Debug)]
pub struct NamedLabel<'a> {
    label: &'a Label,
    names: &'a [String],
}

impl<'a> Display for NamedLabel<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_true() {
            return write!(f, "1");
        }
        let mut first = true;
        for (x, positive) in self.label.literals() {
            if !first {
                write!(f, " & ")?;
            }
            if !positive {
                write!(f, "!")?;
            }
            match self.names.get(x as usize) {
                Some(name) => write!(f, "{}", name)?,
                None => write!(f, "p{}", x)?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.with_names(&[]), f)
    }
}
