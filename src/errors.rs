// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Error codes
//!
//! Degeneralization itself cannot fail on a well-formed input. Errors are reported
//! when a generalized automaton is assembled from client data (see
//! [GbaBuilder](crate::generalized::GbaBuilder)) and when an exporter writes to an
//! output stream.
//!

use thiserror::Error;

///
/// Errors produced by the GBA builder and the exporters
///
#[derive(Debug, Error)]
pub enum Error {
    /// A label mentions a proposition index that is not in the symbol table.
    #[error("proposition {index} is out of range (the automaton has {count} propositions)")]
    PropositionOutOfRange {
        /// Index found in the label
        index: u32,
        /// Number of declared propositions
        count: u32,
    },

    /// A transition is declared a member of a nonexistent acceptance set.
    #[error("acceptance set {set} is out of range (the automaton has {count} acceptance sets)")]
    AcceptanceSetOutOfRange {
        /// Set index found in the membership
        set: u32,
        /// Number of acceptance sets
        count: u32,
    },

    /// A label requires a proposition to be both true and false.
    ///
    /// Such a transition can never fire. The GBA builder upstream is expected to drop
    /// it before handing the automaton over.
    #[error("proposition {proposition} is both required and forbidden by the same label")]
    ContradictoryLabel {
        /// The offending proposition
        proposition: u32,
    },

    /// Writing an export failed.
    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the structured document failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
