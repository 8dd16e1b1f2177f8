// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for index operations.

use thiserror::Error;

/// Errors raised by [`Index`](crate::Index) operations.
///
/// Deleting something that is not stored is not an error; those calls return
/// `Ok(None)`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Fill bounds passed to [`Index::with_fill`](crate::Index::with_fill) cannot
    /// produce valid splits.
    #[error("invalid fill bounds: min {min}, max {max} (need min >= 1, max >= 2, 2 * min <= max + 1)")]
    InvalidFill {
        /// Requested minimum children per node.
        min: usize,
        /// Requested maximum children per node.
        max: usize,
    },

    /// The shape is inverted, has NaN or infinite coordinates, or is a point whose
    /// entry box cannot contain it. The tree was not modified.
    #[error("shape has inverted or non-finite bounds")]
    InvalidShape,

    /// Subtree selection reached an internal node with no internal children
    /// above the leaf level. The tree is corrupted.
    #[error("no subtree candidate below internal node at level {level}")]
    NoSubtreeCandidate {
        /// Level of the node whose children were examined.
        level: usize,
    },

    /// A split was attempted on a node that cannot seed two groups.
    #[error("cannot split a node with {children} children")]
    Unsplittable {
        /// Number of children the node held.
        children: usize,
    },
}

/// Result alias for index operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;
