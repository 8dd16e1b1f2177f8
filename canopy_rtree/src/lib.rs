// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy R-tree: a dynamic 2D spatial index.
//!
//! - Insert payloads under a point or an axis-aligned rectangle.
//! - Find every payload whose rectangle contains a point or intersects a rectangle.
//! - Delete by payload and shape, or through the [`Key`] returned on insert.
//!
//! Insertion descends along the child that needs the least enlargement, and
//! overflowing nodes are split with Guttman's quadratic split. Deletion condenses
//! the tree on the way up: underfull nodes are dropped and the entries they held
//! are re-inserted at their original depth, so all entries stay at one level.
//!
//! The root is bounded to at most two children ([`ROOT_MAX_FILL`]) while other
//! nodes default to 4..=30, so the top of the tree splits early.
//!
//! # Example
//!
//! ```rust
//! use canopy_rtree::{Index, Rect};
//!
//! let mut index: Index<i64, &str> = Index::new();
//! index.insert("pond", Rect::new(0, 0, 10, 10))?;
//! index.insert("oak", (12, 4))?;
//!
//! assert_eq!(index.find((5, 5)), vec![&"pond"]);
//! assert_eq!(index.find(Rect::new(8, 0, 20, 8)).len(), 2);
//!
//! assert_eq!(index.delete(&"oak", (12, 4))?, Some("oak"));
//! assert_eq!(index.len(), 1);
//! # Ok::<(), canopy_rtree::Error>(())
//! ```
//!
//! ### Coordinates
//!
//! Coordinates are generic over [`Scalar`] (`i32`, `i64`, `f32`, `f64`). Areas are
//! accumulated in a widened type. Rectangles are half-open, and a point is stored
//! as the 2×2 box around it ([`Rect::around`]). NaN and infinite coordinates are
//! rejected, as are integer points at `T::MAX` where that box would saturate.
//!
//! With the `kurbo` feature, `kurbo::Rect` and `kurbo::Point` convert into `f64`
//! shapes.

#![no_std]

extern crate alloc;

mod error;
mod geometry;
mod index;
mod node;
mod split;

pub use error::{Error, Result};
pub use geometry::{Bounded, Point, Rect, Scalar, Shape};
pub use index::Index;
pub use node::{Key, ROOT_MAX_FILL, ROOT_MIN_FILL};
