// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadratic node split.
//!
//! Seeds are the pair of children that would waste the most area if grouped
//! together. Remaining children are assigned one at a time, strongest preference
//! first, to the group that needs the least enlargement. Seed selection inspects
//! all pairs, so a split costs `O(k²)` in the fan-out `k`.

use alloc::vec::Vec;

use log::debug;

use crate::error::{Error, Result};
use crate::geometry::{Rect, Scalar};
use crate::node::{Arena, NodeIdx};

/// Move the children of `node` into two new, unlinked group nodes.
///
/// `node` is left empty; the caller replaces it with the returned pair.
pub(crate) fn split_node<T: Scalar, P>(
    arena: &mut Arena<T, P>,
    node: NodeIdx,
) -> Result<(NodeIdx, NodeIdx)> {
    let count = arena.children(node).len();
    if count < 2 {
        return Err(Error::Unsplittable { children: count });
    }
    let level = arena.node(node).level;
    let mut pending = arena.take_children(node);

    let (i, j) = pick_seeds(arena, &pending);
    // `j > i`, so removing `j` first leaves `i` in place.
    let seed_b = pending.remove(j);
    let seed_a = pending.remove(i);

    let a = arena.alloc_internal(level);
    let b = arena.alloc_internal(level);
    arena.attach_child(a, seed_a);
    arena.attach_child(b, seed_b);

    let min = arena.fill().min;
    while !pending.is_empty() {
        let child = pending.remove(pick_next(arena, &pending, a, b));
        let r = arena.bounds(child);
        let da = arena.enlargement(a, &r);
        let db = arena.enlargement(b, &r);
        let target = if da < db {
            a
        } else if db < da {
            b
        } else {
            let (area_a, area_b) = (arena.area(a), arena.area(b));
            if area_a < area_b {
                a
            } else if area_b < area_a {
                b
            } else if arena.children(a).len() < arena.children(b).len() {
                a
            } else {
                b
            }
        };
        arena.attach_child(target, child);

        if pending.is_empty() {
            break;
        }

        // A group that needs every remaining child to reach `min` takes them all.
        let (len_a, len_b) = (arena.children(a).len(), arena.children(b).len());
        let starving = if len_a < min && len_b >= min && min - len_a >= pending.len() {
            Some(a)
        } else if len_b < min && len_a >= min && min - len_b >= pending.len() {
            Some(b)
        } else {
            None
        };
        if let Some(group) = starving {
            for child in pending.drain(..) {
                arena.attach_child(group, child);
            }
            break;
        }
    }

    debug!(
        "split node at level {level}: {} + {} children",
        arena.children(a).len(),
        arena.children(b).len()
    );
    Ok((a, b))
}

/// Indices `(i, j)`, `i < j`, of the pair whose union wastes the most area.
fn pick_seeds<T: Scalar, P>(arena: &mut Arena<T, P>, children: &[NodeIdx]) -> (usize, usize) {
    let rects: Vec<Rect<T>> = children.iter().map(|&c| arena.bounds(c)).collect();
    let mut best: Option<(T::Acc, usize, usize)> = None;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let waste = rects[i].union(&rects[j]).area() - rects[i].area() - rects[j].area();
            if best.map(|(w, _, _)| waste > w).unwrap_or(true) {
                best = Some((waste, i, j));
            }
        }
    }
    best.map_or((0, 1), |(_, i, j)| (i, j))
}

/// Index into `pending` of the child with the strongest preference for one group.
fn pick_next<T: Scalar, P>(
    arena: &mut Arena<T, P>,
    pending: &[NodeIdx],
    a: NodeIdx,
    b: NodeIdx,
) -> usize {
    let mut chosen = 0;
    let mut best: Option<T::Acc> = None;
    for (i, &child) in pending.iter().enumerate() {
        let r = arena.bounds(child);
        let d1 = arena.enlargement(a, &r);
        let d2 = arena.enlargement(b, &r);
        let preference = if d1 > d2 { d1 - d2 } else { d2 - d1 };
        if best.map(|p| preference > p).unwrap_or(true) {
            best = Some(preference);
            chosen = i;
        }
    }
    chosen
}
