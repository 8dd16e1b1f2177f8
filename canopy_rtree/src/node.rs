// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage: a slot arena holding internal nodes and entries.
//!
//! Nodes refer to each other by [`NodeIdx`]. A node owns the indices in its
//! `children` list; the `parent` index is a plain back-link used for upward walks
//! and for propagating stale bounding rectangles.
//!
//! Bounding rectangles are maintained lazily. Structural changes mark a node
//! dirty, [`Arena::rectangle`] recomputes the union of its children on the next
//! read, and the parent is marked dirty only when the recomputed value differs
//! from the cached one.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::{Error, Result};
use crate::geometry::{Rect, Scalar, union_opt};

/// Minimum number of children of the root node.
pub const ROOT_MIN_FILL: usize = 1;

/// Maximum number of children of the root node.
///
/// Kept deliberately below the regular bound so the top level splits eagerly.
pub const ROOT_MAX_FILL: usize = 2;

/// Handle to an entry stored in an [`Index`](crate::Index).
///
/// A key consists of a slot index and a generation counter.
///
/// - A key stays valid while its entry is stored, including when deletes elsewhere
///   cause the entry to be re-inserted into a different part of the tree.
/// - Once the entry is removed the key becomes stale. A reused slot gets a higher
///   generation, so a stale key never aliases a newer entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Entry keys are 32-bit; arenas beyond u32::MAX slots are not supported."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind<P> {
    Internal { children: Vec<NodeIdx> },
    Entry { payload: P },
}

#[derive(Clone, Debug)]
pub(crate) struct Node<T, P> {
    pub(crate) parent: Option<NodeIdx>,
    /// Depth below the root (root = 0).
    pub(crate) level: usize,
    rect: Option<Rect<T>>,
    dirty: bool,
    pub(crate) kind: NodeKind<P>,
}

#[cfg(test)]
impl<T: Copy, P> Node<T, P> {
    /// Cached rectangle; may be stale while the node is dirty.
    pub(crate) fn cached_rect(&self) -> Option<Rect<T>> {
        self.rect
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Fan-out bounds for non-root nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Fill {
    pub(crate) min: usize,
    pub(crate) max: usize,
}

impl Fill {
    pub(crate) const DEFAULT: Self = Self { min: 4, max: 30 };

    pub(crate) fn new(min: usize, max: usize) -> Result<Self> {
        // A quadratic split of `max + 1` children can only guarantee `min` per
        // group when both groups fit.
        if min == 0 || max < 2 || 2 * min > max + 1 {
            return Err(Error::InvalidFill { min, max });
        }
        Ok(Self { min, max })
    }

    fn bounds(self, is_root: bool) -> (usize, usize) {
        if is_root {
            (ROOT_MIN_FILL, ROOT_MAX_FILL)
        } else {
            (self.min, self.max)
        }
    }
}

#[derive(Clone, Debug)]
struct Slot<T, P> {
    generation: u32,
    node: Option<Node<T, P>>,
}

#[derive(Clone)]
pub(crate) struct Arena<T, P> {
    slots: Vec<Slot<T, P>>,
    free_list: Vec<usize>,
    fill: Fill,
}

impl<T: Scalar, P> Arena<T, P> {
    pub(crate) fn new(fill: Fill) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            fill,
        }
    }

    pub(crate) fn fill(&self) -> Fill {
        self.fill
    }

    /// Release every node. Slots keep their generation so old keys stay stale.
    pub(crate) fn clear(&mut self) {
        self.free_list.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.node = None;
            self.free_list.push(i);
        }
    }

    fn alloc(&mut self, node: Node<T, P>) -> NodeIdx {
        if let Some(i) = self.free_list.pop() {
            let slot = &mut self.slots[i];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeIdx::new(i)
        } else {
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeIdx::new(self.slots.len() - 1)
        }
    }

    /// Allocate an empty, unlinked internal node.
    pub(crate) fn alloc_internal(&mut self, level: usize) -> NodeIdx {
        self.alloc(Node {
            parent: None,
            level,
            rect: None,
            dirty: false,
            kind: NodeKind::Internal {
                children: Vec::new(),
            },
        })
    }

    /// Allocate an unlinked entry node.
    pub(crate) fn alloc_entry(&mut self, payload: P, rect: Rect<T>) -> NodeIdx {
        let idx = self.alloc_internal(0);
        self.set_payload(idx, payload, rect);
        idx
    }

    /// Free a single slot. Children are not touched.
    pub(crate) fn release(&mut self, idx: NodeIdx) -> Option<Node<T, P>> {
        let node = self.slots.get_mut(idx.get())?.node.take()?;
        self.free_list.push(idx.get());
        Some(node)
    }

    fn release_subtree(&mut self, idx: NodeIdx) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            if let Some(Node {
                kind: NodeKind::Internal { children },
                ..
            }) = self.release(i)
            {
                stack.extend(children);
            }
        }
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &Node<T, P> {
        self.slots[idx.get()]
            .node
            .as_ref()
            .expect("tree links only point at live nodes")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<T, P> {
        self.slots[idx.get()]
            .node
            .as_mut()
            .expect("tree links only point at live nodes")
    }

    pub(crate) fn key(&self, idx: NodeIdx) -> Key {
        Key::new(idx.get(), self.slots[idx.get()].generation)
    }

    /// Resolve a key to a live entry node.
    pub(crate) fn resolve(&self, key: Key) -> Option<NodeIdx> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        match slot.node.as_ref()?.kind {
            NodeKind::Entry { .. } => Some(NodeIdx::new(key.idx())),
            NodeKind::Internal { .. } => None,
        }
    }

    pub(crate) fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        match &self.node(idx).kind {
            NodeKind::Internal { children } => children,
            NodeKind::Entry { .. } => &[],
        }
    }

    pub(crate) fn payload(&self, idx: NodeIdx) -> Option<&P> {
        match &self.node(idx).kind {
            NodeKind::Entry { payload } => Some(payload),
            NodeKind::Internal { .. } => None,
        }
    }

    pub(crate) fn is_entry(&self, idx: NodeIdx) -> bool {
        matches!(self.node(idx).kind, NodeKind::Entry { .. })
    }

    /// An internal node whose children are all entries (or that has none).
    pub(crate) fn is_leaf(&self, idx: NodeIdx) -> bool {
        !self.is_entry(idx) && self.children(idx).iter().all(|&c| self.is_entry(c))
    }

    /// The root is the one internal node without a parent.
    pub(crate) fn is_root(&self, idx: NodeIdx) -> bool {
        let n = self.node(idx);
        n.parent.is_none() && matches!(n.kind, NodeKind::Internal { .. })
    }

    /// Append `child` to `parent`, relink it, and widen `parent`'s rectangle.
    pub(crate) fn attach_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "attached nodes must be detached first"
        );
        debug_assert!(!self.is_entry(parent), "entries cannot hold children");
        let level = {
            let p = self.node_mut(parent);
            let NodeKind::Internal { children } = &mut p.kind else {
                return;
            };
            children.push(child);
            p.level + 1
        };
        self.node_mut(child).parent = Some(parent);
        self.relevel(child, level);

        let child_rect = self.rectangle(child);
        let p = self.node_mut(parent);
        let merged = union_opt(p.rect, child_rect);
        if merged != p.rect {
            p.rect = merged;
            let grandparent = p.parent;
            if let Some(g) = grandparent {
                self.mark_dirty(g);
            }
        }
    }

    /// Remove `child` from `parent`'s children. Returns false if it was not there.
    pub(crate) fn detach_child(&mut self, parent: NodeIdx, child: NodeIdx) -> bool {
        let p = self.node_mut(parent);
        let NodeKind::Internal { children } = &mut p.kind else {
            return false;
        };
        let Some(pos) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(pos);
        p.dirty = true;
        self.node_mut(child).parent = None;
        true
    }

    /// Unlink and return all children of `idx`, preserving their order.
    pub(crate) fn take_children(&mut self, idx: NodeIdx) -> Vec<NodeIdx> {
        let n = self.node_mut(idx);
        let taken = match &mut n.kind {
            NodeKind::Internal { children } => core::mem::take(children),
            NodeKind::Entry { .. } => Vec::new(),
        };
        n.dirty = true;
        for &c in &taken {
            self.node_mut(c).parent = None;
        }
        taken
    }

    /// Set the level of `idx` and push the change down its subtree.
    fn relevel(&mut self, idx: NodeIdx, level: usize) {
        let mut stack = vec![(idx, level)];
        while let Some((i, lvl)) = stack.pop() {
            let n = self.node_mut(i);
            // Subtrees are internally consistent, so an unchanged level ends the walk.
            if n.level == lvl {
                continue;
            }
            n.level = lvl;
            if let NodeKind::Internal { children } = &n.kind {
                stack.extend(children.iter().map(|&c| (c, lvl + 1)));
            }
        }
    }

    pub(crate) fn mark_dirty(&mut self, idx: NodeIdx) {
        let n = self.node_mut(idx);
        if matches!(n.kind, NodeKind::Internal { .. }) {
            n.dirty = true;
        }
    }

    /// Bounding rectangle of `idx`, recomputing it first if it is dirty.
    ///
    /// `None` for an internal node without children.
    pub(crate) fn rectangle(&mut self, idx: NodeIdx) -> Option<Rect<T>> {
        let n = self.node(idx);
        if !n.dirty {
            return n.rect;
        }
        let mut acc = None;
        for i in 0..self.children(idx).len() {
            let child = self.children(idx)[i];
            acc = union_opt(acc, self.rectangle(child));
        }
        let n = self.node_mut(idx);
        n.dirty = false;
        if n.rect != acc {
            n.rect = acc;
            let parent = n.parent;
            if let Some(p) = parent {
                self.mark_dirty(p);
            }
        }
        acc
    }

    /// Like [`Self::rectangle`], but falls back to the zero-sized origin box.
    pub(crate) fn bounds(&mut self, idx: NodeIdx) -> Rect<T> {
        self.rectangle(idx).unwrap_or_else(Rect::degenerate)
    }

    /// Recompute unconditionally.
    pub(crate) fn refresh(&mut self, idx: NodeIdx) -> Option<Rect<T>> {
        self.mark_dirty(idx);
        self.rectangle(idx)
    }

    /// Read-only rectangle lookup. A dirty node is recomputed without caching.
    pub(crate) fn peek_rect(&self, idx: NodeIdx) -> Option<Rect<T>> {
        let n = self.node(idx);
        if !n.dirty {
            return n.rect;
        }
        self.children(idx)
            .iter()
            .fold(None, |acc, &c| union_opt(acc, self.peek_rect(c)))
    }

    /// Area increase needed for `idx` to also cover `r`.
    ///
    /// A node without a rectangle reports the full area of `r`.
    pub(crate) fn enlargement(&mut self, idx: NodeIdx, r: &Rect<T>) -> T::Acc {
        match self.rectangle(idx) {
            None => r.area(),
            Some(b) => b.union(r).area() - b.area(),
        }
    }

    pub(crate) fn area(&mut self, idx: NodeIdx) -> T::Acc {
        self.bounds(idx).area()
    }

    pub(crate) fn is_overflowing(&self, idx: NodeIdx) -> bool {
        let (_, max) = self.fill.bounds(self.is_root(idx));
        self.children(idx).len() > max
    }

    pub(crate) fn is_underflowing(&self, idx: NodeIdx) -> bool {
        if self.is_entry(idx) {
            return false;
        }
        let (min, _) = self.fill.bounds(self.is_root(idx));
        self.children(idx).len() < min
    }

    /// Turn `idx` into an entry holding `payload` under `rect`.
    ///
    /// Any previous children are released.
    pub(crate) fn set_payload(&mut self, idx: NodeIdx, payload: P, rect: Rect<T>) {
        let old = core::mem::replace(&mut self.node_mut(idx).kind, NodeKind::Entry { payload });
        if let NodeKind::Internal { children } = old {
            for c in children {
                self.release_subtree(c);
            }
        }
        self.set_rect(idx, rect);
    }

    /// Replace the stored rectangle of an entry.
    pub(crate) fn set_rect(&mut self, idx: NodeIdx, rect: Rect<T>) {
        let n = self.node_mut(idx);
        n.rect = Some(rect);
        n.dirty = false;
        let parent = n.parent;
        if let Some(p) = parent {
            self.mark_dirty(p);
        }
    }

    /// Release every internal node under (and including) `idx`, returning the
    /// unlinked entries it held together with the level each occupied.
    pub(crate) fn drain_entries(&mut self, idx: NodeIdx) -> Vec<(NodeIdx, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            if self.is_entry(i) {
                let n = self.node_mut(i);
                n.parent = None;
                out.push((i, n.level));
                continue;
            }
            if let Some(Node {
                kind: NodeKind::Internal { children },
                ..
            }) = self.release(i)
            {
                // Reverse keeps the original left-to-right order on the stack.
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// Live entries in slot order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (Key, Rect<T>, &P)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let node = slot.node.as_ref()?;
            let NodeKind::Entry { payload } = &node.kind else {
                return None;
            };
            Some((Key::new(i, slot.generation), node.rect?, payload))
        })
    }

    #[cfg(test)]
    pub(crate) fn live_nodes(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

impl<T, P> Debug for Arena<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("fill", &self.fill)
            .field("total_slots", &self.slots.len())
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}
