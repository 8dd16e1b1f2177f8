// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API: insertion, deletion with tree condensation, and queries.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::geometry::{Bounded, Point, Rect, Scalar, Shape};
use crate::node::{Arena, Fill, Key, NodeIdx, NodeKind};
use crate::split::split_node;

/// A dynamic R-tree mapping rectangles (or points) to payloads.
///
/// Non-root nodes hold between `min_fill` and `max_fill` children. The root is
/// bounded separately by [`ROOT_MIN_FILL`](crate::ROOT_MIN_FILL) and
/// [`ROOT_MAX_FILL`](crate::ROOT_MAX_FILL), so it splits as soon as it holds a
/// third child.
///
/// The index is not synchronized. Queries take `&self` and mutations take
/// `&mut self`; share it across threads behind a lock.
pub struct Index<T: Scalar, P> {
    arena: Arena<T, P>,
    root: NodeIdx,
    len: usize,
}

impl<T: Scalar, P> Index<T, P> {
    /// Create an empty index with the default fill bounds (4 to 30 children).
    pub fn new() -> Self {
        Self::from_fill(Fill::DEFAULT)
    }

    /// Create an empty index with custom fill bounds for non-root nodes.
    ///
    /// Requires `min >= 1`, `max >= 2` and `2 * min <= max + 1`.
    pub fn with_fill(min: usize, max: usize) -> Result<Self> {
        Ok(Self::from_fill(Fill::new(min, max)?))
    }

    fn from_fill(fill: Fill) -> Self {
        let mut arena = Arena::new(fill);
        let root = arena.alloc_internal(0);
        Self {
            arena,
            root,
            len: 0,
        }
    }

    /// Minimum children per non-root node.
    pub fn min_fill(&self) -> usize {
        self.arena.fill().min
    }

    /// Maximum children per non-root node.
    pub fn max_fill(&self) -> usize {
        self.arena.fill().max
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth at which entries sit: 0 when empty, 1 while the root holds entries
    /// directly, and one more for every root split since.
    pub fn height(&self) -> usize {
        let mut node = self.root;
        while let Some(&child) = self.arena.children(node).first() {
            if self.arena.is_entry(child) {
                return self.arena.node(child).level;
            }
            node = child;
        }
        self.arena.node(node).level
    }

    /// Bounding rectangle of everything stored.
    pub fn bounds(&self) -> Option<Rect<T>> {
        self.arena.peek_rect(self.root)
    }

    /// Remove every entry. Outstanding keys become stale.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = self.arena.alloc_internal(0);
        self.len = 0;
    }

    /// Insert `payload` under a point or rectangle. Returns a handle to the entry.
    ///
    /// A point is stored as the 2×2 box [`Rect::around`] it. Shapes that fail
    /// [`Shape::is_valid`] (inverted, NaN or infinite bounds, or a point at the
    /// integer maximum) are rejected with [`Error::InvalidShape`].
    pub fn insert(&mut self, payload: P, shape: impl Into<Shape<T>>) -> Result<Key> {
        let shape = shape.into();
        if !shape.is_valid() {
            return Err(Error::InvalidShape);
        }
        let rect = shape.entry_rect();
        let entry = self.arena.alloc_entry(payload, rect);
        let key = self.arena.key(entry);
        if let Err(e) = self.insert_node(entry, None) {
            if self.arena.node(entry).parent.is_none() {
                self.arena.release(entry);
            }
            return Err(e);
        }
        self.len += 1;
        Ok(key)
    }

    /// Insert a payload under its own [`Bounded::bounding_rect`].
    pub fn insert_bounded(&mut self, payload: P) -> Result<Key>
    where
        P: Bounded<T>,
    {
        let rect = payload.bounding_rect();
        self.insert(payload, rect)
    }

    /// Delete the first entry equal to `payload` whose rectangle intersects the
    /// probe for `shape`. Returns the removed payload.
    ///
    /// Deleting by point probes the same 2×2 box that a point insert stores.
    /// Nothing matching is not an error: the call returns `Ok(None)`.
    pub fn delete(&mut self, payload: &P, shape: impl Into<Shape<T>>) -> Result<Option<P>>
    where
        P: PartialEq,
    {
        let probe = shape.into().entry_rect();
        let found = self
            .search(|r| r.intersects(&probe))
            .into_iter()
            .find(|&e| self.arena.payload(e) == Some(payload));
        match found {
            Some(entry) => self.remove_entry(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Remove the entry named by `key`. Stale keys return `Ok(None)`.
    pub fn remove(&mut self, key: Key) -> Result<Option<P>> {
        match self.arena.resolve(key) {
            Some(entry) => self.remove_entry(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Move the entry named by `key` to a new shape. Returns false for stale keys.
    pub fn update(&mut self, key: Key, shape: impl Into<Shape<T>>) -> Result<bool> {
        let shape = shape.into();
        if !shape.is_valid() {
            return Err(Error::InvalidShape);
        }
        let rect = shape.entry_rect();
        let Some(entry) = self.arena.resolve(key) else {
            return Ok(false);
        };
        let unlinked = self.unlink_entry(entry);
        self.arena.set_rect(entry, rect);
        if let Err(e) = unlinked.and_then(|()| self.insert_node(entry, None)) {
            self.arena.release(entry);
            self.len -= 1;
            return Err(e);
        }
        Ok(true)
    }

    /// Payload stored under `key`.
    pub fn get(&self, key: Key) -> Option<&P> {
        self.arena.payload(self.arena.resolve(key)?)
    }

    /// Rectangle stored for `key`.
    pub fn rect(&self, key: Key) -> Option<Rect<T>> {
        self.arena.peek_rect(self.arena.resolve(key)?)
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Rect<T>, &P)> + '_ {
        self.arena.entries()
    }

    /// Entries whose rectangle contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, &P)> + '_ {
        let p = Point::new(x, y);
        self.keyed(self.search(|r| r.contains_point(p)))
    }

    /// Entries whose rectangle intersects `rect`.
    pub fn query_rect(&self, rect: Rect<T>) -> impl Iterator<Item = (Key, &P)> + '_ {
        self.keyed(self.search(|r| r.intersects(&rect)))
    }

    /// Payloads matching a point (containment) or rectangle (intersection).
    ///
    /// Results come out in breadth-first tree order.
    pub fn find(&self, shape: impl Into<Shape<T>>) -> Vec<&P> {
        match shape.into() {
            Shape::Point(p) => self.query_point(p.x, p.y).map(|(_, v)| v).collect(),
            Shape::Rect(r) => self.query_rect(r).map(|(_, v)| v).collect(),
        }
    }

    fn keyed(&self, hits: Vec<NodeIdx>) -> impl Iterator<Item = (Key, &P)> + '_ {
        hits.into_iter()
            .filter_map(|e| Some((self.arena.key(e), self.arena.payload(e)?)))
    }

    /// Breadth-first walk from the root. The root itself is never tested; a child
    /// that passes `hit` is descended into, and recorded when it is an entry.
    fn search(&self, mut hit: impl FnMut(&Rect<T>) -> bool) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self.root]);
        while let Some(node) = queue.pop_front() {
            for &child in self.arena.children(node) {
                let Some(r) = self.arena.peek_rect(child) else {
                    continue;
                };
                if hit(&r) {
                    queue.push_back(child);
                    if self.arena.is_entry(child) {
                        out.push(child);
                    }
                }
            }
        }
        out
    }

    /// Descend from the root towards `target_level` (or the leaves for `None`),
    /// taking the child that needs the least enlargement, then the smallest area,
    /// then the first in order.
    ///
    /// Metrics that overflow to NaN are ranked behind every ordered one; if no
    /// child has ordered metrics the first internal child is taken.
    fn choose_subtree(&mut self, rect: &Rect<T>, target_level: Option<usize>) -> Result<NodeIdx> {
        let target = target_level.unwrap_or(usize::MAX);
        let mut node = self.root;
        loop {
            let level = self.arena.node(node).level;
            if level >= target || self.arena.is_leaf(node) {
                return Ok(node);
            }
            let mut best: Option<(NodeIdx, T::Acc, T::Acc)> = None;
            let mut first = None;
            for i in 0..self.arena.children(node).len() {
                let child = self.arena.children(node)[i];
                if self.arena.is_entry(child) {
                    continue;
                }
                first.get_or_insert(child);
                let enlargement = self.arena.enlargement(child, rect);
                let area = self.arena.area(child);
                if !is_ordered(enlargement) || !is_ordered(area) {
                    continue;
                }
                let better = best
                    .map(|(_, e, a)| enlargement < e || (enlargement == e && area < a))
                    .unwrap_or(true);
                if better {
                    best = Some((child, enlargement, area));
                }
            }
            let Some(child) = best.map(|(c, ..)| c).or(first) else {
                return Err(Error::NoSubtreeCandidate { level });
            };
            trace!("descend from level {level} into node {}", child.get());
            node = child;
        }
    }

    /// Attach an unlinked entry below `target_level` and repair overflow upwards.
    fn insert_node(&mut self, entry: NodeIdx, target_level: Option<usize>) -> Result<()> {
        let rect = self.arena.bounds(entry);
        let mut node = self.choose_subtree(&rect, target_level)?;
        self.arena.attach_child(node, entry);

        while self.arena.is_overflowing(node) {
            let (a, b) = split_node(&mut self.arena, node)?;
            match self.arena.node(node).parent {
                None => {
                    let root = self.arena.alloc_internal(0);
                    self.arena.release(node);
                    self.arena.attach_child(root, a);
                    self.arena.attach_child(root, b);
                    self.root = root;
                    node = root;
                    debug!("root split, height now {}", self.height());
                }
                Some(parent) => {
                    self.arena.detach_child(parent, node);
                    self.arena.release(node);
                    self.arena.attach_child(parent, a);
                    self.arena.attach_child(parent, b);
                    node = parent;
                }
            }
        }
        self.tighten(node);
        Ok(())
    }

    /// Recompute rectangles from `node` up to the root.
    fn tighten(&mut self, node: NodeIdx) {
        let mut cur = Some(node);
        while let Some(n) = cur {
            self.arena.refresh(n);
            cur = self.arena.node(n).parent;
        }
    }

    fn remove_entry(&mut self, entry: NodeIdx) -> Result<P> {
        let unlinked = self.unlink_entry(entry);
        self.len -= 1;
        let node = self.arena.release(entry).expect("entry was resolved above");
        unlinked?;
        let NodeKind::Entry { payload } = node.kind else {
            unreachable!("only entries are removed");
        };
        Ok(payload)
    }

    /// Detach an entry from its leaf and condense the tree. The entry stays
    /// allocated.
    fn unlink_entry(&mut self, entry: NodeIdx) -> Result<()> {
        let Some(leaf) = self.arena.node(entry).parent else {
            return Ok(());
        };
        self.arena.detach_child(leaf, entry);
        self.arena.refresh(leaf);
        self.condense(leaf)
    }

    /// Walk up from `leaf`, dropping underfull non-root nodes and re-inserting
    /// every entry below them at the depth it came from.
    fn condense(&mut self, leaf: NodeIdx) -> Result<()> {
        let mut orphans = Vec::new();
        let mut cur = Some(leaf);
        while let Some(node) = cur {
            let parent = self.arena.node(node).parent;
            match parent {
                Some(p) if self.arena.is_underflowing(node) => {
                    let level = self.arena.node(node).level;
                    self.arena.detach_child(p, node);
                    let drained = self.arena.drain_entries(node);
                    debug!(
                        "eliminated underfull node at level {level}, {} entries orphaned",
                        drained.len()
                    );
                    orphans.extend(drained);
                }
                _ => {
                    self.arena.refresh(node);
                }
            }
            cur = parent;
        }

        if !orphans.is_empty() {
            debug!("re-inserting {} orphaned entries", orphans.len());
        }
        // Levels count from the root, so a root split during re-insertion pushes
        // every leaf one level down.
        let base = self.height();
        for (i, &(orphan, level)) in orphans.iter().enumerate() {
            let grown = self.height().saturating_sub(base);
            if let Err(e) = self.insert_node(orphan, Some(level.saturating_sub(1) + grown)) {
                // Entries that cannot be placed are dropped from the index.
                for &(lost, _) in &orphans[i..] {
                    self.arena.release(lost);
                    self.len -= 1;
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

fn is_ordered<A: PartialOrd>(a: A) -> bool {
    a.partial_cmp(&a).is_some()
}

impl<T: Scalar, P> Default for Index<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, P> Debug for Index<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Index")
            .field("len", &self.len)
            .field("height", &self.height())
            .field("bounds", &self.bounds())
            .field("arena", &self.arena)
            .finish_non_exhaustive()
    }
}
