// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree basics.
//!
//! Insert points and rectangles, query them, then delete until the tree condenses.
//!
//! Run:
//! - `cargo run -p canopy_demos --example rtree_basics`
//! - `RUST_LOG=debug cargo run -p canopy_demos --example rtree_basics` to watch splits

use canopy_rtree::{Index, Rect};

fn main() -> canopy_rtree::Result<()> {
    env_logger::init();

    // Small fan-out so splits show up after a handful of inserts
    let mut index: Index<i64, u32> = Index::with_fill(2, 4)?;
    for i in 0..6 {
        index.insert(i, (i64::from(i), i64::from(i)))?;
        println!("after insert {i}: height {}", index.height());
    }

    // A point entry is the 2x2 box around it, so (3,3) and (4,4) both cover (3,3)
    let hits = index.find((3, 3));
    println!("payloads at (3,3): {hits:?}");
    assert_eq!(hits.len(), 2, "neighbouring point boxes overlap");

    let window = Rect::new(-1, -1, 2, 2);
    println!("payloads in {window:?}: {:?}", index.find(window));

    // Removing (0,0) empties a leaf and drops its parent; the survivors are
    // re-inserted and stay reachable
    assert_eq!(index.delete(&0, (0, 0))?, Some(0));
    println!("after delete: len {}, height {}", index.len(), index.height());
    assert!(index.find((1, 1)).contains(&&1), "survivor 1 is still indexed");

    // Deleting again is a no-op
    assert_eq!(index.delete(&0, (0, 0))?, None);
    println!("{index:?}");
    Ok(())
}
