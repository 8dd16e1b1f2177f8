// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit-testing Kurbo shapes.
//!
//! Index widget bounds given as `kurbo::Rect`, hit-test with `kurbo::Point`, and
//! move a widget through its key.
//!
//! Run:
//! - `cargo run -p canopy_demos --example rtree_kurbo_hit_test`

use canopy_rtree::Index;
use kurbo::{Point, Rect};
use log::info;

#[derive(Debug, PartialEq)]
enum Widget {
    Button(&'static str),
    Panel(&'static str),
}

fn main() -> canopy_rtree::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut index: Index<f64, Widget> = Index::new();
    index.insert(Widget::Panel("sidebar"), Rect::new(0.0, 0.0, 200.0, 600.0))?;
    let ok = index.insert(Widget::Button("ok"), Rect::new(20.0, 500.0, 100.0, 540.0))?;
    index.insert(Widget::Button("cancel"), Rect::new(110.0, 500.0, 190.0, 540.0))?;

    let hits = index.find(Point::new(50.0, 520.0));
    info!("hits at (50, 520): {hits:?}");
    assert_eq!(hits.len(), 2, "button sits on top of the panel");

    // Move the ok button outside the sidebar
    index.update(ok, Rect::new(300.0, 500.0, 380.0, 540.0))?;
    let hits = index.find(Point::new(50.0, 520.0));
    info!("hits after move: {hits:?}");
    assert_eq!(hits, vec![&Widget::Panel("sidebar")]);
    assert_eq!(index.get(ok), Some(&Widget::Button("ok")));

    info!("bounds of everything: {:?}", index.bounds());
    Ok(())
}
