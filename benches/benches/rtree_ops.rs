// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_rtree::{Index, Rect};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Rect<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Rect::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_i64(&mut self, bound: i64) -> i64 {
        (self.next_u64() % bound as u64) as i64
    }
}

fn gen_random_points(count: usize, extent: i64, seed: u64) -> Vec<(i64, i64)> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| (rng.next_i64(extent), rng.next_i64(extent)))
        .collect()
}

fn build_f64(rects: &[Rect<f64>], min: usize, max: usize) -> Index<f64, u32> {
    let mut idx = Index::with_fill(min, max).unwrap();
    for (i, r) in rects.iter().copied().enumerate() {
        idx.insert(i as u32, r).unwrap();
    }
    idx
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_insert_f64");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        for &(min, max) in &[(2usize, 8usize), (4, 30)] {
            group.bench_function(format!("grid_n{n}_fill{min}_{max}"), |b| {
                b.iter(|| black_box(build_f64(&rects, min, max)));
            });
        }
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_query_f64");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let idx = build_f64(&rects, 4, 30);
        let window = Rect::<f64>::from_xywh(100.0, 100.0, 200.0, 200.0);

        group.bench_function(format!("query_rect_n{n}"), |b| {
            b.iter(|| black_box(idx.query_rect(window).count()));
        });
        group.bench_function(format!("query_point_n{n}"), |b| {
            b.iter(|| black_box(idx.query_point(305.0, 305.0).count()));
        });
        group.bench_function(format!("find_rect_n{n}"), |b| {
            b.iter(|| black_box(idx.find(window).len()));
        });
    }
    group.finish();
}

fn bench_points_i64(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_points_i64");
    let points = gen_random_points(10_000, 10_000, 0x5eed);
    group.throughput(Throughput::Elements(points.len() as u64));

    group.bench_function("insert_10k", |b| {
        b.iter(|| {
            let mut idx: Index<i64, usize> = Index::new();
            for (i, &p) in points.iter().enumerate() {
                idx.insert(i, p).unwrap();
            }
            black_box(idx.height())
        });
    });

    group.bench_function("delete_half_10k", |b| {
        b.iter_batched(
            || {
                let mut idx: Index<i64, usize> = Index::new();
                for (i, &p) in points.iter().enumerate() {
                    idx.insert(i, p).unwrap();
                }
                idx
            },
            |mut idx| {
                for (i, &p) in points.iter().enumerate().step_by(2) {
                    let _ = idx.delete(&i, p).unwrap();
                }
                black_box(idx.len())
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_points_i64);
criterion_main!(benches);
