//! Criterion benchmarks for the tree builder and traversal.
//!
//! Two tree shapes:
//!
//! - **Linear** — one long unbranched chain (one section, many points)
//! - **Bushy** — a complete binary tree of short sections
//!
//! Run with: `cargo bench -p dendra-core`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dendra_core::{
    BuildOptions, Morphology, MutableMorphology, Point, Record, RecordStream, SectionType,
    TreeTopology, to_record_stream,
};

const POINT_COUNTS: &[usize] = &[1_000, 10_000, 100_000];
const DEPTHS: &[u32] = &[8, 12, 16];

// ---------------------------------------------------------------------------
// Stream constructors
// ---------------------------------------------------------------------------

fn soma() -> Record {
    Record::new(1, SectionType::Soma, Point::new(0.0, 0.0, 0.0), 10.0, None)
}

fn linear(points: usize) -> RecordStream {
    let mut stream = RecordStream::new().with_record(soma());
    for i in 0..points as u32 {
        stream.push(Record::new(
            i + 2,
            SectionType::Axon,
            Point::new(0.0, i as f32, 0.0),
            1.0,
            Some(i + 1),
        ));
    }
    stream
}

/// Complete binary tree, three records per section.
fn bushy(depth: u32) -> RecordStream {
    let mut stream = RecordStream::new().with_record(soma());
    let mut next_id = 2;
    // (parent record id, depth, x offset)
    let mut pending = vec![(1u32, 0u32, 0.0f32)];
    while let Some((parent, level, x)) = pending.pop() {
        let mut prev = parent;
        for k in 0..3 {
            let y = (level * 3 + k + 1) as f32;
            stream.push(Record::new(
                next_id,
                SectionType::BasalDendrite,
                Point::new(x, y, 0.0),
                1.0,
                Some(prev),
            ));
            prev = next_id;
            next_id += 1;
        }
        if level + 1 < depth {
            let spread = 2f32.powi((depth - level) as i32);
            pending.push((prev, level + 1, x - spread));
            pending.push((prev, level + 1, x + spread));
        }
    }
    stream
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    let options = BuildOptions::default();
    let mut group = c.benchmark_group("build");

    for &points in POINT_COUNTS {
        let stream = linear(points);
        group.bench_with_input(BenchmarkId::new("linear", points), &stream, |b, s| {
            b.iter(|| black_box(Morphology::from_records(black_box(s), &options)));
        });
    }
    for &depth in DEPTHS {
        let stream = bushy(depth);
        group.bench_with_input(BenchmarkId::new("bushy", depth), &stream, |b, s| {
            b.iter(|| black_box(Morphology::from_records(black_box(s), &options)));
        });
    }

    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let options = BuildOptions::default();
    let mut group = c.benchmark_group("traverse");

    for &depth in DEPTHS {
        let Ok(morph) = Morphology::from_records(&bushy(depth), &options) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("depth_first", depth), &morph, |b, m| {
            b.iter(|| black_box(m.depth_first().count()));
        });
        group.bench_with_input(BenchmarkId::new("breadth_first", depth), &morph, |b, m| {
            b.iter(|| black_box(m.breadth_first().count()));
        });
        group.bench_with_input(BenchmarkId::new("upstream_all", depth), &morph, |b, m| {
            b.iter(|| {
                let steps: usize = m.depth_first().map(|id| m.upstream_from(id).count()).sum();
                black_box(steps)
            });
        });
    }

    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let options = BuildOptions::default();
    let mut group = c.benchmark_group("round_trip");

    for &depth in DEPTHS {
        let Ok(morph) = Morphology::from_records(&bushy(depth), &options) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("to_record_stream", depth), &morph, |b, m| {
            b.iter(|| black_box(to_record_stream(black_box(m))));
        });
        let editor = MutableMorphology::from(&morph);
        group.bench_with_input(BenchmarkId::new("mutable_build", depth), &editor, |b, e| {
            b.iter(|| black_box(e.build(&options)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_build, bench_traverse, bench_round_trip);
criterion_main!(benches);
