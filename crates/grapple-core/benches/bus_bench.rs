//! Benchmark: signal bus fan-out and containment checks on the move path.
//!
//! Run with: `cargo bench -p grapple-core --bench bus_bench`
//!
//! Every drag move emits once on the bus and every drop target runs one
//! containment test, so these two costs bound per-move engine overhead.

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use grapple_core::{Point, PointerEvent, Rect, SignalBus};

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_emit");
    for listeners in [1usize, 8, 64] {
        let bus: SignalBus<PointerEvent> = SignalBus::new();
        let hits = Rc::new(Cell::new(0u64));
        let subs: Vec<_> = (0..listeners)
            .map(|_| {
                let hits = Rc::clone(&hits);
                bus.on("list-move", move |event: &PointerEvent| {
                    hits.set(hits.get().wrapping_add(event.client_x() as u64));
                })
            })
            .collect();
        let event = PointerEvent::new(12.0, 34.0);
        group.bench_function(format!("{listeners}_listeners"), |b| {
            b.iter(|| black_box(bus.emit("list-move", black_box(&event))));
        });
        drop(subs);
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let rects: Vec<Rect> = (0..256)
        .map(|i| Rect::new(f64::from(i) * 10.0, 0.0, 40.0, 40.0))
        .collect();
    let point = Point::new(1_000.0, 20.0);
    c.bench_function("rect_contains_256", |b| {
        b.iter(|| {
            black_box(
                rects
                    .iter()
                    .filter(|rect| rect.contains(black_box(point)))
                    .count(),
            )
        });
    });
}

criterion_group!(benches, bench_emit, bench_contains);
criterion_main!(benches);
