// benches/counting_gate.rs

use std::hint::black_box;

use baton::CountingGate;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_uncontended_cycle(c: &mut Criterion) {
  let gate = CountingGate::new(1);
  c.bench_function("gate_enter_leave_uncontended", |b| {
    b.iter(|| {
      gate.enter(|| black_box(()));
      gate.leave();
    });
  });
}

fn bench_queue_and_drain(c: &mut Criterion) {
  const QUEUED: usize = 64;
  c.bench_function("gate_queue_and_drain_64", |b| {
    b.iter(|| {
      let gate = CountingGate::new(1);
      gate.enter(|| {});
      for _ in 0..QUEUED {
        gate.enter(|| black_box(()));
      }
      for _ in 0..=QUEUED {
        gate.leave();
      }
      black_box(gate.available())
    });
  });
}

criterion_group!(benches, bench_uncontended_cycle, bench_queue_and_drain);
criterion_main!(benches);
