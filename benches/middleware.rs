// benches/middleware.rs

use std::convert::Infallible;
use std::hint::black_box;

use baton::{Middleware, Next};
use criterion::{criterion_group, criterion_main, Criterion};
use futures_executor::LocalPool;

fn bench_synchronous_continue(c: &mut Criterion) {
  let pool = LocalPool::new();
  let mw = Middleware::new(
    |n: u64, _response: (), _progress| async move {
      Ok::<_, Infallible>(if black_box(n) == 0 { "" } else { "next" })
    },
    pool.spawner(),
  );

  c.bench_function("middleware_sync_continue", |b| {
    b.iter(|| {
      mw.call(
        black_box(1u64),
        (),
        Some(Next::new(|fault| {
          assert!(fault.is_none());
        })),
      )
      .unwrap();
    });
  });
}

fn bench_synchronous_stop(c: &mut Criterion) {
  let pool = LocalPool::new();
  let mw = Middleware::new(
    |n: u64, _response: (), _progress| async move {
      Ok::<_, Infallible>(if black_box(n) == 0 { "" } else { "next" })
    },
    pool.spawner(),
  );

  c.bench_function("middleware_sync_stop", |b| {
    b.iter(|| {
      mw.call(
        black_box(0u64),
        (),
        Some(Next::new(|fault: Option<baton::Fault<Infallible>>| {
          panic!("continuation must stay silent, got {fault:?}")
        })),
      )
      .unwrap();
    });
  });
}

criterion_group!(benches, bench_synchronous_continue, bench_synchronous_stop);
criterion_main!(benches);
