//! Throughput benchmarks for the buffer pool and the record queue under
//! sustained acquire/release and enqueue/dequeue pressure.

use criterion::{criterion_group, criterion_main, Criterion};
use swiftlog::buffer::BufferPool;
use swiftlog::config::PoolConfig;

fn pool_acquire_release(c: &mut Criterion) {
    let pool = BufferPool::new(&PoolConfig {
        pool_size: 1024,
        buffer_size: 128,
        string_capacity: 32,
    });

    c.bench_function("pool_acquire_release", |b| {
        b.iter(|| {
            let handle = pool.try_acquire().expect("pool should not be exhausted");
            handle.release();
        })
    });
}

fn pool_acquire_write_release(c: &mut Criterion) {
    let pool = BufferPool::new(&PoolConfig {
        pool_size: 1024,
        buffer_size: 128,
        string_capacity: 32,
    });

    c.bench_function("pool_acquire_write_release", |b| {
        b.iter(|| {
            let mut handle = pool.try_acquire().expect("pool should not be exhausted");
            {
                let mut writer = handle.record_mut().writer();
                writer.append_i64(42);
                writer.append_string_ref("benchmark", None);
                let len = writer.len();
                let truncated = writer.truncated();
                handle.record_mut().finish(len, truncated);
            }
            handle.release();
        })
    });
}

criterion_group!(benches, pool_acquire_release, pool_acquire_write_release);
criterion_main!(benches);
