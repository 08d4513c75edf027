use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use foundation_gates::{
    BoundedQueue, GuardedCapacityPool, GuardedCountPool, ReadersWritersLock, RwPolicy,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Uncontended enter/leave cost of both pools.
fn bench_pool_uncontended(c: &mut Criterion) {
    let capacity = GuardedCapacityPool::new(300).unwrap();
    c.bench_function("capacity_pool_enter_leave_uncontended", |b| {
        b.iter(|| {
            capacity.enter(black_box(60)).unwrap();
            capacity.leave(black_box(60)).unwrap();
        });
    });

    let count = GuardedCountPool::new(5).unwrap();
    c.bench_function("count_pool_enter_leave_uncontended", |b| {
        b.iter(|| {
            count.enter().unwrap();
            count.leave().unwrap();
        });
    });
}

/// Draining a backlog of waiters: the capacity pool broadcasts on every
/// leave, the count pool signals one waiter at a time.
fn bench_wake_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_wake_policy");

    for waiters in [10, 50] {
        group.bench_function(format!("broadcast_{waiters}_waiters"), |b| {
            b.iter_batched(
                || Arc::new(GuardedCapacityPool::new(1).unwrap()),
                |pool| {
                    pool.enter(1).unwrap();
                    let handles: Vec<_> = (0..waiters)
                        .map(|_| {
                            let pool = Arc::clone(&pool);
                            thread::spawn(move || {
                                pool.enter(1).unwrap();
                                pool.leave(1).unwrap();
                            })
                        })
                        .collect();
                    thread::sleep(Duration::from_millis(5));
                    pool.leave(1).unwrap();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("signal_one_{waiters}_waiters"), |b| {
            b.iter_batched(
                || Arc::new(GuardedCountPool::new(1).unwrap()),
                |pool| {
                    pool.enter().unwrap();
                    let handles: Vec<_> = (0..waiters)
                        .map(|_| {
                            let pool = Arc::clone(&pool);
                            thread::spawn(move || {
                                pool.enter().unwrap();
                                pool.leave().unwrap();
                            })
                        })
                        .collect();
                    thread::sleep(Duration::from_millis(5));
                    pool.leave().unwrap();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Items per second through a 12-slot buffer with one producer and one
/// consumer.
fn bench_queue_throughput(c: &mut Criterion) {
    c.bench_function("bounded_queue_spsc_1000_items", |b| {
        b.iter_batched(
            || Arc::new(BoundedQueue::new(12).unwrap()),
            |queue| {
                let producer = {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        for item in 0..1000_u64 {
                            queue.put(item).unwrap();
                        }
                    })
                };
                let mut sum = 0;
                for _ in 0..1000 {
                    sum += queue.take().unwrap();
                }
                producer.join().unwrap();
                black_box(sum)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Seven readers to one writer under both policies.
fn bench_rwlock_read_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("rwlock_read_heavy");

    for policy in [RwPolicy::ReaderPreference, RwPolicy::WriterPreference] {
        group.bench_function(format!("{policy:?}"), |b| {
            b.iter_batched(
                || Arc::new(ReadersWritersLock::new(policy)),
                |lock| {
                    let handles: Vec<_> = (0..8)
                        .map(|thread_id| {
                            let lock = Arc::clone(&lock);
                            thread::spawn(move || {
                                for _ in 0..200 {
                                    if thread_id == 0 {
                                        drop(lock.write().unwrap());
                                    } else {
                                        drop(lock.read().unwrap());
                                    }
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pool_uncontended,
    bench_wake_policy,
    bench_queue_throughput,
    bench_rwlock_read_heavy
);
criterion_main!(benches);
