use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use drawpool::{
    BasicPool, Domain, LockPool, MemoryLedger, Minter, MinterConfig, ScriptedOracle, UniquePool,
    ed25519_dalek::SigningKey,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Identifiers drawn per benchmark iteration.
const TOTAL_IDS: u64 = 4096;

/// Drains a pool of `TOTAL_IDS` in batches of `batch`.
fn bench_pool<P>(c: &mut Criterion, group_name: &str, pool_factory: impl Fn(u64) -> P)
where
    P: UniquePool,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS));

    for batch in [1, 16, 256] {
        group.bench_function(format!("elems/{TOTAL_IDS}/batch/{batch}"), |b| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let mut pool = pool_factory(TOTAL_IDS);
                    for _ in 0..TOTAL_IDS / batch {
                        black_box(pool.try_draw(rng.random(), batch).unwrap());
                    }
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Drains one shared [`LockPool`] from several threads at once.
fn bench_pool_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/contended/lock");

    for thread_count in [1, 2, 4, 8] {
        let draws_per_thread = TOTAL_IDS / thread_count;
        group.throughput(Throughput::Elements(TOTAL_IDS));
        group.bench_function(
            format!("elems/{TOTAL_IDS}/threads/{thread_count}"),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();
                    for _ in 0..iters {
                        let pool = LockPool::new(TOTAL_IDS);
                        let barrier = Arc::new(Barrier::new(thread_count as usize + 1));
                        scope(|s| {
                            for t in 0..thread_count {
                                let mut pool = pool.clone();
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    let mut rng = StdRng::seed_from_u64(t);
                                    barrier.wait();
                                    for _ in 0..draws_per_thread {
                                        black_box(pool.try_draw(rng.random(), 1).unwrap());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }
                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// Full request/fulfill round trips, signature verification included.
fn bench_mint_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("minter/round_trip");
    let issuer = SigningKey::from_bytes(&[7; 32]);
    let caller = drawpool::Identity::from(&issuer.verifying_key());
    const REQUESTS: u64 = 256;
    const AMOUNT: u64 = 4;

    group.throughput(Throughput::Elements(REQUESTS));
    group.bench_function(format!("requests/{REQUESTS}/amount/{AMOUNT}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = core::time::Duration::ZERO;
            for _ in 0..iters {
                let config = MinterConfig {
                    capacity: REQUESTS * AMOUNT,
                    per_call_ceiling: AMOUNT,
                    in_flight_slack: 0,
                    domain: Domain::new([1; 32], 1),
                    signer: issuer.verifying_key(),
                };
                let mut minter = Minter::new(config, ScriptedOracle::new(), MemoryLedger::new());

                let start = Instant::now();
                for word in 0..REQUESTS {
                    let signature = minter
                        .authorization_message(caller, AMOUNT, None)
                        .sign(&issuer);
                    let id = minter
                        .request_mint(caller, AMOUNT, None, &signature)
                        .unwrap();
                    black_box(minter.fulfill(id, &[word.wrapping_mul(0x9E37_79B9)]).unwrap());
                }
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

#[cfg(feature = "async-tokio")]
fn bench_mint_actor_tokio(c: &mut Criterion) {
    use drawpool::{ChannelOracle, spawn_minter};
    use tokio::runtime::Builder;

    let mut group = c.benchmark_group("minter/actor/tokio");
    let issuer = SigningKey::from_bytes(&[7; 32]);
    let caller = drawpool::Identity::from(&issuer.verifying_key());
    const REQUESTS: u64 = 256;

    group.throughput(Throughput::Elements(REQUESTS));
    group.bench_function(format!("requests/{REQUESTS}"), |b| {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .build()
            .unwrap();

        b.to_async(&rt).iter_custom(|iters| {
            let issuer = issuer.clone();
            async move {
                let start = Instant::now();
                for _ in 0..iters {
                    let config = MinterConfig {
                        capacity: REQUESTS,
                        per_call_ceiling: 1,
                        in_flight_slack: 0,
                        domain: Domain::default(),
                        signer: issuer.verifying_key(),
                    };
                    let (oracle, mut requests) = ChannelOracle::new();
                    let (handle, task) = spawn_minter(
                        Minter::new(config, oracle, MemoryLedger::new()),
                        64,
                    );
                    for _ in 0..REQUESTS {
                        let message = handle
                            .authorization_message(caller, 1, None)
                            .await
                            .unwrap();
                        handle
                            .request_mint(caller, 1, None, message.sign(&issuer).to_vec())
                            .await
                            .unwrap();
                        let request = requests.recv().await.unwrap();
                        black_box(handle.fulfill(request.id, vec![request.id.0]).await.unwrap());
                    }
                    handle.shutdown().await.unwrap();
                    task.await.unwrap();
                }
                start.elapsed()
            }
        });
    });

    group.finish();
}

fn benchmark_pool_basic(c: &mut Criterion) {
    bench_pool(c, "pool/sequential/basic", BasicPool::new);
}

fn benchmark_pool_lock(c: &mut Criterion) {
    bench_pool(c, "pool/sequential/lock", LockPool::new);
}

criterion_group!(
    benches,
    benchmark_pool_basic,
    benchmark_pool_lock,
    bench_pool_contended,
    bench_mint_round_trip,
);

#[cfg(feature = "async-tokio")]
criterion_group!(async_benches, bench_mint_actor_tokio);

#[cfg(feature = "async-tokio")]
criterion_main!(benches, async_benches);
#[cfg(not(feature = "async-tokio"))]
criterion_main!(benches);
