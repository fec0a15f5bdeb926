//! # Ledger Benchmarks
//!
//! | Operation | Store | Shape |
//! |-----------|-------|-------|
//! | pay_job | memory, SQLite | one settlement on a 1k-job marketplace |
//! | deposit | memory, SQLite | cap check over the client's outstanding jobs |
//! | best_clients | memory, SQLite | aggregation over 500 / 5k paid jobs |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ledger_core::{
    seed_store, Fixture, InMemoryLedger, JobId, LedgerApi, LedgerService, SqliteLedger,
};
use ledger_tests::fixtures::{admin_id, marketplace, unpaid_jobs, MarketplaceShape};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn memory_api(fixture: &Fixture) -> Arc<dyn LedgerApi> {
    let store = Arc::new(InMemoryLedger::new());
    seed_store(store.as_ref(), fixture).unwrap();
    Arc::new(LedgerService::from_store(store))
}

fn sqlite_api(fixture: &Fixture) -> (Arc<dyn LedgerApi>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteLedger::open(&dir.path().join("bench.db")).unwrap());
    seed_store(store.as_ref(), fixture).unwrap();
    (Arc::new(LedgerService::from_store(store)), dir)
}

fn bench_settlement(c: &mut Criterion) {
    let mut group = c.benchmark_group("settlement");
    group.measurement_time(Duration::from_secs(10));

    let fixture = marketplace(MarketplaceShape::default());
    let targets: Vec<(String, JobId)> = unpaid_jobs(&fixture)
        .iter()
        .filter_map(|job| {
            let contract = fixture.contracts.iter().find(|c| c.id == job.contract_id)?;
            Some((contract.client_id.get().to_string(), job.id))
        })
        .collect();

    group.bench_function("pay_job_memory", |b| {
        b.iter_batched(
            || memory_api(&fixture),
            |api| {
                let (client, job) = &targets[0];
                let caller = api.authenticate(Some(client)).unwrap();
                black_box(api.pay_job(&caller, *job).unwrap())
            },
            BatchSize::SmallInput,
        )
    });

    // One database, paying through the unpaid jobs in order.
    let (api, _dir) = sqlite_api(&fixture);
    let mut next = targets.iter().cycle();
    group.bench_function("pay_job_sqlite", |b| {
        b.iter(|| {
            let Some((client, job)) = next.next() else {
                return;
            };
            let caller = api.authenticate(Some(client)).unwrap();
            // Later cycles hit already paid jobs and measure the rejection path.
            let _ = black_box(api.pay_job(&caller, *job));
        })
    });

    group.finish();
}

fn bench_deposit(c: &mut Criterion) {
    let mut group = c.benchmark_group("deposit");

    let fixture = marketplace(MarketplaceShape::default());
    let memory = memory_api(&fixture);
    let (sqlite, _dir) = sqlite_api(&fixture);

    for (name, api) in [("memory", &memory), ("sqlite", &sqlite)] {
        let caller = api.authenticate(Some("1")).unwrap();
        group.bench_function(BenchmarkId::new("deposit_cent", name), |b| {
            b.iter(|| black_box(api.deposit(&caller, "1", Some(0.01)).unwrap()))
        });
    }

    group.finish();
}

fn bench_reporting(c: &mut Criterion) {
    let mut group = c.benchmark_group("reporting");
    group.measurement_time(Duration::from_secs(10));

    for clients in [50, 500] {
        let shape = MarketplaceShape {
            clients,
            ..MarketplaceShape::default()
        };
        let fixture = marketplace(shape);
        let paid = fixture.jobs.iter().filter(|j| j.paid).count();
        let admin_key = admin_id(shape).to_string();

        let memory = memory_api(&fixture);
        let (sqlite, _dir) = sqlite_api(&fixture);

        for (name, api) in [("memory", &memory), ("sqlite", &sqlite)] {
            let admin = api.authenticate(Some(&admin_key)).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("best_clients_{name}"), paid),
                &admin,
                |b, admin| {
                    b.iter(|| {
                        black_box(
                            api.best_clients(admin, Some("2024-01-01"), Some("2030-01-01"), Some("10"))
                                .unwrap(),
                        )
                    })
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("best_profession_{name}"), paid),
                &admin,
                |b, admin| {
                    b.iter(|| {
                        black_box(
                            api.best_profession(admin, Some("2024-01-01"), Some("2030-01-01"))
                                .unwrap(),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_settlement, bench_deposit, bench_reporting);
criterion_main!(benches);
