//! # Concurrency Races
//!
//! Every mutating ledger operation must behave as if the calls ran one after
//! another: a job is paid at most once, balances never go negative and no
//! balance update is lost. Each scenario runs against every backend.

use super::{Backend, Harness, ALL_BACKENDS};
use ledger_core::{JobId, LedgerApi, LedgerError, Money, Settlement};
use rust_decimal_macros::dec;
use std::sync::{Arc, Barrier};
use std::thread;

type Racer<'a, T> = Box<dyn FnOnce() -> T + Send + 'a>;

fn balance(api: &Arc<dyn LedgerApi>, id: &str) -> Money {
    api.authenticate(Some(id)).unwrap().balance
}

/// Run every closure on its own thread, released together.
fn race<T, F>(jobs: Vec<F>) -> Vec<T>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    let barrier = Barrier::new(jobs.len());
    thread::scope(|s| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    job()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

fn pay(api: &Arc<dyn LedgerApi>, client: &str, job: i64) -> Result<Settlement, LedgerError> {
    let caller = api.authenticate(Some(client))?;
    api.pay_job(&caller, JobId(job))
}

fn deposit(api: &Arc<dyn LedgerApi>, client: &str, amount: f64) -> Result<Money, LedgerError> {
    let caller = api.authenticate(Some(client))?;
    api.deposit(&caller, client, Some(amount))
}

#[test]
fn test_same_job_is_paid_exactly_once() {
    for backend in ALL_BACKENDS {
        let harness = Harness::new(backend, 8);
        let results = race(
            harness
                .handles
                .iter()
                .map(|api| move || pay(api, "1", 2))
                .collect(),
        );

        let paid = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(paid, 1, "{backend:?}: {results:?}");
        for result in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(result, LedgerError::NotFound(_) | LedgerError::Conflict(_)),
                "{backend:?}: {result:?}"
            );
        }

        let api = harness.api();
        assert_eq!(balance(api, "1"), dec!(949), "{backend:?}");
        assert_eq!(balance(api, "6"), dec!(1415), "{backend:?}");
    }
}

#[test]
fn test_balance_never_goes_negative() {
    // Mr Robot holds 231.11 and owes 202 (job 3) and 200 (job 4).
    for backend in ALL_BACKENDS {
        let harness = Harness::new(backend, 2);
        let (a, b) = (&harness.handles[0], &harness.handles[1]);
        let racers: Vec<Racer<'_, Result<Settlement, LedgerError>>> = vec![
            Box::new(move || pay(a, "2", 3)),
            Box::new(move || pay(b, "2", 4)),
        ];
        let results = race(racers);

        let winners: Vec<&Settlement> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "{backend:?}: {results:?}");
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::InsufficientBalance { .. })));

        let expected = dec!(231.11) - winners[0].amount();
        assert_eq!(balance(harness.api(), "2"), expected, "{backend:?}");
        assert!(expected >= Money::ZERO);
    }
}

#[test]
fn test_no_lost_updates_on_shared_contractor() {
    // Linus (6) is paid by Harry (job 2) and Mr Robot (job 3) while Ash
    // tops up four times.
    for backend in ALL_BACKENDS {
        let harness = Harness::new(backend, 6);
        let h = &harness.handles;
        let racers: Vec<Racer<'_, Result<(), LedgerError>>> = vec![
            Box::new(move || pay(&h[0], "1", 2).map(|_| ())),
            Box::new(move || pay(&h[1], "2", 3).map(|_| ())),
            Box::new(move || deposit(&h[2], "4", 10.0).map(|_| ())),
            Box::new(move || deposit(&h[3], "4", 10.0).map(|_| ())),
            Box::new(move || deposit(&h[4], "4", 10.0).map(|_| ())),
            Box::new(move || deposit(&h[5], "4", 10.0).map(|_| ())),
        ];
        let results = race(racers);
        assert!(results.iter().all(|r| r.is_ok()), "{backend:?}: {results:?}");

        let api = harness.api();
        assert_eq!(balance(api, "6"), dec!(1617), "{backend:?}");
        assert_eq!(balance(api, "1"), dec!(949), "{backend:?}");
        assert_eq!(balance(api, "2"), dec!(29.11), "{backend:?}");
        assert_eq!(balance(api, "4"), dec!(41.3), "{backend:?}");
    }
}

#[test]
fn test_deposit_cap_sees_serialized_outstanding() {
    // Harry owes 401 (cap 100.25). Paying job 2 drops the cap to 50, so an
    // 80 deposit is accepted only if it lands before the settlement.
    for backend in ALL_BACKENDS {
        for _ in 0..5 {
            let harness = Harness::new(backend, 2);
            let (a, b) = (&harness.handles[0], &harness.handles[1]);
            let (paid, deposited) = thread::scope(|s| {
                let barrier = Arc::new(Barrier::new(2));
                let b1 = Arc::clone(&barrier);
                let payer = s.spawn(move || {
                    b1.wait();
                    pay(a, "1", 2)
                });
                let depositor = s.spawn(move || {
                    barrier.wait();
                    deposit(b, "1", 80.0)
                });
                (payer.join().unwrap(), depositor.join().unwrap())
            });

            assert!(paid.is_ok(), "{backend:?}: {paid:?}");
            let final_balance = balance(harness.api(), "1");
            match deposited {
                Ok(after_deposit) => {
                    assert_eq!(after_deposit, dec!(1230), "{backend:?}");
                    assert_eq!(final_balance, dec!(1029), "{backend:?}");
                }
                Err(LedgerError::Forbidden(_)) => {
                    assert_eq!(final_balance, dec!(949), "{backend:?}");
                }
                Err(other) => panic!("{backend:?}: unexpected {other:?}"),
            }
        }
    }
}

#[test]
fn test_paid_job_leaves_unpaid_listing_under_contention() {
    for backend in [Backend::Memory, Backend::SqlitePerHandle] {
        let harness = Harness::new(backend, 4);
        let h = &harness.handles;
        let racers: Vec<Racer<'_, Result<(), LedgerError>>> = vec![
            Box::new(move || pay(&h[0], "4", 5).map(|_| ())),
            Box::new(move || deposit(&h[1], "4", 50.0).map(|_| ())),
            Box::new(move || {
                let caller = h[2].authenticate(Some("7"))?;
                h[2].list_unpaid_jobs(&caller).map(|_| ())
            }),
            Box::new(move || {
                let caller = h[3].authenticate(Some("4"))?;
                h[3].list_contracts(&caller).map(|_| ())
            }),
        ];
        let results = race(racers);

        // Ash can never afford job 5 (200), deposit or not.
        assert!(matches!(
            results[0],
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(results[1..].iter().all(|r| r.is_ok()), "{backend:?}: {results:?}");

        let alan = harness.api().authenticate(Some("7")).unwrap();
        let unpaid = harness.api().list_unpaid_jobs(&alan).unwrap();
        assert!(unpaid.iter().any(|j| j.id == JobId(5)));
        assert_eq!(balance(harness.api(), "4"), dec!(51.3));
    }
}
