//! Demo dataset.
//!
//! Eight marketplace profiles, nine contracts and fifteen jobs, plus one
//! admin profile (id 9) for the reporting endpoints.

use crate::domain::{
    Contract, ContractId, ContractStatus, Job, JobId, LedgerError, Money, Profile, ProfileId,
    ProfileKind,
};
use crate::ports::SeedTarget;
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use tracing::info;

/// Records to load, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Fixture {
    pub profiles: Vec<Profile>,
    pub contracts: Vec<Contract>,
    pub jobs: Vec<Job>,
}

fn at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn profile(
    id: i64,
    first_name: &str,
    last_name: &str,
    profession: &str,
    balance: Money,
    kind: ProfileKind,
) -> Profile {
    Profile {
        id: ProfileId(id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        profession: profession.to_string(),
        balance,
        kind,
        admin: false,
    }
}

fn contract(id: i64, status: ContractStatus, client: i64, contractor: i64) -> Contract {
    Contract {
        id: ContractId(id),
        terms: "bla bla bla".to_string(),
        status,
        client_id: ProfileId(client),
        contractor_id: ProfileId(contractor),
        balance: Money::ZERO,
    }
}

fn job(id: i64, price: Money, contract: i64, paid_at: Option<&str>) -> Job {
    let payment_date = paid_at.and_then(at);
    Job {
        id: JobId(id),
        description: "work".to_string(),
        price,
        paid: payment_date.is_some(),
        payment_date,
        contract_id: ContractId(contract),
    }
}

pub fn demo_fixture() -> Fixture {
    use ContractStatus::{InProgress, New, Terminated};
    use ProfileKind::{Client, Contractor};

    let mut admin = profile(9, "Grace", "Hopper", "Auditor", dec!(0), Client);
    admin.admin = true;

    Fixture {
        profiles: vec![
            profile(1, "Harry", "Potter", "Wizard", dec!(1150), Client),
            profile(2, "Mr", "Robot", "Hacker", dec!(231.11), Client),
            profile(3, "John", "Snow", "Knows nothing", dec!(451.3), Client),
            profile(4, "Ash", "Kethcum", "Pokemon master", dec!(1.3), Client),
            profile(5, "John", "Lenon", "Musician", dec!(64), Contractor),
            profile(6, "Linus", "Torvalds", "Programmer", dec!(1214), Contractor),
            profile(7, "Alan", "Turing", "Programmer", dec!(22), Contractor),
            profile(8, "Aragorn", "II Elessar Telcontarion", "Fighter", dec!(314), Contractor),
            admin,
        ],
        contracts: vec![
            contract(1, Terminated, 1, 5),
            contract(2, InProgress, 1, 6),
            contract(3, InProgress, 2, 6),
            contract(4, InProgress, 2, 7),
            contract(5, New, 3, 8),
            contract(6, InProgress, 3, 7),
            contract(7, InProgress, 4, 7),
            contract(8, InProgress, 4, 6),
            contract(9, InProgress, 4, 8),
        ],
        jobs: vec![
            job(1, dec!(200), 1, None),
            job(2, dec!(201), 2, None),
            job(3, dec!(202), 3, None),
            job(4, dec!(200), 4, None),
            job(5, dec!(200), 7, None),
            job(6, dec!(2020), 7, Some("2020-08-15T19:11:26.737Z")),
            job(7, dec!(200), 2, Some("2020-08-15T19:11:26.737Z")),
            job(8, dec!(200), 3, Some("2020-08-16T19:11:26.737Z")),
            job(9, dec!(200), 1, Some("2020-08-17T19:11:26.737Z")),
            job(10, dec!(200), 5, Some("2020-08-17T19:11:26.737Z")),
            job(11, dec!(21), 1, Some("2020-08-10T19:11:26.737Z")),
            job(12, dec!(21), 2, Some("2020-08-15T19:11:26.737Z")),
            job(13, dec!(121), 3, Some("2020-08-15T19:11:26.737Z")),
            job(14, dec!(121), 3, Some("2020-08-14T23:11:26.737Z")),
            job(15, dec!(500), 4, None),
        ],
    }
}

/// Load `fixture` into `store`: profiles, then contracts, then jobs.
pub fn seed_store<S>(store: &S, fixture: &Fixture) -> Result<(), LedgerError>
where
    S: SeedTarget + ?Sized,
{
    for profile in &fixture.profiles {
        store.insert_profile(profile.clone())?;
    }
    for contract in &fixture.contracts {
        store.insert_contract(contract.clone())?;
    }
    for job in &fixture.jobs {
        store.insert_job(job.clone())?;
    }
    info!(
        profiles = fixture.profiles.len(),
        contracts = fixture.contracts.len(),
        jobs = fixture.jobs.len(),
        "Ledger seeded"
    );
    Ok(())
}
