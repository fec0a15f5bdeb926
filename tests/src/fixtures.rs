//! Synthetic marketplaces for load and race tests.

use chrono::{Duration, TimeZone, Utc};
use ledger_core::{
    Contract, ContractId, ContractStatus, Fixture, Job, JobId, Money, Profile, ProfileId,
    ProfileKind,
};

const PROFESSIONS: [&str; 4] = ["Programmer", "Musician", "Fighter", "Designer"];

/// Shape of a generated marketplace.
#[derive(Debug, Clone, Copy)]
pub struct MarketplaceShape {
    pub clients: i64,
    pub contractors: i64,
    /// Contracts held by each client, spread round-robin over contractors.
    pub contracts_per_client: i64,
    pub jobs_per_contract: i64,
    /// Every n-th job is already paid.
    pub paid_every: i64,
}

impl Default for MarketplaceShape {
    fn default() -> Self {
        Self {
            clients: 50,
            contractors: 20,
            contracts_per_client: 4,
            jobs_per_contract: 5,
            paid_every: 2,
        }
    }
}

/// Deterministic marketplace. Client ids start at 1, contractor ids follow
/// them, and the last profile is an admin. Paid jobs are spread one hour
/// apart starting 2024-01-01T00:00:00Z.
pub fn marketplace(shape: MarketplaceShape) -> Fixture {
    let mut fixture = Fixture::default();
    let contractor_base = shape.clients;

    for id in 1..=shape.clients {
        fixture.profiles.push(Profile {
            id: ProfileId(id),
            first_name: format!("Client{id}"),
            last_name: "Load".to_string(),
            profession: "Buyer".to_string(),
            balance: Money::from(10_000),
            kind: ProfileKind::Client,
            admin: false,
        });
    }
    for n in 1..=shape.contractors {
        fixture.profiles.push(Profile {
            id: ProfileId(contractor_base + n),
            first_name: format!("Contractor{n}"),
            last_name: "Load".to_string(),
            profession: PROFESSIONS[(n as usize) % PROFESSIONS.len()].to_string(),
            balance: Money::ZERO,
            kind: ProfileKind::Contractor,
            admin: false,
        });
    }
    fixture.profiles.push(Profile {
        id: ProfileId(admin_id(shape)),
        first_name: "Load".to_string(),
        last_name: "Admin".to_string(),
        profession: "Auditor".to_string(),
        balance: Money::ZERO,
        kind: ProfileKind::Client,
        admin: true,
    });

    let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
    let mut contract_id = 0;
    let mut job_id = 0;
    for client in 1..=shape.clients {
        for k in 0..shape.contracts_per_client {
            contract_id += 1;
            let contractor = contractor_base + 1 + (client + k) % shape.contractors;
            fixture.contracts.push(Contract {
                id: ContractId(contract_id),
                terms: "load".to_string(),
                status: ContractStatus::InProgress,
                client_id: ProfileId(client),
                contractor_id: ProfileId(contractor),
                balance: Money::ZERO,
            });

            for _ in 0..shape.jobs_per_contract {
                job_id += 1;
                let paid = shape.paid_every > 0 && job_id % shape.paid_every == 0;
                let payment_date = if paid {
                    epoch.map(|e| e + Duration::hours(job_id))
                } else {
                    None
                };
                fixture.jobs.push(Job {
                    id: JobId(job_id),
                    description: format!("job {job_id}"),
                    price: Money::from(10 + job_id % 90),
                    paid: payment_date.is_some(),
                    payment_date,
                    contract_id: ContractId(contract_id),
                });
            }
        }
    }

    fixture
}

pub fn admin_id(shape: MarketplaceShape) -> i64 {
    shape.clients + shape.contractors + 1
}

/// Unpaid jobs of `fixture`, in id order.
pub fn unpaid_jobs(fixture: &Fixture) -> Vec<&Job> {
    fixture.jobs.iter().filter(|j| !j.paid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_shape() {
        let shape = MarketplaceShape::default();
        let fixture = marketplace(shape);
        assert_eq!(fixture.profiles.len() as i64, shape.clients + shape.contractors + 1);
        assert_eq!(fixture.contracts.len() as i64, shape.clients * shape.contracts_per_client);
        assert_eq!(
            fixture.jobs.len() as i64,
            shape.clients * shape.contracts_per_client * shape.jobs_per_contract
        );
        assert_eq!(unpaid_jobs(&fixture).len() * 2, fixture.jobs.len());
        assert!(fixture.profiles.last().map(|p| p.admin).unwrap_or(false));
    }
}
