//! # Settlement Engine
//!
//! Pays a job: the client's balance is debited by the job price, the
//! contractor's balance is credited by the same amount, the contract's
//! settled total grows, and the job flips to paid with a payment date.
//!
//! ## Invariants
//!
//! - A job is settled at most once. The lookup only returns unpaid jobs and
//!   the store's job write is a compare-and-swap on the paid flag.
//! - Money is conserved: client debit equals contractor credit.
//! - The client balance never goes negative.
//! - Only the client on the owning contract may pay.
//!
//! `settle_job` must run inside [`LedgerStore::atomically`](crate::ports::LedgerStore::atomically):
//! the sufficiency check and the writes use the same fresh records, and any
//! error discards every staged write.

use super::{
    Contract, ContractFilter, JobFilter, Job, JobId, JobSettlement, LedgerError, Money, Party,
    Profile, ProfileId,
};
use crate::ports::LedgerTx;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Records as they stand after a successful settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub job: Job,
    pub contract: Contract,
    pub client: Profile,
    pub contractor: Profile,
}

impl Settlement {
    pub fn amount(&self) -> Money {
        self.job.price
    }
}

pub fn settle_job<T>(
    tx: &mut T,
    job_id: JobId,
    payer: ProfileId,
    now: DateTime<Utc>,
) -> Result<Settlement, LedgerError>
where
    T: LedgerTx + ?Sized,
{
    let filter = JobFilter::by_id(job_id)
        .party(Party::Client(payer))
        .paid(false);
    let job = tx
        .find_jobs(&filter)?
        .into_iter()
        .find(|j| j.id == job_id && !j.paid)
        .ok_or(LedgerError::NotFound("job"))?;

    let contract = tx
        .find_contract(&ContractFilter::by_id(job.contract_id))?
        .ok_or_else(|| {
            LedgerError::Internal(format!(
                "job {} references missing contract {}",
                job.id, job.contract_id
            ))
        })?;
    if contract.client_id != payer {
        return Err(LedgerError::NotFound("job"));
    }

    let mut client = tx
        .profile(payer)?
        .ok_or_else(|| LedgerError::Internal(format!("payer profile {payer} vanished")))?;
    let contractor = tx.profile(contract.contractor_id)?.ok_or_else(|| {
        LedgerError::Internal(format!(
            "contract {} references missing contractor {}",
            contract.id, contract.contractor_id
        ))
    })?;

    let price = job.price;
    if client.balance <= Money::ZERO || client.balance < price {
        return Err(LedgerError::InsufficientBalance {
            required: price,
            available: client.balance,
        });
    }

    client.balance -= price;
    // client == contractor: both writes target one record and net out.
    let mut contractor = if contractor.id == client.id {
        client.clone()
    } else {
        contractor
    };
    contractor.balance += price;
    if contractor.id == client.id {
        client = contractor.clone();
    }

    let mut contract = contract;
    contract.balance += price;

    let settlement = JobSettlement {
        paid: true,
        payment_date: now,
    };

    tx.update_profile_balance(client.id, client.balance)?;
    tx.update_profile_balance(contractor.id, contractor.balance)?;
    tx.update_contract_balance(contract.id, contract.balance)?;
    tx.update_job(job.id, settlement)?;

    Ok(Settlement {
        job: job.with_settlement(settlement),
        contract,
        client,
        contractor,
    })
}
