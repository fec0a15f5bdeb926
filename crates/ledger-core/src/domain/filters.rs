//! Query filters for the Query/Store port.
//!
//! Stores translate these into their own query language; the in-memory store
//! evaluates [`ContractFilter::matches`] and [`JobFilter::matches`] directly.

use super::{Contract, ContractId, Job, JobId, ProfileId};
use chrono::{DateTime, Utc};

/// Which side of a contract a profile must be on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Party {
    /// Client or contractor.
    Either(ProfileId),
    Client(ProfileId),
    Contractor(ProfileId),
}

impl Party {
    pub fn matches(&self, contract: &Contract) -> bool {
        match *self {
            Party::Either(id) => contract.is_party(id),
            Party::Client(id) => contract.client_id == id,
            Party::Contractor(id) => contract.contractor_id == id,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub id: Option<ContractId>,
    pub party: Option<Party>,
    pub exclude_terminated: bool,
}

impl ContractFilter {
    pub fn by_id(id: ContractId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn for_party(party: Party) -> Self {
        Self {
            party: Some(party),
            ..Default::default()
        }
    }

    pub fn party(mut self, party: Party) -> Self {
        self.party = Some(party);
        self
    }

    pub fn active(mut self) -> Self {
        self.exclude_terminated = true;
        self
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        self.id.map_or(true, |id| contract.id == id)
            && self.party.map_or(true, |p| p.matches(contract))
            && (!self.exclude_terminated || contract.is_active())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub id: Option<JobId>,
    /// Constrains the owning contract.
    pub party: Option<Party>,
    pub paid: Option<bool>,
    /// Only jobs whose contract is not terminated.
    pub active_contracts_only: bool,
    /// Inclusive window on `payment_date`. Implies a payment date is set.
    pub paid_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl JobFilter {
    pub fn by_id(id: JobId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn unpaid() -> Self {
        Self {
            paid: Some(false),
            ..Default::default()
        }
    }

    pub fn paid_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            paid: Some(true),
            paid_between: Some((start, end)),
            ..Default::default()
        }
    }

    pub fn party(mut self, party: Party) -> Self {
        self.party = Some(party);
        self
    }

    pub fn paid(mut self, paid: bool) -> Self {
        self.paid = Some(paid);
        self
    }

    pub fn active_contracts_only(mut self) -> Self {
        self.active_contracts_only = true;
        self
    }

    /// Evaluate against a job and its owning contract.
    pub fn matches(&self, job: &Job, contract: &Contract) -> bool {
        if job.contract_id != contract.id {
            return false;
        }
        let window_ok = match (self.paid_between, job.payment_date) {
            (None, _) => true,
            (Some((start, end)), Some(at)) => start <= at && at <= end,
            (Some(_), None) => false,
        };
        self.id.map_or(true, |id| job.id == id)
            && self.party.map_or(true, |p| p.matches(contract))
            && self.paid.map_or(true, |paid| job.paid == paid)
            && (!self.active_contracts_only || contract.is_active())
            && window_ok
    }
}
