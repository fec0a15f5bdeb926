//! In-memory ledger.
//!
//! Single-writer discipline: one mutex guards all state for the whole unit of
//! work, so units are serialized. Writes are staged in an overlay and applied
//! only when the unit returns `Ok`.

use crate::domain::{
    Contract, ContractFilter, ContractId, Job, JobFilter, JobId, JobSettlement, LedgerError,
    Money, Profile, ProfileId,
};
use crate::ports::{LedgerStore, LedgerTx, LedgerView, ProfileDirectory, SeedTarget};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct LedgerState {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
}

/// Writes staged by one unit of work.
#[derive(Default)]
struct Staged {
    profile_balances: HashMap<ProfileId, Money>,
    contract_balances: HashMap<ContractId, Money>,
    jobs: HashMap<JobId, JobSettlement>,
}

impl Staged {
    fn apply(self, state: &mut LedgerState) {
        for (id, balance) in self.profile_balances {
            if let Some(profile) = state.profiles.get_mut(&id) {
                profile.balance = balance;
            }
        }
        for (id, balance) in self.contract_balances {
            if let Some(contract) = state.contracts.get_mut(&id) {
                contract.balance = balance;
            }
        }
        for (id, settlement) in self.jobs {
            if let Some(job) = state.jobs.remove(&id) {
                state.jobs.insert(id, job.with_settlement(settlement));
            }
        }
    }
}

/// View over committed state plus this unit's staged writes.
struct MemoryTx<'a> {
    state: &'a LedgerState,
    staged: Staged,
}

impl<'a> MemoryTx<'a> {
    fn new(state: &'a LedgerState) -> Self {
        Self {
            state,
            staged: Staged::default(),
        }
    }

    fn contract(&self, id: ContractId) -> Option<Contract> {
        self.state.contracts.get(&id).map(|c| {
            let mut c = c.clone();
            if let Some(balance) = self.staged.contract_balances.get(&id) {
                c.balance = *balance;
            }
            c
        })
    }

    fn job(&self, job: &Job) -> Job {
        match self.staged.jobs.get(&job.id) {
            Some(settlement) => job.clone().with_settlement(*settlement),
            None => job.clone(),
        }
    }
}

impl LedgerView for MemoryTx<'_> {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, LedgerError> {
        Ok(self.state.profiles.get(&id).map(|p| {
            let mut p = p.clone();
            if let Some(balance) = self.staged.profile_balances.get(&id) {
                p.balance = *balance;
            }
            p
        }))
    }

    fn find_contract(&self, filter: &ContractFilter) -> Result<Option<Contract>, LedgerError> {
        Ok(self.find_contracts(filter)?.into_iter().next())
    }

    fn find_contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, LedgerError> {
        Ok(self
            .state
            .contracts
            .keys()
            .filter_map(|id| self.contract(*id))
            .filter(|c| filter.matches(c))
            .collect())
    }

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, LedgerError> {
        let mut jobs = Vec::new();
        for job in self.state.jobs.values() {
            let job = self.job(job);
            let Some(contract) = self.contract(job.contract_id) else {
                continue;
            };
            if filter.matches(&job, &contract) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}

impl LedgerTx for MemoryTx<'_> {
    fn update_profile_balance(&mut self, id: ProfileId, balance: Money) -> Result<(), LedgerError> {
        if !self.state.profiles.contains_key(&id) {
            return Err(LedgerError::Internal(format!("no profile {id} to update")));
        }
        self.staged.profile_balances.insert(id, balance);
        Ok(())
    }

    fn update_job(&mut self, id: JobId, settlement: JobSettlement) -> Result<(), LedgerError> {
        let job = self
            .state
            .jobs
            .get(&id)
            .ok_or_else(|| LedgerError::Internal(format!("no job {id} to update")))?;
        if self.job(job).paid {
            return Err(LedgerError::Conflict(format!("job {id} is already paid")));
        }
        self.staged.jobs.insert(id, settlement);
        Ok(())
    }

    fn update_contract_balance(&mut self, id: ContractId, balance: Money) -> Result<(), LedgerError> {
        if !self.state.contracts.contains_key(&id) {
            return Err(LedgerError::Internal(format!("no contract {id} to update")));
        }
        self.staged.contract_balances.insert(id, balance);
        Ok(())
    }
}

/// In-memory implementation of the ledger ports for tests and demo runs.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedger {
    fn read<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&dyn LedgerView) -> Result<T, LedgerError>,
    {
        let state = self.state.lock();
        let view = MemoryTx::new(&state);
        f(&view)
    }

    fn atomically<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, LedgerError>,
    {
        let mut state = self.state.lock();
        let (result, staged) = {
            let mut tx = MemoryTx::new(&state);
            let result = f(&mut tx);
            (result, tx.staged)
        };
        if result.is_ok() {
            staged.apply(&mut state);
        }
        result
    }
}

impl ProfileDirectory for InMemoryLedger {
    fn resolve(&self, credential: &str) -> Result<Option<Profile>, LedgerError> {
        let Ok(id) = credential.parse::<ProfileId>() else {
            return Ok(None);
        };
        Ok(self.state.lock().profiles.get(&id).cloned())
    }
}

impl SeedTarget for InMemoryLedger {
    fn insert_profile(&self, profile: Profile) -> Result<(), LedgerError> {
        self.state.lock().profiles.insert(profile.id, profile);
        Ok(())
    }

    fn insert_contract(&self, contract: Contract) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        for party in [contract.client_id, contract.contractor_id] {
            if !state.profiles.contains_key(&party) {
                return Err(LedgerError::BadRequest(format!(
                    "contract {} references unknown profile {party}",
                    contract.id
                )));
            }
        }
        state.contracts.insert(contract.id, contract);
        Ok(())
    }

    fn insert_job(&self, job: Job) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        if !state.contracts.contains_key(&job.contract_id) {
            return Err(LedgerError::BadRequest(format!(
                "job {} references unknown contract {}",
                job.id, job.contract_id
            )));
        }
        state.jobs.insert(job.id, job);
        Ok(())
    }
}
