//! Ledger service - binds the feature components to a store, a profile
//! directory and a clock, and exposes them through [`LedgerApi`].

use crate::domain::{
    access, apply_deposit, authenticate, best_clients, best_profession, parse_limit,
    require_admin, settle_job, ClientTotal, Contract, ContractId, Job, JobId, LedgerError, Money,
    Profile, ReportWindow, Settlement,
};
use crate::ports::{Clock, LedgerApi, LedgerStore, ProfileDirectory, SystemClock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ledger service over a concrete store.
pub struct LedgerService<S: LedgerStore> {
    store: Arc<S>,
    directory: Arc<dyn ProfileDirectory>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: LedgerStore + 'static> LedgerService<S> {
    pub fn new(store: Arc<S>, directory: Arc<dyn ProfileDirectory>) -> Self {
        Self {
            store,
            directory,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the payment-date source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S> LedgerService<S>
where
    S: LedgerStore + ProfileDirectory + 'static,
{
    /// Service whose store also resolves credentials.
    pub fn from_store(store: Arc<S>) -> Self {
        let directory: Arc<dyn ProfileDirectory> = store.clone();
        Self::new(store, directory)
    }
}

impl<S: LedgerStore> LedgerApi for LedgerService<S> {
    fn authenticate(&self, credential: Option<&str>) -> Result<Profile, LedgerError> {
        authenticate(self.directory.as_ref(), credential)
    }

    fn get_contract(&self, caller: &Profile, id: ContractId) -> Result<Contract, LedgerError> {
        self.store
            .read(|view| access::get_contract(view, caller, id))
    }

    fn list_contracts(&self, caller: &Profile) -> Result<Vec<Contract>, LedgerError> {
        self.store.read(|view| access::list_contracts(view, caller))
    }

    fn list_unpaid_jobs(&self, caller: &Profile) -> Result<Vec<Job>, LedgerError> {
        self.store.read(|view| access::list_unpaid_jobs(view, caller))
    }

    fn pay_job(&self, caller: &Profile, job_id: JobId) -> Result<Settlement, LedgerError> {
        let now = self.clock.now();
        match self
            .store
            .atomically(|tx| settle_job(tx, job_id, caller.id, now))
        {
            Ok(settlement) => {
                info!(
                    job_id = %job_id,
                    profile_id = %settlement.client.id,
                    contractor = %settlement.contractor.id,
                    amount = %settlement.amount(),
                    "Job settled"
                );
                Ok(settlement)
            }
            Err(e) => {
                if e.is_transient() || e.is_policy_rejection() {
                    warn!(job_id = %job_id, profile_id = %caller.id, error = %e, "Settlement rejected");
                } else {
                    debug!(job_id = %job_id, profile_id = %caller.id, error = %e, "Settlement rejected");
                }
                Err(e)
            }
        }
    }

    fn deposit(
        &self,
        caller: &Profile,
        target: &str,
        amount: Option<f64>,
    ) -> Result<Money, LedgerError> {
        match self
            .store
            .atomically(|tx| apply_deposit(tx, caller.id, target, amount))
        {
            Ok(balance) => {
                info!(profile_id = %caller.id, balance = %balance, "Deposit accepted");
                Ok(balance)
            }
            Err(e) => {
                if e.is_transient() || e.is_policy_rejection() {
                    warn!(profile_id = %caller.id, target, error = %e, "Deposit rejected");
                } else {
                    debug!(profile_id = %caller.id, target, error = %e, "Deposit rejected");
                }
                Err(e)
            }
        }
    }

    fn best_profession(
        &self,
        caller: &Profile,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, LedgerError> {
        require_admin(caller)?;
        let window = ReportWindow::parse(start, end)?;
        self.store.read(|view| best_profession(view, window))
    }

    fn best_clients(
        &self,
        caller: &Profile,
        start: Option<&str>,
        end: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<ClientTotal>, LedgerError> {
        require_admin(caller)?;
        let window = ReportWindow::parse(start, end)?;
        let limit = parse_limit(limit)?;
        self.store.read(|view| best_clients(view, window, limit))
    }
}
