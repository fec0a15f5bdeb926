//! Outbound ports: Profile Directory and Query/Store.

use crate::domain::{
    Contract, ContractFilter, ContractId, Job, JobFilter, JobId, JobSettlement, LedgerError,
    Money, Profile, ProfileId,
};

/// Resolves an opaque caller credential to a profile.
pub trait ProfileDirectory: Send + Sync {
    /// `Ok(None)` when the credential is malformed or unknown.
    fn resolve(&self, credential: &str) -> Result<Option<Profile>, LedgerError>;
}

/// Read side of the Query/Store.
///
/// Results are ordered by id ascending.
pub trait LedgerView {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, LedgerError>;
    fn find_contract(&self, filter: &ContractFilter) -> Result<Option<Contract>, LedgerError>;
    fn find_contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, LedgerError>;
    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, LedgerError>;
}

/// Write side, only reachable inside [`LedgerStore::atomically`].
///
/// Reads through the same handle observe writes already staged in the unit.
pub trait LedgerTx: LedgerView {
    fn update_profile_balance(&mut self, id: ProfileId, balance: Money) -> Result<(), LedgerError>;

    /// Compare-and-swap on the paid flag: fails with `Conflict` when the job
    /// is already paid.
    fn update_job(&mut self, id: JobId, settlement: JobSettlement) -> Result<(), LedgerError>;

    fn update_contract_balance(&mut self, id: ContractId, balance: Money) -> Result<(), LedgerError>;
}

/// Transactional Query/Store.
pub trait LedgerStore: Send + Sync {
    fn read<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&dyn LedgerView) -> Result<T, LedgerError>;

    /// Run `f` as one serializable unit of work. Staged writes are committed
    /// only when `f` returns `Ok`; on `Err` nothing is persisted.
    fn atomically<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, LedgerError>;
}

/// Bulk loading used by fixtures and onboarding tools.
pub trait SeedTarget {
    fn insert_profile(&self, profile: Profile) -> Result<(), LedgerError>;
    fn insert_contract(&self, contract: Contract) -> Result<(), LedgerError>;
    fn insert_job(&self, job: Job) -> Result<(), LedgerError>;
}
