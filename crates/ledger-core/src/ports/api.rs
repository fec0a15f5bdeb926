use crate::domain::{
    ClientTotal, Contract, ContractId, Job, JobId, LedgerError, Money, Profile, Settlement,
};

/// Primary API consumed by the HTTP layer.
///
/// Every operation except [`LedgerApi::authenticate`] takes the already
/// resolved caller; raw credentials never reach the feature components.
pub trait LedgerApi: Send + Sync {
    // === Authorization Guard ===

    fn authenticate(&self, credential: Option<&str>) -> Result<Profile, LedgerError>;

    // === Contract Access ===

    fn get_contract(&self, caller: &Profile, id: ContractId) -> Result<Contract, LedgerError>;

    fn list_contracts(&self, caller: &Profile) -> Result<Vec<Contract>, LedgerError>;

    fn list_unpaid_jobs(&self, caller: &Profile) -> Result<Vec<Job>, LedgerError>;

    // === Money Movement ===

    fn pay_job(&self, caller: &Profile, job_id: JobId) -> Result<Settlement, LedgerError>;

    /// `target` and `amount` are passed unvalidated so the checks run in
    /// their fixed order.
    fn deposit(
        &self,
        caller: &Profile,
        target: &str,
        amount: Option<f64>,
    ) -> Result<Money, LedgerError>;

    // === Reporting (admin) ===

    fn best_profession(
        &self,
        caller: &Profile,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<String, LedgerError>;

    fn best_clients(
        &self,
        caller: &Profile,
        start: Option<&str>,
        end: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<ClientTotal>, LedgerError>;
}
