//! Contract Access Layer.
//!
//! A profile sees a contract (and its jobs) only when it is the client or the
//! contractor on it. The store filter narrows the query; the party rule is
//! re-checked here on every returned row so a loose store cannot leak data.
//!
//! Empty list results are reported as `NotFound`, not as an empty list.

use super::{Contract, ContractFilter, ContractId, Job, JobFilter, LedgerError, Party, Profile};
use crate::ports::LedgerView;

pub fn get_contract<V>(view: &V, caller: &Profile, id: ContractId) -> Result<Contract, LedgerError>
where
    V: LedgerView + ?Sized,
{
    let filter = ContractFilter::by_id(id).party(Party::Either(caller.id));
    view.find_contract(&filter)?
        .filter(|c| c.is_party(caller.id))
        .ok_or(LedgerError::NotFound("contract"))
}

/// Non-terminated contracts the caller is party to.
pub fn list_contracts<V>(view: &V, caller: &Profile) -> Result<Vec<Contract>, LedgerError>
where
    V: LedgerView + ?Sized,
{
    let filter = ContractFilter::for_party(Party::Either(caller.id)).active();
    let contracts: Vec<Contract> = view
        .find_contracts(&filter)?
        .into_iter()
        .filter(|c| c.is_party(caller.id) && c.is_active())
        .collect();

    if contracts.is_empty() {
        return Err(LedgerError::NotFound("contract"));
    }
    Ok(contracts)
}

/// Unpaid jobs across every non-terminated contract the caller is party to.
pub fn list_unpaid_jobs<V>(view: &V, caller: &Profile) -> Result<Vec<Job>, LedgerError>
where
    V: LedgerView + ?Sized,
{
    let visible: Vec<ContractId> = list_contracts(view, caller)
        .or_else(|e| match e {
            LedgerError::NotFound(_) => Ok(Vec::new()),
            other => Err(other),
        })?
        .into_iter()
        .map(|c| c.id)
        .collect();

    let filter = JobFilter::unpaid()
        .party(Party::Either(caller.id))
        .active_contracts_only();
    let jobs: Vec<Job> = view
        .find_jobs(&filter)?
        .into_iter()
        .filter(|j| !j.paid && visible.contains(&j.contract_id))
        .collect();

    if jobs.is_empty() {
        return Err(LedgerError::NotFound("job"));
    }
    Ok(jobs)
}
