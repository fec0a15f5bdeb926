//! # Reporting Aggregator
//!
//! Read-only revenue aggregation over jobs paid inside an inclusive time
//! window. Restricted to admin callers by the service layer.
//!
//! ## Timestamp Input
//!
//! Window bounds accept RFC 3339 (`2020-08-15T19:11:26.737Z`), a plain date
//! (`2020-08-15`, midnight UTC), a naive datetime (`2020-08-15 19:11:26`,
//! UTC) or integer milliseconds since the Unix epoch (`0`).
//!
//! ## Tie Breaking
//!
//! Groups are kept in first-seen order while scanning jobs by ascending id.
//! Equal totals keep that order: the earliest group wins `best_profession`
//! and precedes later groups in `best_clients`.

use super::{ContractFilter, ContractId, JobFilter, LedgerError, Money, Profile, ProfileId};
use crate::ports::LedgerView;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Default number of entries returned by [`best_clients`].
pub const DEFAULT_BEST_CLIENTS_LIMIT: usize = 2;

/// Inclusive `[start, end]` window on payment date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Checked in order: start present, start valid, end present, end valid.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, LedgerError> {
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        Ok(Self { start, end })
    }
}

fn parse_bound(field: &str, raw: Option<&str>) -> Result<DateTime<Utc>, LedgerError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LedgerError::BadRequest(format!("{field} date is required")))?;
    parse_timestamp(raw)
        .ok_or_else(|| LedgerError::BadRequest(format!("{field} date is invalid")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single();
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Absent means default; anything else must be a non-negative integer.
pub fn parse_limit(raw: Option<&str>) -> Result<usize, LedgerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_BEST_CLIENTS_LIMIT),
        Some(value) => value.parse::<usize>().map_err(|_| {
            LedgerError::BadRequest("limit must be a non-negative integer".to_string())
        }),
    }
}

/// One row of the best-clients ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTotal {
    pub id: ProfileId,
    pub full_name: String,
    pub paid: Money,
}

/// Paid jobs in the window, each resolved to its contract's client and
/// contractor. Lookups are memoized per id.
struct PaidWork<'a, V: LedgerView + ?Sized> {
    view: &'a V,
    contracts: HashMap<ContractId, (ProfileId, ProfileId)>,
    profiles: HashMap<ProfileId, Profile>,
}

impl<'a, V: LedgerView + ?Sized> PaidWork<'a, V> {
    fn new(view: &'a V) -> Self {
        Self {
            view,
            contracts: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    fn parties(&mut self, id: ContractId) -> Result<(ProfileId, ProfileId), LedgerError> {
        if let Some(parties) = self.contracts.get(&id) {
            return Ok(*parties);
        }
        let contract = self
            .view
            .find_contract(&ContractFilter::by_id(id))?
            .ok_or_else(|| LedgerError::Internal(format!("paid job on missing contract {id}")))?;
        let parties = (contract.client_id, contract.contractor_id);
        self.contracts.insert(id, parties);
        Ok(parties)
    }

    fn profile(&mut self, id: ProfileId) -> Result<&Profile, LedgerError> {
        if !self.profiles.contains_key(&id) {
            let profile = self
                .view
                .profile(id)?
                .ok_or_else(|| LedgerError::Internal(format!("missing profile {id}")))?;
            self.profiles.insert(id, profile);
        }
        self.profiles
            .get(&id)
            .ok_or_else(|| LedgerError::Internal(format!("missing profile {id}")))
    }
}

/// Accumulate `amount` under `key`, keeping first-seen order.
fn accumulate<K: PartialEq>(totals: &mut Vec<(K, Money)>, key: K, amount: Money) {
    match totals.iter_mut().find(|(k, _)| *k == key) {
        Some((_, total)) => *total += amount,
        None => totals.push((key, amount)),
    }
}

/// Contractor profession with the highest paid revenue in the window.
pub fn best_profession<V>(view: &V, window: ReportWindow) -> Result<String, LedgerError>
where
    V: LedgerView + ?Sized,
{
    let jobs = view.find_jobs(&JobFilter::paid_between(window.start, window.end))?;
    let mut work = PaidWork::new(view);
    let mut totals: Vec<(String, Money)> = Vec::new();

    for job in jobs {
        let (_, contractor) = work.parties(job.contract_id)?;
        let profession = work.profile(contractor)?.profession.clone();
        accumulate(&mut totals, profession, job.price);
    }

    let mut best: Option<(String, Money)> = None;
    for (profession, total) in totals {
        if best.as_ref().map_or(true, |(_, top)| total > *top) {
            best = Some((profession, total));
        }
    }
    best.map(|(profession, _)| profession)
        .ok_or(LedgerError::NotFound("paid job"))
}

/// Clients ranked by total paid in the window, highest first, at most
/// `limit` entries. An empty window yields an empty list.
pub fn best_clients<V>(
    view: &V,
    window: ReportWindow,
    limit: usize,
) -> Result<Vec<ClientTotal>, LedgerError>
where
    V: LedgerView + ?Sized,
{
    let jobs = view.find_jobs(&JobFilter::paid_between(window.start, window.end))?;
    let mut work = PaidWork::new(view);
    let mut totals: Vec<(ProfileId, Money)> = Vec::new();

    for job in jobs {
        let (client, _) = work.parties(job.contract_id)?;
        accumulate(&mut totals, client, job.price);
    }

    // Stable: equal totals keep first-seen order.
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
        .into_iter()
        .take(limit)
        .map(|(id, paid)| {
            Ok(ClientTotal {
                id,
                full_name: work.profile(id)?.full_name(),
                paid,
            })
        })
        .collect()
}
