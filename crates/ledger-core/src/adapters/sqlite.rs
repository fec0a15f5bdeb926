//! SQLite ledger.
//!
//! ## Tables
//!
//! - `profiles` - id, names, profession, balance (TEXT decimal), kind, admin flag
//! - `contracts` - id, terms, status, client/contractor ids, settled balance
//! - `jobs` - id, description, price, paid flag, payment date (RFC 3339 TEXT)
//!
//! ## Consistency
//!
//! One connection behind a mutex. Every unit of work runs in a
//! `BEGIN IMMEDIATE` transaction, taking the write lock before the first read
//! so check-then-write sequences cannot interleave with another writer (even
//! one in a different process). The job update is a compare-and-swap on
//! `paid = 0`. Busy/locked databases surface as `Conflict`.

use crate::domain::{
    Contract, ContractFilter, ContractId, ContractStatus, Job, JobFilter, JobId, JobSettlement,
    LedgerError, Money, Party, Profile, ProfileId, ProfileKind,
};
use crate::ports::{LedgerStore, LedgerTx, LedgerView, ProfileDirectory, SeedTarget};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, TransactionBehavior};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id          INTEGER PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    profession  TEXT NOT NULL,
    balance     TEXT NOT NULL DEFAULT '0',
    kind        TEXT NOT NULL CHECK (kind IN ('client', 'contractor')),
    admin       INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS contracts (
    id             INTEGER PRIMARY KEY,
    terms          TEXT NOT NULL,
    status         TEXT NOT NULL CHECK (status IN ('new', 'in_progress', 'terminated')),
    client_id      INTEGER NOT NULL REFERENCES profiles(id),
    contractor_id  INTEGER NOT NULL REFERENCES profiles(id),
    balance        TEXT NOT NULL DEFAULT '0'
);

CREATE TABLE IF NOT EXISTS jobs (
    id            INTEGER PRIMARY KEY,
    description   TEXT NOT NULL,
    price         TEXT NOT NULL,
    paid          INTEGER NOT NULL DEFAULT 0,
    payment_date  TEXT,
    contract_id   INTEGER NOT NULL REFERENCES contracts(id)
);

CREATE INDEX IF NOT EXISTS idx_contracts_client ON contracts(client_id);
CREATE INDEX IF NOT EXISTS idx_contracts_contractor ON contracts(contractor_id);
CREATE INDEX IF NOT EXISTS idx_jobs_contract ON jobs(contract_id);
CREATE INDEX IF NOT EXISTS idx_jobs_payment_date ON jobs(payment_date);
"#;

const PROFILE_COLUMNS: &str = "id, first_name, last_name, profession, balance, kind, admin";
const CONTRACT_COLUMNS: &str = "c.id, c.terms, c.status, c.client_id, c.contractor_id, c.balance";
const JOB_COLUMNS: &str = "j.id, j.description, j.price, j.paid, j.payment_date, j.contract_id";

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                LedgerError::Conflict(e.to_string())
            }
            _ => {
                error!(error = %e, "SQLite failure");
                LedgerError::Internal(e.to_string())
            }
        }
    }
}

/// Timestamps are stored in one fixed-width UTC format so that text
/// comparison orders them chronologically.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn money_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Money> {
    let raw: String = row.get(idx)?;
    Money::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn text_enum<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|msg| {
        conversion_error(idx, std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: ProfileId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        profession: row.get(3)?,
        balance: money_column(row, 4)?,
        kind: text_enum::<ProfileKind>(row, 5)?,
        admin: row.get(6)?,
    })
}

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: ContractId(row.get(0)?),
        terms: row.get(1)?,
        status: text_enum::<ContractStatus>(row, 2)?,
        client_id: ProfileId(row.get(3)?),
        contractor_id: ProfileId(row.get(4)?),
        balance: money_column(row, 5)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let payment_date: Option<String> = row.get(4)?;
    let payment_date = payment_date
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| conversion_error(4, e))
        })
        .transpose()?;
    Ok(Job {
        id: JobId(row.get(0)?),
        description: row.get(1)?,
        price: money_column(row, 2)?,
        paid: row.get(3)?,
        payment_date,
        contract_id: ContractId(row.get(5)?),
    })
}

/// WHERE clause builder with positional parameters.
#[derive(Default)]
struct Clauses {
    conditions: Vec<String>,
    values: Vec<Value>,
}

impl Clauses {
    fn push(&mut self, condition: &str, value: Value) {
        self.values.push(value);
        self.conditions
            .push(condition.replace('?', &format!("?{}", self.values.len())));
    }

    fn push_party(&mut self, party: Party) {
        match party {
            Party::Either(id) => {
                self.values.push(Value::Integer(id.get()));
                let n = self.values.len();
                self.conditions
                    .push(format!("(c.client_id = ?{n} OR c.contractor_id = ?{n})"));
            }
            Party::Client(id) => self.push("c.client_id = ?", Value::Integer(id.get())),
            Party::Contractor(id) => self.push("c.contractor_id = ?", Value::Integer(id.get())),
        }
    }

    fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// Queries and writes against one connection (or open transaction).
struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl LedgerView for SqliteTx<'_> {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, LedgerError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query_map(params![id.get()], profile_from_row)?;
        Ok(rows.next().transpose()?)
    }

    fn find_contract(&self, filter: &ContractFilter) -> Result<Option<Contract>, LedgerError> {
        Ok(self.find_contracts(filter)?.into_iter().next())
    }

    fn find_contracts(&self, filter: &ContractFilter) -> Result<Vec<Contract>, LedgerError> {
        let mut clauses = Clauses::default();
        if let Some(id) = filter.id {
            clauses.push("c.id = ?", Value::Integer(id.get()));
        }
        if let Some(party) = filter.party {
            clauses.push_party(party);
        }
        if filter.exclude_terminated {
            clauses.push("c.status <> ?", Value::Text("terminated".into()));
        }

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts c{} ORDER BY c.id",
            clauses.sql()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(clauses.values.iter()), contract_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, LedgerError> {
        let mut clauses = Clauses::default();
        if let Some(id) = filter.id {
            clauses.push("j.id = ?", Value::Integer(id.get()));
        }
        if let Some(party) = filter.party {
            clauses.push_party(party);
        }
        if let Some(paid) = filter.paid {
            clauses.push("j.paid = ?", Value::Integer(paid as i64));
        }
        if filter.active_contracts_only {
            clauses.push("c.status <> ?", Value::Text("terminated".into()));
        }
        if let Some((start, end)) = filter.paid_between {
            clauses.push("j.payment_date >= ?", Value::Text(format_timestamp(start)));
            clauses.push("j.payment_date <= ?", Value::Text(format_timestamp(end)));
        }

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs j JOIN contracts c ON c.id = j.contract_id{} ORDER BY j.id",
            clauses.sql()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(clauses.values.iter()), job_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl LedgerTx for SqliteTx<'_> {
    fn update_profile_balance(&mut self, id: ProfileId, balance: Money) -> Result<(), LedgerError> {
        let changed = self.conn.execute(
            "UPDATE profiles SET balance = ?1 WHERE id = ?2",
            params![balance.to_string(), id.get()],
        )?;
        if changed != 1 {
            return Err(LedgerError::Internal(format!("no profile {id} to update")));
        }
        Ok(())
    }

    fn update_job(&mut self, id: JobId, settlement: JobSettlement) -> Result<(), LedgerError> {
        let changed = self.conn.execute(
            "UPDATE jobs SET paid = ?1, payment_date = ?2 WHERE id = ?3 AND paid = 0",
            params![
                settlement.paid,
                format_timestamp(settlement.payment_date),
                id.get()
            ],
        )?;
        if changed != 1 {
            return Err(LedgerError::Conflict(format!(
                "job {id} is already paid or missing"
            )));
        }
        Ok(())
    }

    fn update_contract_balance(&mut self, id: ContractId, balance: Money) -> Result<(), LedgerError> {
        let changed = self.conn.execute(
            "UPDATE contracts SET balance = ?1 WHERE id = ?2",
            params![balance.to_string(), id.get()],
        )?;
        if changed != 1 {
            return Err(LedgerError::Internal(format!("no contract {id} to update")));
        }
        Ok(())
    }
}

/// SQLite-backed implementation of the ledger ports.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open or create the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        info!(path = %path.display(), "Opening SQLite ledger");
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "SQLite journal mode set");
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        debug!("Opening in-memory SQLite ledger");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LedgerError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// True when no profile has been provisioned yet.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count == 0)
    }
}

impl LedgerStore for SqliteLedger {
    fn read<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&dyn LedgerView) -> Result<T, LedgerError>,
    {
        let conn = self.conn.lock();
        let view = SqliteTx { conn: &conn };
        f(&view)
    }

    fn atomically<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, LedgerError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = {
            let mut unit = SqliteTx { conn: &tx };
            f(&mut unit)
        };
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }
}

impl ProfileDirectory for SqliteLedger {
    fn resolve(&self, credential: &str) -> Result<Option<Profile>, LedgerError> {
        let Ok(id) = credential.parse::<ProfileId>() else {
            return Ok(None);
        };
        self.read(|view| view.profile(id))
    }
}

impl SeedTarget for SqliteLedger {
    fn insert_profile(&self, profile: Profile) -> Result<(), LedgerError> {
        self.conn.lock().execute(
            &format!("INSERT INTO profiles ({PROFILE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                profile.id.get(),
                profile.first_name,
                profile.last_name,
                profile.profession,
                profile.balance.to_string(),
                profile.kind.as_str(),
                profile.admin,
            ],
        )?;
        Ok(())
    }

    fn insert_contract(&self, contract: Contract) -> Result<(), LedgerError> {
        self.conn.lock().execute(
            "INSERT INTO contracts (id, terms, status, client_id, contractor_id, balance) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                contract.id.get(),
                contract.terms,
                contract.status.as_str(),
                contract.client_id.get(),
                contract.contractor_id.get(),
                contract.balance.to_string(),
            ],
        )?;
        Ok(())
    }

    fn insert_job(&self, job: Job) -> Result<(), LedgerError> {
        self.conn.lock().execute(
            "INSERT INTO jobs (id, description, price, paid, payment_date, contract_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                job.id.get(),
                job.description,
                job.price.to_string(),
                job.paid,
                job.payment_date.map(format_timestamp),
                job.contract_id.get(),
            ],
        )?;
        Ok(())
    }
}
