//! # Integration Tests
//!
//! - `concurrency`: racing settlements and deposits against every store
//! - `http_flows`: multi-step journeys through the HTTP router

#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod http_flows;

use ledger_core::{demo_fixture, seed_store, InMemoryLedger, LedgerApi, LedgerService, SqliteLedger};
use std::sync::Arc;
use tempfile::TempDir;

/// Store configurations the race tests run against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    /// One SQLite connection shared by every handle.
    Sqlite,
    /// A separate SQLite connection per handle on the same database file.
    SqlitePerHandle,
}

pub const ALL_BACKENDS: [Backend; 3] = [Backend::Memory, Backend::Sqlite, Backend::SqlitePerHandle];

/// Seeded ledger reachable through `handles` API handles. The temp
/// directory must outlive the handles.
pub struct Harness {
    pub handles: Vec<Arc<dyn LedgerApi>>,
    _dir: Option<TempDir>,
}

impl Harness {
    pub fn new(backend: Backend, handles: usize) -> Self {
        match backend {
            Backend::Memory => {
                let store = Arc::new(InMemoryLedger::new());
                seed_store(store.as_ref(), &demo_fixture()).unwrap();
                let api: Arc<dyn LedgerApi> = Arc::new(LedgerService::from_store(store));
                Self {
                    handles: vec![api; handles],
                    _dir: None,
                }
            }
            Backend::Sqlite => {
                let dir = tempfile::tempdir().unwrap();
                let store = Arc::new(SqliteLedger::open(&dir.path().join("ledger.db")).unwrap());
                seed_store(store.as_ref(), &demo_fixture()).unwrap();
                let api: Arc<dyn LedgerApi> = Arc::new(LedgerService::from_store(store));
                Self {
                    handles: vec![api; handles],
                    _dir: Some(dir),
                }
            }
            Backend::SqlitePerHandle => {
                let dir = tempfile::tempdir().unwrap();
                let path = dir.path().join("ledger.db");
                let handles = (0..handles)
                    .map(|i| {
                        let store = Arc::new(SqliteLedger::open(&path).unwrap());
                        if i == 0 {
                            seed_store(store.as_ref(), &demo_fixture()).unwrap();
                        }
                        Arc::new(LedgerService::from_store(store)) as Arc<dyn LedgerApi>
                    })
                    .collect();
                Self {
                    handles,
                    _dir: Some(dir),
                }
            }
        }
    }

    pub fn api(&self) -> &Arc<dyn LedgerApi> {
        &self.handles[0]
    }
}
