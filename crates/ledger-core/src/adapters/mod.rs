//! Store adapters for the Query/Store and Profile Directory ports.

pub mod memory_db;
pub mod seed;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory_db::InMemoryLedger;
pub use seed::{demo_fixture, seed_store, Fixture};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLedger;
