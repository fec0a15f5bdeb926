//! # ledger-core
//!
//! Payment brokering between clients and contractors.
//!
//! ## Role in System
//!
//! - **Authorization Guard**: resolves a caller credential to a [`Profile`]
//! - **Contract Access Layer**: client-or-contractor visibility over contracts and jobs
//! - **Settlement Engine**: pays a job, moving its price between two balances in one unit of work
//! - **Deposit Guard**: self-service client deposits capped at 25% of outstanding work
//! - **Reporting Aggregator**: read-only revenue aggregation over paid jobs
//!
//! ## Flow
//!
//! ```text
//! credential ──→ [Authorization Guard] ──→ Profile
//!                                             │
//!          ┌──────────────────┬───────────────┼──────────────────┐
//!          ↓                  ↓               ↓                  ↓
//!   [Contract Access]   [Settlement]     [Deposit Guard]   [Reporting]
//!          │                  │               │                  │
//!          └──── LedgerView ──┴── LedgerTx ───┴──── LedgerView ──┘
//!                              (LedgerStore)
//! ```
//!
//! ## Consistency
//!
//! Every mutating operation runs inside [`LedgerStore::atomically`]: the
//! sufficiency/cap checks read the same fresh records that are written, and the
//! staged writes become visible together or not at all.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::LedgerService;
