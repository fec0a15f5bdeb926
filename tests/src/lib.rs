//! # Ledger Test Suite
//!
//! Cross-crate tests that no single crate can own.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (settlement, reporting)
//! └── src/
//!     ├── fixtures.rs   # Synthetic marketplaces of arbitrary size
//!     └── integration/  # Concurrency races and end-to-end HTTP flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::concurrency::
//! cargo bench -p ledger-tests
//! ```

pub mod fixtures;
pub mod integration;
