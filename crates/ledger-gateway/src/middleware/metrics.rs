//! Ledger metrics, exported as JSON on `/metrics`.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Gateway and ledger counters
#[derive(Default)]
pub struct LedgerMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_error: AtomicU64,

    // Settlement counters
    pub settlements: AtomicU64,
    pub settlement_rejections: AtomicU64,

    // Deposit counters
    pub deposits: AtomicU64,
    pub deposit_rejections: AtomicU64,

    /// Units of work rolled back on a write conflict
    pub conflicts: AtomicU64,

    settled_amount: Mutex<Decimal>,

    // Latency tracking
    pub total_latency_ms: AtomicU64,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished request
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_settlement(&self, amount: Decimal) {
        self.settlements.fetch_add(1, Ordering::Relaxed);
        *self.settled_amount.lock() += amount;
    }

    pub fn record_settlement_rejected(&self, conflict: bool) {
        self.settlement_rejections.fetch_add(1, Ordering::Relaxed);
        if conflict {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_deposit(&self) {
        self.deposits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deposit_rejected(&self, conflict: bool) {
        self.deposit_rejections.fetch_add(1, Ordering::Relaxed);
        if conflict {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Sum of all settled job prices since start
    pub fn settled_amount(&self) -> Decimal {
        *self.settled_amount.lock()
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "error": self.requests_error.load(Ordering::Relaxed),
            },
            "settlements": {
                "accepted": self.settlements.load(Ordering::Relaxed),
                "rejected": self.settlement_rejections.load(Ordering::Relaxed),
                "amount": self.settled_amount().to_string(),
            },
            "deposits": {
                "accepted": self.deposits.load(Ordering::Relaxed),
                "rejected": self.deposit_rejections.load(Ordering::Relaxed),
            },
            "conflicts": self.conflicts.load(Ordering::Relaxed),
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timer for latency tracking
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
