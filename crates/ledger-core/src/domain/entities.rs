//! # Domain Entities for the Contract Ledger
//!
//! Profiles, contracts and jobs as plain value structs. Operations receive
//! fresh copies from the store and hand back updated copies; nothing here is
//! mutated in place behind the store's back.
//!
//! ## Type Decisions
//!
//! - `Money = Decimal` - exact decimal arithmetic. Balances and prices are
//!   currency amounts with cents; binary floats would drift on repeated
//!   settlement.
//! - Ids are positive `i64` newtypes so they map 1:1 onto SQLite `INTEGER
//!   PRIMARY KEY` columns and cannot be mixed up across entity kinds.
//!
//! ## Wire Shape
//!
//! Field names serialize in the shape existing API consumers expect
//! (`ClientId`, `ContractorId`, `ContractId`, `paymentDate`, `firstName`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency amount.
pub type Money = Decimal;

/// Error returned when an identifier does not parse to a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct InvalidId(pub String);

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(id) if id > 0 => Ok(Self(id)),
                    _ => Err(InvalidId(s.to_string())),
                }
            }
        }
    };
}

entity_id!(
    /// Profile identifier. Also the caller credential on the wire.
    ProfileId
);
entity_id!(
    /// Contract identifier.
    ContractId
);
entity_id!(
    /// Job identifier.
    JobId
);

/// Role of a profile on the marketplace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Client,
    Contractor,
}

impl ProfileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Client => "client",
            ProfileKind::Contractor => "contractor",
        }
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(ProfileKind::Client),
            "contractor" => Ok(ProfileKind::Contractor),
            other => Err(format!("unknown profile type: {other}")),
        }
    }
}

/// A client or contractor account with a money balance.
///
/// `admin` is an explicit capability flag granting access to the reporting
/// endpoints. It is independent of `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    /// Never negative. Mutated only by settlement and deposit.
    pub balance: Money,
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    #[serde(default)]
    pub admin: bool,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_client(&self) -> bool {
        self.kind == ProfileKind::Client
    }
}

/// Contract lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::New => "new",
            ContractStatus::InProgress => "in_progress",
            ContractStatus::Terminated => "terminated",
        }
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ContractStatus::New),
            "in_progress" => Ok(ContractStatus::InProgress),
            "terminated" => Ok(ContractStatus::Terminated),
            other => Err(format!("unknown contract status: {other}")),
        }
    }
}

/// Agreement between one client profile and one contractor profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub terms: String,
    pub status: ContractStatus,
    #[serde(rename = "ClientId")]
    pub client_id: ProfileId,
    #[serde(rename = "ContractorId")]
    pub contractor_id: ProfileId,
    /// Contractor earnings settled through this contract.
    #[serde(default)]
    pub balance: Money,
}

impl Contract {
    /// True when `profile` is the client or the contractor on this contract.
    pub fn is_party(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }

    pub fn is_active(&self) -> bool {
        self.status != ContractStatus::Terminated
    }
}

/// A priced unit of work under a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub price: Money,
    /// Flips false → true exactly once.
    pub paid: bool,
    #[serde(rename = "paymentDate")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(rename = "ContractId")]
    pub contract_id: ContractId,
}

/// Write applied to a job when it is settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSettlement {
    pub paid: bool,
    pub payment_date: DateTime<Utc>,
}

impl Job {
    pub fn with_settlement(mut self, settlement: JobSettlement) -> Self {
        self.paid = settlement.paid;
        self.payment_date = Some(settlement.payment_date);
        self
    }
}
