//! # Deposit Guard
//!
//! Self-service top-ups for clients, capped at a quarter of the client's
//! outstanding work.
//!
//! ## Check Order
//!
//! 1. target id parses → else `BadRequest`
//! 2. caller is the target → else `Unauthorized`
//! 3. caller is a client → else `Forbidden`
//! 4. caller has at least one contract as client → else `NotFound`
//! 5. amount is a positive finite number → else `BadRequest`
//! 6. amount ≤ 25% of outstanding unpaid job total → else `Forbidden`
//!
//! The outstanding total and the balance write share one unit of work, so a
//! settlement racing with the deposit cannot invalidate the cap check or lose
//! the balance update.

use super::{ContractFilter, JobFilter, LedgerError, Money, Party, ProfileId};
use crate::ports::LedgerTx;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Share of outstanding job value a client may deposit in one call.
pub const DEPOSIT_CAP_RATIO: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

pub fn parse_deposit_target(raw: &str) -> Result<ProfileId, LedgerError> {
    raw.parse::<ProfileId>()
        .map_err(|_| LedgerError::BadRequest(format!("invalid user id: {raw:?}")))
}

/// Amount must be a positive, finite number. It is kept exactly as sent:
/// the cap check and the credit use the same value.
///
/// `Ok(None)` is a valid amount too large to represent as money, which can
/// never fit under the cap.
pub fn parse_deposit_amount(raw: Option<f64>) -> Result<Option<Money>, LedgerError> {
    let value = raw
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| LedgerError::BadRequest("amount must be a positive number".to_string()))?;
    match Decimal::from_f64(value) {
        Some(amount) if amount > Money::ZERO => Ok(Some(amount)),
        Some(_) => Err(LedgerError::BadRequest(format!(
            "amount {value} is below the smallest representable unit"
        ))),
        None => Ok(None),
    }
}

pub fn deposit_cap(outstanding: Money) -> Money {
    outstanding * DEPOSIT_CAP_RATIO
}

/// Apply a deposit for `caller` and return the new balance.
pub fn apply_deposit<T>(
    tx: &mut T,
    caller: ProfileId,
    target: &str,
    amount: Option<f64>,
) -> Result<Money, LedgerError>
where
    T: LedgerTx + ?Sized,
{
    let target = parse_deposit_target(target)?;
    if caller != target {
        return Err(LedgerError::Unauthorized(
            "deposits are only accepted for the caller's own profile".to_string(),
        ));
    }

    let mut profile = tx.profile(caller)?.ok_or(LedgerError::Unauthenticated)?;
    if !profile.is_client() {
        return Err(LedgerError::Forbidden("only clients can deposit".to_string()));
    }

    let contracts = tx.find_contracts(&ContractFilter::for_party(Party::Client(caller)))?;
    if contracts.is_empty() {
        return Err(LedgerError::NotFound("contract"));
    }
    let outstanding: Money = tx
        .find_jobs(&JobFilter::unpaid().party(Party::Client(caller)))?
        .iter()
        .filter(|j| !j.paid && contracts.iter().any(|c| c.id == j.contract_id))
        .map(|j| j.price)
        .sum();

    let requested = amount;
    let amount = parse_deposit_amount(amount)?;
    let cap = deposit_cap(outstanding);
    let amount = match amount {
        Some(amount) if amount <= cap => amount,
        _ => {
            let shown = requested.map(|v| v.to_string()).unwrap_or_default();
            return Err(LedgerError::Forbidden(format!(
                "deposit of {shown} exceeds the limit of {cap} (25% of outstanding jobs)"
            )));
        }
    };

    profile.balance += amount;
    tx.update_profile_balance(profile.id, profile.balance)?;
    Ok(profile.balance)
}
