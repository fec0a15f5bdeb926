//! Authorization Guard.
//!
//! Turns the inbound credential into a [`Profile`] before any feature
//! component runs. Missing, malformed and unknown credentials are all
//! `Unauthenticated`; directory failures propagate unchanged.

use super::{LedgerError, Profile};
use crate::ports::ProfileDirectory;
use tracing::debug;

pub fn authenticate<D>(directory: &D, credential: Option<&str>) -> Result<Profile, LedgerError>
where
    D: ProfileDirectory + ?Sized,
{
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(LedgerError::Unauthenticated)?;

    match directory.resolve(credential)? {
        Some(profile) => Ok(profile),
        None => {
            debug!(credential, "Credential did not resolve to a profile");
            Err(LedgerError::Unauthenticated)
        }
    }
}

/// Reporting is limited to profiles carrying the admin capability.
pub fn require_admin(caller: &Profile) -> Result<(), LedgerError> {
    if caller.admin {
        Ok(())
    } else {
        Err(LedgerError::Unauthorized(
            "admin capability required".to_string(),
        ))
    }
}
