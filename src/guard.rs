//! Idempotency guard: check current state before mutating
//!
//! The remote service's behavior on duplicate adds and missing removes
//! is not dependable, so every mutation is preceded by a fresh list.
//! Duplicate adds and missing removes become deterministic conflict
//! outcomes instead of opaque remote errors.
//!
//! The check and the mutation are not atomic: an external actor can
//! change the delegate list between them. That window is accepted; it
//! surfaces as an occasional conflict result, never as silent
//! inconsistency.

use crate::client::DelegateClient;
use crate::delegate::Delegate;
use crate::error::{Error, Result};

/// Verify `delegate` is not already on the mailbox before an add.
///
/// # Errors
///
/// [`Error::ExistenceCheck`] if the list call itself failed (the state
/// is unknown), [`Error::Conflict`] if the delegate already exists.
pub async fn ensure_absent(client: &DelegateClient, delegate: &str) -> Result<()> {
    let current = fetch_current(client).await?;
    check_absent(&current, delegate)
}

/// Verify `delegate` is present on the mailbox before a remove.
///
/// # Errors
///
/// [`Error::ExistenceCheck`] if the list call itself failed,
/// [`Error::Conflict`] if the delegate does not exist.
pub async fn ensure_present(client: &DelegateClient, delegate: &str) -> Result<()> {
    let current = fetch_current(client).await?;
    check_present(&current, delegate)
}

async fn fetch_current(client: &DelegateClient) -> Result<Vec<Delegate>> {
    client
        .list()
        .await
        .map_err(|e| Error::ExistenceCheck(e.to_string()))
}

pub(crate) fn check_absent(current: &[Delegate], delegate: &str) -> Result<()> {
    if contains(current, delegate) {
        Err(Error::Conflict("already exists".to_string()))
    } else {
        Ok(())
    }
}

pub(crate) fn check_present(current: &[Delegate], delegate: &str) -> Result<()> {
    if contains(current, delegate) {
        Ok(())
    } else {
        Err(Error::Conflict("does not exist".to_string()))
    }
}

fn contains(current: &[Delegate], delegate: &str) -> bool {
    current
        .iter()
        .any(|d| d.delegate_email.eq_ignore_ascii_case(delegate))
}
