//! Batch processor: the engine invocation surface
//!
//! [`run_batch`] executes a confirmed request sequence strictly in
//! input order, one request at a time. Sequential execution keeps the
//! result stream aligned with the input and closes the in-process side
//! of the guard's check-then-act race; the window against external
//! actors remains and surfaces as an occasional conflict result.
//!
//! Every error local to one request is converted to a failed
//! [`OperationResult`] at this boundary. The loop never short-circuits:
//! the outcome always carries exactly one result per input request,
//! even under total remote-service unavailability.
//!
//! Dropping the returned future between requests stops the batch;
//! already-completed mutations are not rolled back.

use crate::client::DelegateClient;
use crate::config::ServiceConfig;
use crate::credential::ServiceCredential;
use crate::delegate::Delegate;
use crate::error::{Error, Result};
use crate::gate::{self, GateState};
use crate::guard;
use crate::request::{DelegationRequest, RequestKind};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of one request, at the same ordinal position as its input.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub request: DelegationRequest,
    pub success: bool,
    pub message: String,
    /// Populated for successful `list` requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegates: Option<Vec<Delegate>>,
}

/// A destructive batch held for explicit re-submission.
#[derive(Debug, Clone, Serialize)]
pub struct PendingConfirmation {
    /// Number of `remove` requests in the batch.
    pub removals: usize,
    /// Token to echo back when confirming.
    pub fingerprint: String,
}

/// What a batch submission produced.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The batch contains removals and was not confirmed; no remote
    /// call was made.
    AwaitingConfirmation(PendingConfirmation),
    /// One result per input request, in input order.
    Completed(Vec<OperationResult>),
}

/// Execute a batch of delegation requests against the remote service.
///
/// The credential is consumed; its key material is wiped when the
/// batch completes, success or failure. Requests run sequentially with
/// a fresh [`DelegateClient`] per request, so a failure for one
/// mailbox owner never affects the others.
pub async fn run_batch(
    config: &ServiceConfig,
    credential: ServiceCredential,
    requests: &[DelegationRequest],
    confirmed: bool,
) -> BatchOutcome {
    if let GateState::AwaitingConfirmation {
        removals,
        fingerprint,
    } = gate::evaluate(requests, confirmed)
    {
        info!(
            "Holding batch of {} request(s) for confirmation ({} removal(s))",
            requests.len(),
            removals
        );
        return BatchOutcome::AwaitingConfirmation(PendingConfirmation {
            removals,
            fingerprint,
        });
    }

    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        let result = match execute(config, &credential, request).await {
            Ok((message, delegates)) => OperationResult {
                request: request.clone(),
                success: true,
                message,
                delegates,
            },
            Err(e) => {
                warn!(
                    "{} {} failed: {}",
                    request.kind, request.mailbox_owner, e
                );
                OperationResult {
                    request: request.clone(),
                    success: false,
                    message: failure_message(&e),
                    delegates: None,
                }
            }
        };
        results.push(result);
    }

    info!("Batch complete: {} result(s)", results.len());
    BatchOutcome::Completed(results)
}

/// Run one request to completion against a fresh client.
async fn execute(
    config: &ServiceConfig,
    credential: &ServiceCredential,
    request: &DelegationRequest,
) -> Result<(String, Option<Vec<Delegate>>)> {
    let client = DelegateClient::authorize(config, credential, &request.mailbox_owner).await?;

    match request.kind {
        RequestKind::List => {
            let delegates = client.list().await?;
            let message = format!("{} delegate(s)", delegates.len());
            Ok((message, Some(delegates)))
        }
        RequestKind::Add => {
            let delegate = required_delegate(request)?;
            guard::ensure_absent(&client, delegate).await?;
            client.add(delegate).await?;
            Ok(("added".to_string(), None))
        }
        RequestKind::Remove => {
            let delegate = required_delegate(request)?;
            guard::ensure_present(&client, delegate).await?;
            client.remove(delegate).await?;
            Ok(("removed".to_string(), None))
        }
    }
}

fn required_delegate(request: &DelegationRequest) -> Result<&str> {
    request
        .delegate
        .as_deref()
        .ok_or_else(|| Error::Parse(format!("{} request without a delegate", request.kind)))
}

/// Human-readable per-item failure message, keeping the error classes
/// distinguishable for the caller.
fn failure_message(error: &Error) -> String {
    match error {
        // "already exists" / "does not exist" stand on their own.
        Error::Conflict(message) => message.clone(),
        Error::Credential(detail) => format!("credential/authorization failure: {detail}"),
        other => other.to_string(),
    }
}
