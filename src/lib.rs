//! Mailbox delegation engine
//!
//! Grants, revokes, and enumerates delegate access on mailboxes hosted
//! by a remote mail service, impersonating each mailbox owner with a
//! service credential. Changes are submitted as ordered batches; the
//! engine verifies current state before every mutation, isolates
//! per-item failures, and reports one [`OperationResult`] per request.
//!
//! Destructive batches (any `remove`) are held by a confirmation gate
//! until re-submitted with the matching [`batch_fingerprint`].

mod auth;
mod client;
mod config;
mod credential;
mod delegate;
mod engine;
mod error;
mod gate;
mod guard;
mod request;

pub use client::DelegateClient;
pub use config::ServiceConfig;
pub use credential::ServiceCredential;
pub use delegate::{Delegate, VerificationStatus};
pub use engine::{BatchOutcome, OperationResult, PendingConfirmation, run_batch};
pub use error::{Error, Result};
pub use gate::batch_fingerprint;
pub use request::{DelegationRequest, RequestKind, parse_batch};
