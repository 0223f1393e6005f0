//! Delegation requests and the batch text format
//!
//! A batch is UTF-8 text with one request per line:
//!
//! ```text
//! add,owner@example.com,helper@example.com
//! remove,owner@example.com,former@example.com
//! list,owner@example.com
//! ```
//!
//! Fields are comma-separated and whitespace-trimmed; blank lines are
//! skipped. Parsing is all-or-nothing: any malformed line fails the
//! whole batch so a bad submission never executes partially.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// The operation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Grant delegate access.
    Add,
    /// Revoke delegate access.
    Remove,
    /// Enumerate current delegates.
    List,
}

impl RequestKind {
    /// The batch-format keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::List => "list",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed delegation request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DelegationRequest {
    pub kind: RequestKind,
    /// The mailbox whose delegate list is read or changed.
    pub mailbox_owner: String,
    /// The delegate identity; present for `Add`/`Remove`, absent for
    /// `List`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<String>,
}

impl DelegationRequest {
    #[must_use]
    pub fn add(mailbox_owner: impl Into<String>, delegate: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Add,
            mailbox_owner: mailbox_owner.into(),
            delegate: Some(delegate.into()),
        }
    }

    #[must_use]
    pub fn remove(mailbox_owner: impl Into<String>, delegate: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Remove,
            mailbox_owner: mailbox_owner.into(),
            delegate: Some(delegate.into()),
        }
    }

    #[must_use]
    pub fn list(mailbox_owner: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::List,
            mailbox_owner: mailbox_owner.into(),
            delegate: None,
        }
    }
}

/// Parse a batch specification into an ordered request sequence.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the first offending line if any
/// non-blank line has the wrong field count, an unrecognized kind
/// (kinds are case-sensitive), a missing mailbox owner, a missing
/// delegate on `add`/`remove`, or a delegate on `list`.
pub fn parse_batch(text: &str) -> Result<Vec<DelegationRequest>> {
    let mut requests = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        requests.push(parse_line(idx + 1, line)?);
    }

    Ok(requests)
}

fn parse_line(number: usize, line: &str) -> Result<DelegationRequest> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    let kind = match fields[0] {
        "add" => RequestKind::Add,
        "remove" => RequestKind::Remove,
        "list" => RequestKind::List,
        other => {
            return Err(Error::Parse(format!(
                "line {number}: unknown kind '{other}' (expected add, remove, or list)"
            )));
        }
    };

    let owner = fields
        .get(1)
        .copied()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Error::Parse(format!("line {number}: missing mailbox owner")))?;

    match kind {
        RequestKind::List => {
            // A trailing empty field is tolerated: "list,owner@x.com,"
            if fields.len() > 3 || fields.get(2).is_some_and(|f| !f.is_empty()) {
                return Err(Error::Parse(format!(
                    "line {number}: list takes no delegate"
                )));
            }
            Ok(DelegationRequest::list(owner))
        }
        RequestKind::Add | RequestKind::Remove => {
            if fields.len() != 3 {
                return Err(Error::Parse(format!(
                    "line {number}: expected kind,mailboxOwner,delegateEmail"
                )));
            }
            let delegate = fields[2];
            if delegate.is_empty() {
                return Err(Error::Parse(format!(
                    "line {number}: {kind} requires a delegate email"
                )));
            }
            Ok(DelegationRequest {
                kind,
                mailbox_owner: owner.to_string(),
                delegate: Some(delegate.to_string()),
            })
        }
    }
}
