//! Delegate relations and their verification state
//!
//! A [`Delegate`] describes one remote delegate relation as reported by
//! the mail service. It is never persisted locally; every existence
//! check fetches the list fresh.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A delegate relation on one mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
    /// The mailbox the delegate has access to.
    pub mailbox: String,
    /// The identity granted access.
    pub delegate_email: String,
    /// Verification state, when the service reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
}

/// Verification state of a delegate relation.
///
/// The service confirms new delegates out of band; until the delegate
/// accepts, the relation exists but is not yet effective. Values the
/// service may add later decode as [`VerificationStatus::Unknown`].
///
/// # Examples
///
/// ```
/// use mailbox_delegates::VerificationStatus;
///
/// let status = VerificationStatus::Accepted;
/// assert_eq!(status.as_str(), "accepted");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// The delegate accepted the grant.
    Accepted,
    /// The grant is awaiting the delegate's acceptance.
    Pending,
    /// The delegate rejected the grant.
    Rejected,
    /// The grant expired before acceptance.
    Expired,
    /// A state this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl VerificationStatus {
    /// The wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
