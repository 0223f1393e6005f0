//! Delegation client for one impersonated mailbox owner

use crate::auth;
use crate::config::ServiceConfig;
use crate::credential::ServiceCredential;
use crate::delegate::{Delegate, VerificationStatus};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Client bound to exactly one (mailbox owner, credential) pair.
///
/// Construction is eager: the token exchange and an identity probe run
/// in [`DelegateClient::authorize`], so credential and authorization
/// failures surface before any mutation is attempted. Clients are
/// cheap, short-lived, and never shared across mailbox owners.
pub struct DelegateClient {
    http: reqwest::Client,
    base_url: String,
    mailbox: String,
    token: String,
}

#[derive(Deserialize)]
struct ListDelegatesResponse {
    /// Absent on the wire when the mailbox has no delegates.
    #[serde(default)]
    delegates: Vec<WireDelegate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDelegate {
    delegate_email: String,
    #[serde(default)]
    verification_status: Option<VerificationStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDelegateRequest<'a> {
    delegate_email: &'a str,
}

impl DelegateClient {
    /// Authenticate and authorize against the remote service for
    /// `mailbox`.
    ///
    /// Exchanges the credential for a bearer token impersonating the
    /// mailbox owner, then probes the mailbox profile to confirm the
    /// impersonation grant actually covers it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if the identity cannot be
    /// authenticated or lacks authorization for the mailbox, and
    /// [`Error::Remote`] for transport failures.
    pub async fn authorize(
        config: &ServiceConfig,
        credential: &ServiceCredential,
        mailbox: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Remote(format!("failed to build HTTP client: {e}")))?;

        let token = auth::fetch_access_token(&http, credential, mailbox).await?;

        let client = Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            mailbox: mailbox.to_string(),
            token,
        };
        client.probe().await?;

        info!("Authorized for {}", mailbox);
        Ok(client)
    }

    /// The mailbox owner this client impersonates.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Fetch the current delegates of the mailbox. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    pub async fn list(&self) -> Result<Vec<Delegate>> {
        debug!("Listing delegates of {}", self.mailbox);
        let response = self
            .http
            .get(self.delegates_url())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("list delegates failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "list delegates rejected").await);
        }

        let body: ListDelegatesResponse = response
            .json()
            .await
            .map_err(|e| Error::Remote(format!("invalid delegate list: {e}")))?;

        Ok(body
            .delegates
            .into_iter()
            .map(|d| Delegate {
                mailbox: self.mailbox.clone(),
                delegate_email: d.delegate_email,
                verification_status: d.verification_status,
            })
            .collect())
    }

    /// Request creation of a delegate relation.
    ///
    /// Existence must already have been ruled out by the caller; this
    /// method does not itself check.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    pub async fn add(&self, delegate: &str) -> Result<()> {
        debug!("Adding delegate {} to {}", delegate, self.mailbox);
        let response = self
            .http
            .post(self.delegates_url())
            .bearer_auth(&self.token)
            .json(&CreateDelegateRequest {
                delegate_email: delegate,
            })
            .send()
            .await
            .map_err(|e| Error::Remote(format!("create delegate failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "create delegate rejected").await);
        }

        info!("Added delegate {} to {}", delegate, self.mailbox);
        Ok(())
    }

    /// Request deletion of a delegate relation.
    ///
    /// Existence must already have been confirmed by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    pub async fn remove(&self, delegate: &str) -> Result<()> {
        debug!("Removing delegate {} from {}", delegate, self.mailbox);
        let response = self
            .http
            .delete(format!("{}/{delegate}", self.delegates_url()))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("delete delegate failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "delete delegate rejected").await);
        }

        info!("Removed delegate {} from {}", delegate, self.mailbox);
        Ok(())
    }

    // -- private helpers --

    /// Lightweight identity probe: fetch the impersonated mailbox's
    /// profile without touching its delegate list.
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/v1/mailboxes/{}/profile", self.base_url, self.mailbox);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("identity probe failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            // An unknown mailbox and a missing impersonation grant are
            // indistinguishable here; both are credential problems.
            let body = response.text().await.unwrap_or_default();
            Err(Error::Credential(format!(
                "identity probe rejected: {status}: {body}"
            )))
        } else {
            Err(Self::status_error(response, "identity probe rejected").await)
        }
    }

    fn delegates_url(&self) -> String {
        format!("{}/v1/mailboxes/{}/delegates", self.base_url, self.mailbox)
    }

    /// Map a non-2xx response to the error taxonomy: authentication
    /// and authorization statuses are credential problems, everything
    /// else is the remote service misbehaving.
    async fn status_error(response: reqwest::Response, context: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Error::Credential(format!("{context}: {status}: {body}"))
        } else {
            Error::Remote(format!("{context}: {status}: {body}"))
        }
    }
}
