//! Impersonation token exchange
//!
//! Turns a [`ServiceCredential`] into a bearer token scoped to one
//! mailbox owner: a short-lived ES256 assertion (`iss` = service
//! principal, `sub` = impersonated mailbox) is POSTed to the
//! credential's token endpoint as a JWT-bearer grant.

use crate::credential::ServiceCredential;
use crate::error::{Error, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Capability scopes required for delegate administration.
pub(crate) const SCOPES: [&str; 3] = [
    "mail.settings.sharing",
    "mail.settings.basic",
    "mail.modify",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    scope: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange the credential for an access token impersonating `mailbox`.
pub(crate) async fn fetch_access_token(
    http: &reqwest::Client,
    credential: &ServiceCredential,
    mailbox: &str,
) -> Result<String> {
    let assertion = impersonation_assertion(credential, mailbox)?;

    debug!("Requesting access token for {}", mailbox);
    let response = http
        .post(&credential.token_uri)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Credential(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Credential(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Credential(format!("invalid token response: {e}")))?;

    Ok(token.access_token)
}

/// Build the signed impersonation assertion for `mailbox`.
fn impersonation_assertion(credential: &ServiceCredential, mailbox: &str) -> Result<String> {
    let key = EncodingKey::from_ec_pem(credential.private_key())
        .map_err(|e| Error::Credential(format!("invalid private key: {e}")))?;

    let mut header = Header::new(Algorithm::ES256);
    header.kid = credential.key_id.clone();

    let iat = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: &credential.principal,
        sub: mailbox,
        aud: &credential.token_uri,
        scope: SCOPES.join(" "),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| Error::Credential(format!("failed to sign assertion: {e}")))
}
