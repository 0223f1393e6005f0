//! Fake mail service for integration testing
//!
//! An in-process HTTP server speaking enough of the remote delegation
//! API to exercise the engine end-to-end:
//!
//! - `POST /token` -- JWT-bearer token exchange. Accepts any
//!   well-formed assertion, the way the real endpoint accepts any
//!   assertion signed by a registered key.
//! - `GET /v1/mailboxes/{mailbox}/profile` -- identity probe. Denied
//!   mailboxes answer 403, unknown ones 404.
//! - `GET/POST /v1/mailboxes/{mailbox}/delegates` and
//!   `DELETE .../delegates/{email}` -- delegate CRUD backed by shared
//!   in-memory state, so a mutation is visible to every later list.
//!
//! State lives behind `Arc<Mutex<_>>` and is shared with the wiremock
//! responders; the builder seeds it per test.

use mailbox_delegates::{ServiceConfig, ServiceCredential};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// One stored delegate relation.
#[derive(Debug, Clone)]
pub struct StoredDelegate {
    pub email: String,
    pub status: &'static str,
}

#[derive(Debug, Default)]
struct ServiceState {
    mailboxes: HashMap<String, Vec<StoredDelegate>>,
    denied: HashSet<String>,
    broken_listing: HashSet<String>,
    delayed_listing: HashMap<String, Duration>,
}

/// A fake delegation service bound to an OS-assigned port.
pub struct FakeMailService {
    server: MockServer,
    state: Arc<Mutex<ServiceState>>,
}

/// Builder for seeding the fake service's state.
#[derive(Default)]
pub struct FakeServiceBuilder {
    state: ServiceState,
}

impl FakeServiceBuilder {
    /// Seed a mailbox with no delegates.
    pub fn mailbox(mut self, owner: &str) -> Self {
        self.state.mailboxes.entry(owner.to_string()).or_default();
        self
    }

    /// Seed a delegate on a mailbox (seeding the mailbox if needed).
    pub fn delegate(mut self, owner: &str, email: &str, status: &'static str) -> Self {
        self.state
            .mailboxes
            .entry(owner.to_string())
            .or_default()
            .push(StoredDelegate {
                email: email.to_string(),
                status,
            });
        self
    }

    /// The service identity is not authorized for this mailbox: the
    /// identity probe answers 403.
    pub fn deny(mut self, owner: &str) -> Self {
        self.state.denied.insert(owner.to_string());
        self.state.mailboxes.entry(owner.to_string()).or_default();
        self
    }

    /// Listing this mailbox's delegates fails with a 500.
    pub fn fail_listing(mut self, owner: &str) -> Self {
        self.state.broken_listing.insert(owner.to_string());
        self.state.mailboxes.entry(owner.to_string()).or_default();
        self
    }

    /// Listing this mailbox's delegates stalls for `delay` before
    /// answering.
    pub fn delay_listing(mut self, owner: &str, delay: Duration) -> Self {
        self.state.delayed_listing.insert(owner.to_string(), delay);
        self.state.mailboxes.entry(owner.to_string()).or_default();
        self
    }

    pub async fn start(self) -> FakeMailService {
        FakeMailService::start(self.state).await
    }
}

impl FakeMailService {
    pub fn builder() -> FakeServiceBuilder {
        FakeServiceBuilder::default()
    }

    async fn start(state: ServiceState) -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(state));

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fake-access-token",
                "expires_in": 3600,
                "token_type": "Bearer",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/v1/mailboxes/[^/]+/profile$"))
            .respond_with(ProfileResponder {
                state: state.clone(),
            })
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/v1/mailboxes/[^/]+/delegates$"))
            .respond_with(ListResponder {
                state: state.clone(),
            })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/v1/mailboxes/[^/]+/delegates$"))
            .respond_with(CreateResponder {
                state: state.clone(),
            })
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path_regex(r"^/v1/mailboxes/[^/]+/delegates/[^/]+$"))
            .respond_with(DeleteResponder {
                state: state.clone(),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    /// Engine configuration pointed at this fake.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            api_base_url: self.base_url(),
            key_file: String::new(),
            timeout_secs: 5,
        }
    }

    /// A credential the fake accepts: a throwaway EC key with the
    /// token endpoint pointed at this server.
    pub fn credential(&self) -> ServiceCredential {
        let key_pair = rcgen::KeyPair::generate().expect("generate test key");
        ServiceCredential::new(
            "svc@fake.test",
            self.token_url(),
            Some("test-key".to_string()),
            key_pair.serialize_pem().into_bytes(),
        )
    }

    /// Write a service-account key file for this fake and return its
    /// path. Used by CLI tests.
    pub fn write_key_file(&self, name: &str) -> PathBuf {
        let key_pair = rcgen::KeyPair::generate().expect("generate test key");
        let json = serde_json::json!({
            "type": "service_account",
            "client_email": "svc@fake.test",
            "private_key": key_pair.serialize_pem(),
            "private_key_id": "test-key",
            "token_uri": self.token_url(),
        });

        let path = std::env::temp_dir().join(format!(
            "delegates-key-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, serde_json::to_string_pretty(&json).expect("encode key"))
            .expect("write key file");
        path
    }

    /// Current delegate emails of a mailbox, in insertion order.
    pub fn delegates_of(&self, owner: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .mailboxes
            .get(owner)
            .map(|delegates| delegates.iter().map(|d| d.email.clone()).collect())
            .unwrap_or_default()
    }

    /// Every request the fake has received.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

// ── Responders ─────────────────────────────────────────────────────

fn path_segment(request: &Request, index: usize) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.nth(index))
        .unwrap_or_default()
        .to_string()
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": { "message": message } })
}

struct ProfileResponder {
    state: Arc<Mutex<ServiceState>>,
}

impl Respond for ProfileResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mailbox = path_segment(request, 2);
        let state = self.state.lock().unwrap();

        if state.denied.contains(&mailbox) {
            ResponseTemplate::new(403).set_body_json(error_body("impersonation not granted"))
        } else if state.mailboxes.contains_key(&mailbox) {
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "emailAddress": mailbox }))
        } else {
            ResponseTemplate::new(404).set_body_json(error_body("mailbox not found"))
        }
    }
}

struct ListResponder {
    state: Arc<Mutex<ServiceState>>,
}

impl Respond for ListResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mailbox = path_segment(request, 2);
        let state = self.state.lock().unwrap();

        if state.broken_listing.contains(&mailbox) {
            return ResponseTemplate::new(500).set_body_json(error_body("backend unavailable"));
        }

        let delegates: Vec<serde_json::Value> = state
            .mailboxes
            .get(&mailbox)
            .into_iter()
            .flatten()
            .map(|d| {
                serde_json::json!({
                    "delegateEmail": d.email,
                    "verificationStatus": d.status,
                })
            })
            .collect();

        let template =
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "delegates": delegates }));

        match state.delayed_listing.get(&mailbox) {
            Some(delay) => template.set_delay(*delay),
            None => template,
        }
    }
}

struct CreateResponder {
    state: Arc<Mutex<ServiceState>>,
}

impl Respond for CreateResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mailbox = path_segment(request, 2);

        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&request.body) else {
            return ResponseTemplate::new(400).set_body_json(error_body("invalid body"));
        };
        let Some(email) = body["delegateEmail"].as_str() else {
            return ResponseTemplate::new(400).set_body_json(error_body("delegateEmail required"));
        };

        let mut state = self.state.lock().unwrap();
        state
            .mailboxes
            .entry(mailbox)
            .or_default()
            .push(StoredDelegate {
                email: email.to_string(),
                status: "pending",
            });

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "delegateEmail": email,
            "verificationStatus": "pending",
        }))
    }
}

struct DeleteResponder {
    state: Arc<Mutex<ServiceState>>,
}

impl Respond for DeleteResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mailbox = path_segment(request, 2);
        let email = path_segment(request, 4);

        let mut state = self.state.lock().unwrap();
        let Some(delegates) = state.mailboxes.get_mut(&mailbox) else {
            return ResponseTemplate::new(404).set_body_json(error_body("mailbox not found"));
        };

        let before = delegates.len();
        delegates.retain(|d| !d.email.eq_ignore_ascii_case(&email));

        if delegates.len() == before {
            ResponseTemplate::new(404).set_body_json(error_body("delegate not found"))
        } else {
            ResponseTemplate::new(204)
        }
    }
}
