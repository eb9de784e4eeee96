//! Shared fixtures for integration tests against a mockito server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockito::{Mock, Server, ServerGuard};
use portal_client::PortalClient;
use portal_client::domain::ports::CredentialStore;
use portal_client::domain::{ReadRetry, ReadRetryPolicy, RetryRuntime};
use portal_client::outbound::http::HttpPortal;
use portal_client::outbound::storage::InMemoryCredentialStore;
use portal_client::test_support::{ImmediateSleeper, MutableClock, NoJitter};
use reqwest::Url;
use serde_json::{Value, json};

pub const TOKEN: &str = "tok-ada";

/// Mock server plus a client pointed at it.
pub struct Harness {
    pub server: ServerGuard,
    pub client: PortalClient,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub clock: Arc<MutableClock>,
}

impl Harness {
    pub async fn start() -> Self {
        let server = Server::new_async().await;
        let credentials = Arc::new(InMemoryCredentialStore::default());
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0)
                .single()
                .expect("valid time"),
        ));
        let client = client_for(&server, Arc::clone(&credentials), Arc::clone(&clock));
        Self {
            server,
            client,
            credentials,
            clock,
        }
    }

    /// Build a second client over the same server and storage, as after a
    /// restart.
    pub fn restart(&self) -> PortalClient {
        client_for(
            &self.server,
            Arc::clone(&self.credentials),
            Arc::clone(&self.clock),
        )
    }

    pub fn stored_token(&self) -> Option<String> {
        self.credentials
            .load()
            .expect("load credentials")
            .token
            .map(|token| token.as_str().to_owned())
    }

    /// Mock a successful login for Ada and sign in through the client.
    pub async fn sign_in(&mut self) {
        let mock = self
            .server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "token": TOKEN, "user": ada() }).to_string())
            .create_async()
            .await;
        self.client
            .session()
            .login("ada@example.com", "secret1")
            .await
            .expect("login succeeds");
        mock.assert_async().await;
    }

    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: Value) -> Mock {
        self.server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }
}

fn client_for(
    server: &ServerGuard,
    credentials: Arc<InMemoryCredentialStore>,
    clock: Arc<MutableClock>,
) -> PortalClient {
    let portal = HttpPortal::new(
        Url::parse(&server.url()).expect("server url"),
        Duration::from_secs(5),
    )
    .expect("http client");
    let retry = ReadRetry::new(
        ReadRetryPolicy {
            retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
        },
        RetryRuntime {
            sleeper: Arc::new(ImmediateSleeper),
            jitter: Arc::new(NoJitter),
            clock: clock.clone(),
        },
    );
    PortalClient::from_parts(portal, credentials, retry, clock)
}

pub fn ada() -> Value {
    json!({
        "_id": "user-ada",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "isAdmin": false
    })
}

/// Bursary with two questions and a required CV, closing 2026-06-30.
pub fn bursary() -> Value {
    json!({
        "_id": "opp-1",
        "title": "Engineering Bursary",
        "category": "bursary",
        "provider": "Acme",
        "fieldOfStudy": "Engineering",
        "location": "Cape Town",
        "funding": { "tuition": "R50,000" },
        "minimumAverage": 65,
        "deadline": "2026-06-30T00:00:00Z",
        "questions": ["Why this bursary?", { "question": "Career goals?" }],
        "requiredDocuments": ["CV"]
    })
}

pub fn internship() -> Value {
    json!({
        "_id": "opp-2",
        "title": "Data Internship",
        "category": "Internship",
        "deadline": "2026-07-31",
        "questions": [],
        "requiredDocuments": []
    })
}
