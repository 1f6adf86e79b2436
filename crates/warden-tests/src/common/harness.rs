// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`TestApp`] wires the full router to a seeded in-memory store, a manual
//! clock and an in-memory audit sink. Requests go through
//! `tower::ServiceExt::oneshot`, so no socket is bound.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use warden_api::{build_router, ApiConfig, AppState};
use warden_core::seed::seed_defaults;
use warden_core::{
    CredentialStore, InMemoryAuditLogger, InMemoryCredentialStore, ManualClock, PasswordHasher,
};

use super::fixtures::{ClientFixtures, ConfigFixtures};

// =============================================================================
// TestApp
// =============================================================================

/// A fully wired application for HTTP-level tests.
pub struct TestApp {
    router: Router,
    /// Shared application state.
    pub state: AppState,
    /// Clock driving token issuance and rate-limit windows.
    pub clock: ManualClock,
    /// Every audit entry the app wrote.
    pub audit: Arc<InMemoryAuditLogger>,
    /// The credential store behind the app.
    pub store: Arc<dyn CredentialStore>,
    /// Password hasher shared with the app.
    pub hasher: PasswordHasher,
    client: SocketAddr,
}

impl TestApp {
    /// Seeded app with the default test configuration.
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// Seeded app with the given configuration.
    pub async fn with_config(config: ApiConfig) -> Self {
        Self::builder().config(config).build().await
    }

    /// Creates a builder.
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Moves the app clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Sends a request from the default client.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.send_from(self.client, request).await
    }

    /// Sends a request from `client`.
    pub async fn send_from(&self, client: SocketAddr, mut request: Request<Body>) -> TestResponse {
        request.extensions_mut().insert(ConnectInfo(client));
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        TestResponse::from_response(response).await
    }

    /// `GET path`, with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, path, token, None)).await
    }

    /// `POST path` with a JSON body, with an optional bearer token.
    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, path, token, Some(body))).await
    }

    // =========================================================================
    // Auth Shortcuts
    // =========================================================================

    /// Posts credentials to the login route.
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.login_from(self.client, username, password).await
    }

    /// Posts credentials to the login route from `client`.
    pub async fn login_from(
        &self,
        client: SocketAddr,
        username: &str,
        password: &str,
    ) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        self.send_from(
            client,
            request(Method::POST, warden_api::paths::ACCESS_TOKEN, None, Some(body)),
        )
        .await
    }

    /// Logs in and returns the issued tokens, panicking on failure.
    pub async fn login_ok(&self, username: &str, password: &str) -> IssuedTokens {
        let response = self.login(username, password).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "login as {username} failed: {}",
            response.body
        );
        IssuedTokens::from_body(&response.body)
    }

    /// Posts a refresh token to the refresh route.
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.post_json(warden_api::paths::REFRESH_TOKEN, None, body)
            .await
    }
}

/// Builds a request with an optional bearer token and JSON body.
pub fn request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("valid request")
}

// =============================================================================
// TestAppBuilder
// =============================================================================

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    config: ApiConfig,
    store: Option<Arc<dyn CredentialStore>>,
    seed: bool,
    client: SocketAddr,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            config: ConfigFixtures::api_config(),
            store: None,
            seed: true,
            client: ClientFixtures::default_client(),
        }
    }
}

impl TestAppBuilder {
    /// Sets the API configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `store` instead of a fresh in-memory store. Seeding is skipped.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self.seed = false;
        self
    }

    /// Enables or disables seeding the superuser and default roles.
    pub fn seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the default client address.
    pub fn client(mut self, client: SocketAddr) -> Self {
        self.client = client;
        self
    }

    /// Builds the app.
    pub async fn build(self) -> TestApp {
        super::init_test_logging();

        let clock = ManualClock::starting_now();
        let hasher = ConfigFixtures::fast_hasher();
        let audit = Arc::new(InMemoryAuditLogger::new());
        let store: Arc<dyn CredentialStore> = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryCredentialStore::with_clock(clock.shared())),
        };

        if self.seed {
            seed_defaults(store.as_ref(), &hasher, &ConfigFixtures::seed_options())
                .await
                .expect("seeding an empty store");
        }

        let state = AppState::builder()
            .config(self.config)
            .store(store.clone())
            .audit_logger(audit.clone())
            .clock(clock.shared())
            .hasher(hasher.clone())
            .api_catalog(warden_api::api_catalog())
            .build()
            .expect("test state builds");

        TestApp {
            router: build_router(state.clone()),
            state,
            clock,
            audit,
            store,
            hasher,
            client: self.client,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body parsed as JSON, or `Null` when empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(response: axum::response::Response) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"].as_str()
    }

    /// A header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Tokens from a successful login or refresh.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: u64,
}

impl IssuedTokens {
    /// Reads the tokens out of a success envelope.
    pub fn from_body(body: &Value) -> Self {
        let data = &body["data"];
        Self {
            access_token: data["access_token"]
                .as_str()
                .expect("access_token in response")
                .to_string(),
            refresh_token: data["refresh_token"]
                .as_str()
                .expect("refresh_token in response")
                .to_string(),
            expires_in: data["expires_in"].as_u64().expect("expires_in in response"),
        }
    }
}
