// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer-token authentication middleware.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

use super::rate_limit::{forwarded_ip, ClientKeySource};
use crate::auth::{AuthError, SessionManager};
use crate::error::ApiError;

/// Header carrying a caller-supplied request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for bearer-token authentication.
///
/// Verifies the access token, loads the principal and attaches an
/// [`AuthContext`](crate::auth::AuthContext) to the request extensions.
/// Requests without a valid token never reach the inner service.
#[derive(Clone)]
pub struct AuthLayer {
    sessions: Arc<SessionManager>,
    ip_source: ClientKeySource,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            ip_source: ClientKeySource::Peer,
        }
    }

    /// Sets where the client IP recorded in the context comes from.
    pub fn with_ip_source(mut self, source: ClientKeySource) -> Self {
        self.ip_source = source;
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            sessions: self.sessions.clone(),
            ip_source: self.ip_source,
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer-token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    sessions: Arc<SessionManager>,
    ip_source: ClientKeySource,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let sessions = self.sessions.clone();
        let client_ip = client_ip(&req, self.ip_source);
        let request_id = request_id(req.headers());
        let token = extract_bearer_token(req.headers());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(token) = token else {
                tracing::debug!(path = %req.uri().path(), "No bearer token provided");
                return Ok(ApiError::from(AuthError::MissingToken).into_response());
            };

            match sessions.authenticate(&token, client_ip).await {
                Ok(ctx) => {
                    tracing::trace!(user_id = %ctx.user_id, %request_id, "Request authenticated");
                    req.extensions_mut().insert(ctx.with_request_id(request_id));
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, client_ip = ?client_ip, "Authentication failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Resolves the client IP of a request.
pub fn client_ip<B>(req: &Request<B>, source: ClientKeySource) -> Option<IpAddr> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    match source {
        ClientKeySource::Peer => peer,
        ClientKeySource::ForwardedFor => forwarded_ip(req.headers()).or(peer),
    }
}

/// Uses the caller's `X-Request-ID` if it is a UUID, otherwise mints one.
fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::now_v7)
}

// =============================================================================
// Tests
// =============================================================================
