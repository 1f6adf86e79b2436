// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging middleware.
//!
//! Records one entry per authenticated request: who, what, the response
//! status and how long it took. Request bodies are never recorded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{body::Body, http::Request, response::Response};
use tower::{Layer, Service};
use warden_core::{ActionResult, AuditAction, AuditLog, AuditLogger, SharedClock};

use crate::auth::AuthContext;
use crate::config::AuditConfig;

// =============================================================================
// AuditLayer
// =============================================================================

/// Layer for audit logging.
#[derive(Clone)]
pub struct AuditLayer {
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
    clock: SharedClock,
}

impl AuditLayer {
    /// Creates a new audit layer.
    pub fn new(logger: Arc<dyn AuditLogger>, config: AuditConfig, clock: SharedClock) -> Self {
        Self {
            logger,
            config: Arc::new(config),
            clock,
        }
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware {
            inner,
            logger: self.logger.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

// =============================================================================
// AuditMiddleware
// =============================================================================

/// Middleware for audit logging.
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
    clock: SharedClock,
}

impl<S> Service<Request<Body>> for AuditMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let logger = self.logger.clone();
        let clock = self.clock.clone();
        let should_audit = self.config.should_audit(req.uri().path());
        let method = req.method().as_str().to_string();
        let path = req.uri().path().to_string();
        let auth_ctx = req.extensions().get::<AuthContext>().cloned();

        let mut inner = self.inner.clone();
        let started_at = clock.now();
        let start = Instant::now();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if should_audit {
                let status = response.status().as_u16();
                let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let mut log = AuditLog::new(AuditAction::Request, &path, ActionResult::from_status(status))
                    .with_http(method, status)
                    .with_duration(duration_ms)
                    .at(started_at);

                if let Some(ctx) = auth_ctx {
                    log = log
                        .with_user(ctx.user_id, Some(&ctx.username))
                        .with_client_ip(ctx.client_ip)
                        .with_request_id(ctx.request_id.to_string());
                }

                if let Err(e) = logger.log(log).await {
                    tracing::warn!(error = %e, "Failed to write audit log");
                }
            }

            Ok(response)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use warden_core::{InMemoryAuditLogger, ManualClock};

    async fn run(config: AuditConfig, audit: &InMemoryAuditLogger, path: &str, status: StatusCode) {
        let clock = ManualClock::starting_now();
        let service = AuditLayer::new(Arc::new(audit.clone()), config, clock.shared()).layer(
            tower::service_fn(move |_req: Request<Body>| async move {
                let mut resp = Response::new(Body::empty());
                *resp.status_mut() = status;
                Ok::<_, std::convert::Infallible>(resp)
            }),
        );
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        service.oneshot(req).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_is_recorded() {
        let audit = InMemoryAuditLogger::new();
        run(AuditConfig::default(), &audit, "/api/v1/user/deactivate", StatusCode::OK).await;

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Request);
        assert_eq!(entries[0].method.as_deref(), Some("POST"));
        assert_eq!(entries[0].status, Some(200));
        assert!(entries[0].result.is_success());
    }

    #[tokio::test]
    async fn test_failure_status_recorded() {
        let audit = InMemoryAuditLogger::new();
        run(AuditConfig::default(), &audit, "/api/v1/user/list", StatusCode::FORBIDDEN).await;
        assert!(audit.entries()[0].result.is_denied());
    }

    #[tokio::test]
    async fn test_excluded_and_disabled() {
        let audit = InMemoryAuditLogger::new();
        run(AuditConfig::default(), &audit, "/api/v1/base/access_token", StatusCode::OK).await;
        run(AuditConfig::disabled(), &audit, "/api/v1/user/list", StatusCode::OK).await;
        assert!(audit.is_empty());
    }
}
