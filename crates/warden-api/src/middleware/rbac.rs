// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RBAC (Role-Based Access Control) middleware.
//!
//! Makes the single authorization decision for a protected request, using
//! the capability set the auth layer attached.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use warden_core::{AuditLog, AuditLogger, SharedClock};

use crate::auth::{AuthContext, AuthError, Decision, RbacPolicy};
use crate::error::ApiError;

// =============================================================================
// RbacLayer
// =============================================================================

/// Layer for role-based access control.
#[derive(Clone)]
pub struct RbacLayer {
    policy: RbacPolicy,
    audit: Arc<dyn AuditLogger>,
    clock: SharedClock,
}

impl RbacLayer {
    /// Creates the layer. Denials are written to `audit`.
    pub fn new(policy: RbacPolicy, audit: Arc<dyn AuditLogger>, clock: SharedClock) -> Self {
        Self {
            policy,
            audit,
            clock,
        }
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            policy: self.policy,
            audit: self.audit.clone(),
            clock: self.clock.clone(),
        }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for RBAC enforcement.
#[derive(Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    policy: RbacPolicy,
    audit: Arc<dyn AuditLogger>,
    clock: SharedClock,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
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
        let policy = self.policy;
        let audit = self.audit.clone();
        let clock = self.clock.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<AuthContext>().cloned() else {
                tracing::warn!("No auth context found, denying access");
                return Ok(ApiError::from(AuthError::MissingToken).into_response());
            };

            let method = req.method().as_str().to_string();
            let path = req.uri().path().to_string();

            match policy.authorize(&ctx, &method, &path) {
                Decision::Allow(reason) => {
                    tracing::trace!(user_id = %ctx.user_id, ?reason, %method, %path, "Access granted");
                    inner.call(req).await
                }
                Decision::Deny => {
                    tracing::warn!(
                        user_id = %ctx.user_id,
                        roles = ?ctx.roles,
                        %method,
                        %path,
                        "Permission denied"
                    );
                    let entry = AuditLog::access_denied(ctx.user_id, &method, &path, ctx.client_ip)
                        .with_username(ctx.username.clone())
                        .with_request_id(ctx.request_id.to_string())
                        .at(clock.now());
                    if let Err(e) = audit.log(entry).await {
                        tracing::warn!(error = %e, "Failed to write audit entry");
                    }
                    Ok(ApiError::from(AuthError::PermissionDenied { method, path }).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
