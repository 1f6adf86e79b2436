// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Development-mode error bodies.
//!
//! Error responses always carry the generic message. When detail exposure is
//! on, this layer swaps in the [`ErrorDetail`] body attached by
//! [`ApiError`](crate::error::ApiError).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    response::Response,
};
use tower::{Layer, Service};

use crate::error::ErrorDetail;

// =============================================================================
// ErrorDetailLayer
// =============================================================================

/// Layer that exposes detailed error descriptions.
#[derive(Debug, Clone, Copy)]
pub struct ErrorDetailLayer {
    expose: bool,
}

impl ErrorDetailLayer {
    /// Creates the layer. With `expose == false` responses pass through untouched.
    pub fn new(expose: bool) -> Self {
        Self { expose }
    }
}

impl<S> Layer<S> for ErrorDetailLayer {
    type Service = ErrorDetailMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorDetailMiddleware {
            inner,
            expose: self.expose,
        }
    }
}

// =============================================================================
// ErrorDetailMiddleware
// =============================================================================

/// Middleware that rewrites error bodies.
#[derive(Debug, Clone)]
pub struct ErrorDetailMiddleware<S> {
    inner: S,
    expose: bool,
}

impl<S> Service<Request<Body>> for ErrorDetailMiddleware<S>
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
        let expose = self.expose;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            if !expose {
                return Ok(response);
            }
            Ok(expose_detail(response))
        })
    }
}

fn expose_detail(mut response: Response) -> Response {
    let Some(ErrorDetail(detailed)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };

    let bytes = match serde_json::to_vec(&detailed) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize detailed error body");
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(bytes))
}

// =============================================================================
// Tests
// =============================================================================
