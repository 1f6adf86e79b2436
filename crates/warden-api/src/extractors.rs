// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRef, FromRequestParts, Query},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::auth::{AuthContext, AuthError};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit::forwarded_ip;
use crate::middleware::ClientKeySource;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` the auth layer attached. Returns 401 if the
/// route was mounted without authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.username)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Request payloads that check their own fields after deserialization.
pub trait Validate {
    /// Returns a validation error describing the first bad field.
    fn validate(&self) -> ApiResult<()>;
}

/// Extractor for validated JSON payloads.
///
/// Malformed JSON is a 400; well-formed JSON with missing or mistyped
/// fields, or that fails [`Validate`], is a 422.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(e) => ApiError::validation(e.body_text()),
                other => ApiError::bad_request(format!("Invalid JSON: {}", other.body_text())),
            })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Extractor for validated query strings. Any failure is a 422.
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

// =============================================================================
// Request ID Extractor
// =============================================================================

/// Extractor for the request ID.
pub struct RequestId(pub uuid::Uuid);

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| ctx.request_id)
            .unwrap_or_else(uuid::Uuid::now_v7);

        Ok(RequestId(id))
    }
}

// =============================================================================
// Client IP Extractor
// =============================================================================

/// Extractor for the client IP address.
///
/// Forwarding headers are trusted only when the rate limiter is configured
/// to key on them.
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    Arc<ApiConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ApiConfig>::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        let ip = match config.rate_limit.client_key {
            ClientKeySource::Peer => peer,
            ClientKeySource::ForwardedFor => forwarded_ip(&parts.headers).or(peer),
        };

        Ok(ClientIp(ip))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    impl Validate for Payload {
        fn validate(&self) -> ApiResult<()> {
            if self.name.is_empty() {
                return Err(ApiError::validation("name must not be empty"));
            }
            Ok(())
        }
    }

    async fn extract(body: &'static str) -> Result<Payload, ApiError> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        ValidatedJson::<Payload>::from_request(req, &())
            .await
            .map(|ValidatedJson(p)| p)
    }

    #[tokio::test]
    async fn test_validated_json() {
        assert_eq!(extract(r#"{"name":"x"}"#).await.unwrap().name, "x");

        let err = extract("{not json").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = extract(r#"{"other":1}"#).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = extract(r#"{"name":""}"#).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: usize,
    }

    impl Validate for Paging {
        fn validate(&self) -> ApiResult<()> {
            if self.page == 0 {
                return Err(ApiError::validation("page starts at 1"));
            }
            Ok(())
        }
    }

    async fn extract_query(uri: &'static str) -> Result<Paging, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(Body::empty()).unwrap().into_parts();
        ValidatedQuery::<Paging>::from_request_parts(&mut parts, &())
            .await
            .map(|ValidatedQuery(p)| p)
    }

    #[tokio::test]
    async fn test_validated_query() {
        assert_eq!(extract_query("/?page=2").await.unwrap().page, 2);

        let err = extract_query("/?page=two").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = extract_query("/?page=0").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_auth_requires_context() {
        let (mut parts, _) = Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = Auth::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_client_ip_respects_key_source() {
        let (mut parts, _) = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "198.51.100.7")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo("10.0.0.2:5000".parse::<SocketAddr>().unwrap()));

        let config = Arc::new(ApiConfig::default());
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &config).await.unwrap();
        assert_eq!(ip, Some("10.0.0.2".parse().unwrap()));

        let mut forwarded = ApiConfig::default();
        forwarded.rate_limit.client_key = ClientKeySource::ForwardedFor;
        let config = Arc::new(forwarded);
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &config).await.unwrap();
        assert_eq!(ip, Some("198.51.100.7".parse().unwrap()));
    }
}
