// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rate limiting for login and refresh attempts.
//!
//! Fixed-window counters keyed by `(bucket, client key)`. Each counter is
//! updated under its `DashMap` shard lock, so concurrent requests from the
//! same client cannot undercount. Counters live in memory only and reset on
//! restart.

use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tower::{Layer, Service};
use warden_core::SharedClock;

use crate::auth::AuthError;
use crate::config::duration_secs;
use crate::error::ApiError;

/// Bucket guarding login attempts.
pub const LOGIN_BUCKET: &str = "login";

/// Bucket guarding refresh attempts.
pub const REFRESH_BUCKET: &str = "refresh";

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Capacity and window of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Attempts allowed per window.
    pub capacity: u32,
    /// Window length.
    #[serde(with = "duration_secs")]
    pub window: Duration,
}

impl BucketConfig {
    /// Creates a bucket configuration.
    pub const fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window }
    }

    /// `n` attempts per minute.
    pub const fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(60))
    }
}

/// Where the client key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKeySource {
    /// Socket peer address.
    #[default]
    Peer,
    /// `X-Forwarded-For`, then `X-Real-IP`, then the peer. Only trust this
    /// behind a proxy that overwrites these headers.
    ForwardedFor,
}

/// Configuration for rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Login bucket.
    pub login: BucketConfig,
    /// Refresh bucket.
    pub refresh: BucketConfig,
    /// Client key source.
    pub client_key: ClientKeySource,
    /// Interval between purges of stale counters.
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login: BucketConfig::per_minute(5),
            refresh: BucketConfig::per_minute(10),
            client_key: ClientKeySource::Peer,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Creates a disabled rate limiter.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Returns the named buckets.
    pub fn buckets(&self) -> HashMap<String, BucketConfig> {
        HashMap::from([
            (LOGIN_BUCKET.to_string(), self.login),
            (REFRESH_BUCKET.to_string(), self.refresh),
        ])
    }
}

// =============================================================================
// Client Keys
// =============================================================================

/// Derives the rate-limit identity of a request.
///
/// Address-based keys are spoofable behind shared proxies; implement this
/// trait to key on something stronger.
pub trait ClientKeyExtractor: Send + Sync + 'static {
    /// Returns the client key, or `None` if it cannot be determined.
    fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String>;
}

/// Keys by socket peer IP.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerAddrKey;

impl ClientKeyExtractor for PeerAddrKey {
    fn client_key(&self, _headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        peer.map(|addr| addr.ip().to_string())
    }
}

/// Keys by the first forwarded hop, falling back to the peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedForKey;

impl ClientKeyExtractor for ForwardedForKey {
    fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        forwarded_ip(headers)
            .or_else(|| peer.map(|addr| addr.ip()))
            .map(|ip| ip.to_string())
    }
}

/// Parses the client IP from `X-Forwarded-For` or `X-Real-IP`.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok());

    forwarded.or_else(|| {
        headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
    })
}

impl ClientKeySource {
    /// Builds the matching extractor.
    pub fn extractor(self) -> Arc<dyn ClientKeyExtractor> {
        match self {
            ClientKeySource::Peer => Arc::new(PeerAddrKey),
            ClientKeySource::ForwardedFor => Arc::new(ForwardedForKey),
        }
    }
}

// =============================================================================
// RateLimiter
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed {
        /// Attempts left in the current window.
        remaining: u32,
    },
    /// Request is rate limited.
    Denied {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl RateLimitResult {
    /// Returns `true` if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Named fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    buckets: HashMap<String, BucketConfig>,
    windows: DashMap<(String, String), Window>,
    clock: SharedClock,
}

impl RateLimiter {
    /// Creates a rate limiter from configuration.
    pub fn new(config: &RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            enabled: config.enabled,
            buckets: config.buckets(),
            windows: DashMap::new(),
            clock,
        }
    }

    /// Counts one attempt by `client_key` against `bucket`.
    ///
    /// Unknown buckets are not limited.
    pub fn check(&self, client_key: &str, bucket: &str) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::Allowed { remaining: u32::MAX };
        }
        let Some(limits) = self.buckets.get(bucket) else {
            tracing::debug!(bucket, "No limits configured for bucket");
            return RateLimitResult::Allowed { remaining: u32::MAX };
        };

        let now = self.clock.now();
        let window = chrono::Duration::from_std(limits.window).unwrap_or(chrono::TimeDelta::MAX);

        let mut entry = self
            .windows
            .entry((bucket.to_string(), client_key.to_string()))
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if now - entry.started_at >= window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= limits.capacity {
            let resets_at = entry.started_at + window;
            let retry_after = (resets_at - now).to_std().unwrap_or(Duration::ZERO);
            return RateLimitResult::Denied { retry_after };
        }

        entry.count += 1;
        RateLimitResult::Allowed {
            remaining: limits.capacity - entry.count,
        }
    }

    /// Removes counters whose window has elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|(bucket, _), window| {
            self.buckets
                .get(bucket)
                .and_then(|b| chrono::Duration::from_std(b.window).ok())
                .is_some_and(|w| now - window.started_at < w)
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of live counters.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Returns `true` if limiting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Spawns a task that purges stale counters every `interval`.
    pub fn spawn_cleanup(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Purged stale rate-limit counters");
                }
            }
        })
    }
}

// =============================================================================
// RateLimitLayer
// =============================================================================

/// Layer enforcing one bucket on the routes it wraps.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    bucket: Arc<str>,
    keys: Arc<dyn ClientKeyExtractor>,
}

impl RateLimitLayer {
    /// Creates a rate limit layer for `bucket`.
    pub fn new(
        limiter: Arc<RateLimiter>,
        bucket: &str,
        keys: Arc<dyn ClientKeyExtractor>,
    ) -> Self {
        Self {
            limiter,
            bucket: Arc::from(bucket),
            keys,
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
            bucket: self.bucket.clone(),
            keys: self.keys.clone(),
        }
    }
}

// =============================================================================
// RateLimitMiddleware
// =============================================================================

/// Middleware for rate limiting.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
    bucket: Arc<str>,
    keys: Arc<dyn ClientKeyExtractor>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
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
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        // Requests without an identifiable client share one counter.
        let key = self
            .keys
            .client_key(req.headers(), peer)
            .unwrap_or_else(|| "unknown".to_string());
        let result = self.limiter.check(&key, &self.bucket);
        let bucket = self.bucket.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match result {
                RateLimitResult::Allowed { .. } => inner.call(req).await,
                RateLimitResult::Denied { retry_after } => {
                    tracing::warn!(
                        client = %key,
                        bucket = %bucket,
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limit exceeded"
                    );
                    Ok(ApiError::from(AuthError::RateLimited {
                        bucket: bucket.to_string(),
                        retry_after,
                    })
                    .into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use warden_core::ManualClock;

    fn limiter(config: &RateLimitConfig) -> (RateLimiter, ManualClock) {
        let clock = ManualClock::starting_now();
        (RateLimiter::new(config, clock.shared()), clock)
    }

    #[test]
    fn test_login_bucket_allows_five_then_denies() {
        let (limiter, _clock) = limiter(&RateLimitConfig::default());

        for expected_remaining in (0..5).rev() {
            assert_eq!(
                limiter.check("10.0.0.1", LOGIN_BUCKET),
                RateLimitResult::Allowed {
                    remaining: expected_remaining
                }
            );
        }
        assert_eq!(
            limiter.check("10.0.0.1", LOGIN_BUCKET),
            RateLimitResult::Denied {
                retry_after: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn test_window_reset() {
        let (limiter, clock) = limiter(&RateLimitConfig::default());
        for _ in 0..5 {
            limiter.check("c", LOGIN_BUCKET);
        }

        clock.advance(Duration::from_secs(45));
        assert_eq!(
            limiter.check("c", LOGIN_BUCKET),
            RateLimitResult::Denied {
                retry_after: Duration::from_secs(15)
            }
        );

        clock.advance(Duration::from_secs(15));
        assert!(limiter.check("c", LOGIN_BUCKET).is_allowed());
    }

    #[test]
    fn test_keys_and_buckets_are_independent() {
        let (limiter, _clock) = limiter(&RateLimitConfig::default());
        for _ in 0..5 {
            limiter.check("a", LOGIN_BUCKET);
        }
        assert!(!limiter.check("a", LOGIN_BUCKET).is_allowed());
        assert!(limiter.check("b", LOGIN_BUCKET).is_allowed());
        assert!(limiter.check("a", REFRESH_BUCKET).is_allowed());
    }

    #[test]
    fn test_refresh_bucket_capacity() {
        let (limiter, _clock) = limiter(&RateLimitConfig::default());
        for _ in 0..10 {
            assert!(limiter.check("a", REFRESH_BUCKET).is_allowed());
        }
        assert!(!limiter.check("a", REFRESH_BUCKET).is_allowed());
    }

    #[test]
    fn test_disabled_and_unknown_bucket() {
        let (limiter, _clock) = limiter(&RateLimitConfig::disabled());
        for _ in 0..100 {
            assert!(limiter.check("a", LOGIN_BUCKET).is_allowed());
        }

        let (limiter, _clock) = self::limiter(&RateLimitConfig::default());
        for _ in 0..100 {
            assert!(limiter.check("a", "uploads").is_allowed());
        }
    }

    #[test]
    fn test_purge_expired() {
        let (limiter, clock) = limiter(&RateLimitConfig::default());
        limiter.check("a", LOGIN_BUCKET);
        limiter.check("b", REFRESH_BUCKET);
        assert_eq!(limiter.tracked_keys(), 2);

        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.purge_expired(), 0);

        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.purge_expired(), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_concurrent_checks_do_not_undercount() {
        let (limiter, _clock) = limiter(&RateLimitConfig::default());
        let limiter = Arc::new(limiter);

        let allowed: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let limiter = limiter.clone();
                    s.spawn(move || limiter.check("same", LOGIN_BUCKET).is_allowed() as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(allowed, 5);
    }

    #[test]
    fn test_client_key_extractors() {
        let peer: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));

        assert_eq!(
            PeerAddrKey.client_key(&headers, Some(peer)).as_deref(),
            Some("192.168.1.9")
        );
        assert_eq!(
            ForwardedForKey.client_key(&headers, Some(peer)).as_deref(),
            Some("203.0.113.7")
        );

        let mut real_ip = HeaderMap::new();
        real_ip.insert("X-Real-IP", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            ForwardedForKey.client_key(&real_ip, Some(peer)).as_deref(),
            Some("198.51.100.2")
        );
        assert_eq!(
            ForwardedForKey.client_key(&HeaderMap::new(), None),
            None
        );
    }
}
