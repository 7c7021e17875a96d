//! Per-client throttling for the chat route.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;

use crate::core::config::settings::RateLimitSettings;

/// Forget idle clients after this many checks.
const PRUNE_EVERY: u64 = 1_024;

/// Keyed by client IP. `limiter` is `None` when throttling is disabled.
pub struct ChatRateLimiter {
    limiter: Option<DefaultKeyedRateLimiter<IpAddr>>,
    clock: DefaultClock,
    trust_forwarded_for: bool,
    checks: AtomicU64,
}

impl ChatRateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let limiter = match NonZeroU32::new(settings.requests_per_minute) {
            Some(per_minute) if settings.enabled => {
                Some(RateLimiter::keyed(Quota::per_minute(per_minute)))
            }
            _ => None,
        };
        Self {
            limiter,
            clock: DefaultClock::default(),
            trust_forwarded_for: settings.trust_forwarded_for,
            checks: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// The key a request is counted under.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        client_ip(headers, peer, self.trust_forwarded_for)
    }

    /// Consumes one request for `client`; on rejection returns how long
    /// until the next request would be allowed.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if checks % PRUNE_EVERY == 0 {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }

        limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }
}

/// Whole seconds to wait, rounded and never below one.
pub fn retry_after_secs(wait: Duration) -> u64 {
    (wait.as_millis() as f64 / 1000.0).round().max(1.0) as u64
}

pub fn too_many_requests(wait: Duration) -> Response {
    let secs = retry_after_secs(wait);
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "Too many requests.",
            "message": format!("Please try again after {} seconds.", secs),
        })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

/// The peer address, or the first `x-forwarded-for` hop when the proxy in
/// front is trusted to set it.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> IpAddr {
    let forwarded = if trust_forwarded_for {
        headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn throttle(
    State(limiter): State<Arc<ChatRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = limiter.client_key(request.headers(), peer);

    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            tracing::warn!("Rate limit exceeded for {}", client);
            too_many_requests(wait)
        }
    }
}
