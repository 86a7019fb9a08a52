//! Fixed-window rate limiting per client and endpoint class

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use http::{Extensions, HeaderMap};
use serde_json::json;
use shared::error::AppError;

use crate::audit::{AuditAction, ClientOrigin};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::time::{SharedClock, now_millis};

/// Budget group a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Login and refresh
    Auth,
    /// Public order tracking
    Tracking,
    /// Everything else under `/v1/`
    Api,
}

impl EndpointClass {
    /// `None` for unlimited paths (health)
    pub fn for_path(path: &str) -> Option<Self> {
        if path.starts_with("/v1/auth/") {
            Some(Self::Auth)
        } else if path.starts_with("/v1/track/") {
            Some(Self::Tracking)
        } else if path.starts_with("/v1/") {
            Some(Self::Api)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Tracking => "tracking",
            Self::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub auth_per_window: u32,
    pub tracking_per_window: u32,
    pub api_per_window: u32,
    pub window_secs: u64,
    /// Key clients by `X-Forwarded-For`; only safe behind a proxy that overwrites it
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth_per_window: 10,
            tracking_per_window: 120,
            api_per_window: 600,
            window_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    fn budget(&self, class: EndpointClass) -> u32 {
        match class {
            EndpointClass::Auth => self.auth_per_window,
            EndpointClass::Tracking => self.tracking_per_window,
            EndpointClass::Api => self.api_per_window,
        }
    }
}

struct WindowEntry {
    count: u32,
    window_start: i64,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<(EndpointClass, String), WindowEntry>>,
    config: RateLimitConfig,
    clock: SharedClock,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked", &self.windows.len())
            .finish()
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window_ms(&self) -> i64 {
        (self.config.window_secs as i64).saturating_mul(1000)
    }

    /// Count one request; `false` once the class budget is spent
    pub fn allow(&self, client_key: &str, class: EndpointClass) -> bool {
        let now = now_millis(&self.clock);
        let window_ms = self.window_ms();

        let mut entry = self
            .windows
            .entry((class, client_key.to_owned()))
            .or_insert(WindowEntry {
                count: 0,
                window_start: now,
            });

        if now - entry.window_start >= window_ms {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.config.budget(class)
    }

    /// Drop windows that ended; returns how many were removed
    pub fn cleanup(&self) -> usize {
        let now = now_millis(&self.clock);
        let window_ms = self.window_ms();
        let before = self.windows.len();
        self.windows
            .retain(|_, entry| now - entry.window_start < window_ms);
        before.saturating_sub(self.windows.len())
    }
}

/// Client key: the peer address, or the first `X-Forwarded-For` entry when
/// the proxy is trusted
pub fn client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for
        && let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    extensions
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Rate limit middleware; the class comes from the request path
pub async fn rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(class) = EndpointClass::for_path(request.uri().path()) else {
        return next.run(request).await;
    };

    let limiter = state.rate_limiter();
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        limiter.config().trust_forwarded_for,
    );
    if limiter.allow(&ip, class) {
        return next.run(request).await;
    }

    security_log!("WARN", "rate_limited", ip = ip.as_str(), class = class.as_str());
    let origin = ClientOrigin {
        ip: Some(ip),
        user_agent: request
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state.audit().log(
        AuditAction::RateLimitExceeded,
        None,
        &origin,
        json!({ "class": class.as_str(), "path": request.uri().path() }),
    );

    AppError::too_many_requests(limiter.config().window_secs).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::ManualClock;
    use chrono::DateTime;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = ManualClock::shared(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let limiter = RateLimiter::new(RateLimitConfig::default(), clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_class_for_path() {
        assert_eq!(EndpointClass::for_path("/v1/auth/login"), Some(EndpointClass::Auth));
        assert_eq!(
            EndpointClass::for_path("/v1/track/venue-1-0001"),
            Some(EndpointClass::Tracking)
        );
        assert_eq!(EndpointClass::for_path("/v1/orders"), Some(EndpointClass::Api));
        assert_eq!(EndpointClass::for_path("/health"), None);
    }

    #[test]
    fn test_denies_after_budget_until_window_ends() {
        let (clock, limiter) = limiter();
        for _ in 0..10 {
            assert!(limiter.allow("10.0.0.1", EndpointClass::Auth));
        }
        assert!(!limiter.allow("10.0.0.1", EndpointClass::Auth));

        // Separate budgets per client and per class
        assert!(limiter.allow("10.0.0.2", EndpointClass::Auth));
        assert!(limiter.allow("10.0.0.1", EndpointClass::Tracking));

        clock.advance_seconds(59);
        assert!(!limiter.allow("10.0.0.1", EndpointClass::Auth));
        clock.advance_seconds(1);
        assert!(limiter.allow("10.0.0.1", EndpointClass::Auth));
    }

    #[test]
    fn test_dashboard_polling_stays_under_api_budget() {
        let (clock, limiter) = limiter();
        for _ in 0..120 {
            assert!(limiter.allow("staff", EndpointClass::Api));
            clock.advance_seconds(30);
        }
    }

    #[test]
    fn test_cleanup_drops_finished_windows() {
        let (clock, limiter) = limiter();
        limiter.allow("a", EndpointClass::Api);
        clock.advance_seconds(30);
        limiter.allow("b", EndpointClass::Api);

        clock.advance_seconds(30);
        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.cleanup(), 0);
    }

    #[test]
    fn test_client_ip_uses_forwarded_for_only_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " 203.0.113.7 , 10.0.0.1".parse().unwrap());
        let mut extensions = Extensions::new();
        assert_eq!(client_ip(&headers, &extensions, true), "203.0.113.7");
        assert_eq!(client_ip(&headers, &extensions, false), "unknown");

        let peer: std::net::SocketAddr = "192.0.2.4:5555".parse().unwrap();
        extensions.insert(axum::extract::ConnectInfo(peer));
        assert_eq!(client_ip(&headers, &extensions, false), "192.0.2.4");
        assert_eq!(client_ip(&HeaderMap::new(), &extensions, true), "192.0.2.4");
        assert_eq!(client_ip(&HeaderMap::new(), &Extensions::new(), false), "unknown");
    }
}
