//! HTTP middleware
//!
//! Layer order, outermost first: request id, logging, timeout, sanitize,
//! rate limit, then routing.

pub mod logging;
pub mod rate_limit;
pub mod sanitize;

pub use logging::logging_middleware;
pub use rate_limit::{EndpointClass, RateLimitConfig, RateLimiter, client_ip, rate_limit};
pub use sanitize::{MAX_BODY_BYTES, sanitize_json_body, sanitize_value};
