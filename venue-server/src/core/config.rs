//! Server configuration
//!
//! Read from environment variables (a `.env` file is loaded first by the
//! binary). Every value has a default except `JWT_SECRET`, which must be set
//! outside development.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use rand::Rng;
use rand::distributions::Alphanumeric;

use super::error::{Result, ServerError};
use crate::auth::{JwtConfig, LockoutPolicy};
use crate::middleware::RateLimitConfig;

/// Minimum JWT secret length outside development
pub const MIN_JWT_SECRET_LEN: usize = 32;

const MAX_ACCESS_TOKEN_MINUTES: i64 = 24 * 60;
const MAX_REFRESH_TOKEN_DAYS: i64 = 365;
const MAX_LOCKOUT_MINUTES: i64 = 7 * 24 * 60;
const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ServerError::Config(format!("unknown ENVIRONMENT: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// HTTP listen port
    pub http_port: u16,
    /// Data directory: database and default log location
    pub work_dir: PathBuf,
    /// redb file name under `work_dir`
    pub database_file: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
    pub jwt: JwtConfig,
    pub lockout: LockoutPolicy,
    /// Applied to every login response
    pub auth_fixed_delay: Duration,
    pub rate_limit: RateLimitConfig,
    pub request_timeout: Duration,
    /// Audit channel capacity
    pub audit_buffer_size: usize,
    /// Cost of newly created password hashes
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) if environment != Environment::Development
                && secret.len() < MIN_JWT_SECRET_LEN =>
            {
                return Err(ServerError::Config(format!(
                    "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters"
                )));
            }
            Some(secret) => secret,
            None if environment == Environment::Development => {
                tracing::warn!("JWT_SECRET not set, generating a temporary development key");
                generate_dev_secret()
            }
            None => {
                return Err(ServerError::Config(
                    "JWT_SECRET must be set outside development".to_string(),
                ));
            }
        };

        let rate_defaults = RateLimitConfig::default();
        let lockout_defaults = LockoutPolicy::default();

        Ok(Self {
            environment,
            http_port: parse_or(&var, "HTTP_PORT", 8080)?,
            work_dir: var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            database_file: var("DATABASE_FILE").unwrap_or_else(|| "venue.redb".to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_or(&var, "LOG_JSON", false)?,
            log_dir: var("LOG_DIR").map(PathBuf::from),
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer: var("JWT_ISSUER").unwrap_or_else(|| "venue-server".to_string()),
                audience: var("JWT_AUDIENCE").unwrap_or_else(|| "venue-staff".to_string()),
                access_ttl_minutes: parse_in_range(
                    &var,
                    "ACCESS_TOKEN_MINUTES",
                    15,
                    1..=MAX_ACCESS_TOKEN_MINUTES,
                )?,
                refresh_ttl_days: parse_in_range(
                    &var,
                    "REFRESH_TOKEN_DAYS",
                    7,
                    1..=MAX_REFRESH_TOKEN_DAYS,
                )?,
            },
            lockout: LockoutPolicy {
                max_attempts: parse_or(&var, "LOCKOUT_MAX_ATTEMPTS", lockout_defaults.max_attempts)?,
                lock_duration: TimeDelta::minutes(parse_in_range(
                    &var,
                    "LOCKOUT_MINUTES",
                    lockout_defaults.lock_duration.num_minutes(),
                    1..=MAX_LOCKOUT_MINUTES,
                )?),
            },
            auth_fixed_delay: Duration::from_millis(parse_or(&var, "AUTH_FIXED_DELAY_MS", 0)?),
            rate_limit: RateLimitConfig {
                auth_per_window: parse_or(&var, "RATE_LIMIT_AUTH", rate_defaults.auth_per_window)?,
                tracking_per_window: parse_or(
                    &var,
                    "RATE_LIMIT_TRACKING",
                    rate_defaults.tracking_per_window,
                )?,
                api_per_window: parse_or(&var, "RATE_LIMIT_API", rate_defaults.api_per_window)?,
                window_secs: parse_in_range(
                    &var,
                    "RATE_LIMIT_WINDOW_SECS",
                    rate_defaults.window_secs,
                    1..=MAX_RATE_LIMIT_WINDOW_SECS,
                )?,
                trust_forwarded_for: parse_or(
                    &var,
                    "TRUST_FORWARDED_FOR",
                    rate_defaults.trust_forwarded_for,
                )?,
            },
            request_timeout: Duration::from_millis(parse_or(&var, "REQUEST_TIMEOUT_MS", 30_000)?),
            audit_buffer_size: parse_or(&var, "AUDIT_BUFFER_SIZE", 1024)?,
            argon2_memory_kib: parse_or(&var, "ARGON2_MEMORY_KIB", 19_456)?,
            argon2_iterations: parse_or(&var, "ARGON2_ITERATIONS", 2)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn database_path(&self) -> PathBuf {
        self.work_dir.join(&self.database_file)
    }
}

fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid {name}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

fn parse_in_range<T, F>(var: &F, name: &str, default: T, range: RangeInclusive<T>) -> Result<T>
where
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(var, name, default)?;
    if !range.contains(&value) {
        return Err(ServerError::Config(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

fn generate_dev_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_in_development() {
        let config = load(&[]).unwrap();
        assert!(config.is_development());
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.jwt.access_ttl_minutes, 15);
        assert_eq!(config.jwt.refresh_ttl_days, 7);
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.lockout.lock_duration, TimeDelta::minutes(30));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.jwt.secret.len(), 64);
        assert_eq!(config.database_path(), PathBuf::from("./data/venue.redb"));
    }

    #[test]
    fn test_production_requires_long_secret() {
        assert!(load(&[("ENVIRONMENT", "production")]).is_err());
        assert!(load(&[("ENVIRONMENT", "production"), ("JWT_SECRET", "short")]).is_err());

        let secret = "x".repeat(MIN_JWT_SECRET_LEN);
        let config = load(&[("ENVIRONMENT", "production"), ("JWT_SECRET", &secret)]).unwrap();
        assert_eq!(config.jwt.secret, secret);
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = load(&[
            ("HTTP_PORT", "9000"),
            ("RATE_LIMIT_AUTH", "3"),
            ("LOCKOUT_MINUTES", "5"),
            ("LOG_JSON", "true"),
        ])
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.rate_limit.auth_per_window, 3);
        assert_eq!(config.lockout.lock_duration, TimeDelta::minutes(5));
        assert!(config.log_json);

        assert!(matches!(
            load(&[("HTTP_PORT", "eighty")]),
            Err(ServerError::Config(_))
        ));
        assert!(load(&[("ENVIRONMENT", "moon")]).is_err());
    }

    #[test]
    fn test_durations_must_be_positive_and_bounded() {
        for (name, value) in [
            ("ACCESS_TOKEN_MINUTES", "0"),
            ("ACCESS_TOKEN_MINUTES", "-15"),
            ("ACCESS_TOKEN_MINUTES", "9223372036854775807"),
            ("REFRESH_TOKEN_DAYS", "-1"),
            ("REFRESH_TOKEN_DAYS", "1000000000000"),
            ("LOCKOUT_MINUTES", "0"),
            ("LOCKOUT_MINUTES", "9223372036854775807"),
            ("RATE_LIMIT_WINDOW_SECS", "0"),
        ] {
            assert!(
                matches!(load(&[(name, value)]), Err(ServerError::Config(_))),
                "{name}={value} should be rejected"
            );
        }

        let config = load(&[
            ("ACCESS_TOKEN_MINUTES", "60"),
            ("REFRESH_TOKEN_DAYS", "30"),
            ("LOCKOUT_MINUTES", "1"),
        ])
        .unwrap();
        assert_eq!(config.jwt.access_ttl_minutes, 60);
        assert_eq!(config.jwt.refresh_ttl_days, 30);
        assert_eq!(config.lockout.lock_duration, TimeDelta::minutes(1));
    }

    #[test]
    fn test_forwarded_for_is_untrusted_by_default() {
        assert!(!load(&[]).unwrap().rate_limit.trust_forwarded_for);
        let config = load(&[("TRUST_FORWARDED_FOR", "true")]).unwrap();
        assert!(config.rate_limit.trust_forwarded_for);
    }
}
