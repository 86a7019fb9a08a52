//! Shared server state
//!
//! Cheap to clone; every service sits behind an `Arc`. Handlers receive it
//! through axum's `State` extractor.

use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditService, AuditStorage, AuditWorker};
use crate::auth::{AuthService, CredentialHasher, LockoutGuard, TokenService};
use crate::core::{Config, Result, ServerError};
use crate::db::Storage;
use crate::db::repository::{LockoutRepository, OrderRepository, UserRepository};
use crate::middleware::RateLimiter;
use crate::orders::OrderService;
use crate::utils::time::{SharedClock, system_clock};

/// How often idle rate-limit windows are evicted
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: Storage,
    clock: SharedClock,
    tokens: Arc<TokenService>,
    auth: Arc<AuthService>,
    orders: Arc<OrderService>,
    audit: Arc<AuditService>,
    rate_limiter: RateLimiter,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Open the database under `work_dir` and wire every service
    ///
    /// Must run inside a tokio runtime: the audit worker is spawned here.
    pub fn initialize(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = Storage::open(config.database_path())?;
        tracing::info!(path = %config.database_path().display(), "Database opened");
        Self::build(config, storage, system_clock())
    }

    /// State on an in-memory database with the given clock (tests, demos)
    pub fn in_memory(config: Config, clock: SharedClock) -> Result<Self> {
        Self::build(config, Storage::open_in_memory()?, clock)
    }

    pub fn build(config: Config, storage: Storage, clock: SharedClock) -> Result<Self> {
        let audit_storage = AuditStorage::new(storage.clone());
        let (audit, rx) =
            AuditService::new(audit_storage.clone(), clock.clone(), config.audit_buffer_size);
        tokio::spawn(AuditWorker::new(audit_storage).run(rx));

        let tokens = Arc::new(TokenService::new(config.jwt.clone(), clock.clone()));
        let hasher = CredentialHasher::with_cost(config.argon2_memory_kib, config.argon2_iterations)
            .map_err(|e| ServerError::Config(format!("invalid argon2 parameters: {e}")))?;

        let auth = Arc::new(AuthService::new(
            UserRepository::new(storage.clone()),
            LockoutGuard::new(
                LockoutRepository::new(storage.clone()),
                config.lockout,
                clock.clone(),
            ),
            tokens.clone(),
            hasher,
            audit.clone(),
            clock.clone(),
            config.auth_fixed_delay,
        ));
        let orders = Arc::new(OrderService::new(
            OrderRepository::new(storage.clone()),
            audit.clone(),
            clock.clone(),
        ));
        let rate_limiter = RateLimiter::new(config.rate_limit, clock.clone());

        Ok(Self {
            config: Arc::new(config),
            storage,
            clock,
            tokens,
            auth,
            orders,
            audit,
            rate_limiter,
        })
    }

    /// Periodic rate-limiter cleanup
    pub fn start_background_tasks(&self) {
        let limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = limiter.cleanup();
                if removed > 0 {
                    tracing::debug!(removed, "Rate limit windows evicted");
                }
            }
        });
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn audit(&self) -> &AuditService {
        &self.audit
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
