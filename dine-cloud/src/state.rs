//! Application state shared by all handlers

use dashmap::DashMap;
use receipt_printer::BridgePrinter;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use crate::BoxError;
use crate::auth::rate_limit::RateLimiter;
use crate::config::{Config, MAX_SESSION_TTL_HOURS};
use crate::live::OrderHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// `Secure` cookies with the `__Secure-` prefix (outside development)
    pub secure_cookies: bool,
    /// Base URL for table QR links
    pub public_base_url: String,
    /// Per-restaurant live order channels
    pub live_orders: OrderHub,
    /// Local print bridge client
    pub printer: BridgePrinter,
    pub receipt_width: usize,
    pub upload_dir: PathBuf,
    pub dashboard_dir: PathBuf,
    /// Rate limiter for login/signup routes
    pub rate_limiter: RateLimiter,
    /// Take the client IP from `X-Forwarded-For` instead of the peer address
    pub trust_proxy_headers: bool,
    /// Open WebSocket connections per restaurant
    pub socket_connections: Arc<DashMap<i64, AtomicUsize>>,
}

impl AppState {
    /// Connect to the database, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tokio::fs::create_dir_all(&config.upload_dir).await?;

        Self::with_pool(config, pool)
    }

    /// Build the state around an existing pool (no migrations)
    pub fn with_pool(config: &Config, pool: PgPool) -> Result<Self, BoxError> {
        let printer = BridgePrinter::new(&config.print_bridge_url)?;
        tracing::info!(url = %printer.url(), "Print bridge configured");

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            session_ttl_hours: config.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS),
            secure_cookies: !config.is_development(),
            public_base_url: config.public_base_url.clone(),
            live_orders: OrderHub::new(),
            printer,
            receipt_width: config.receipt_width,
            upload_dir: config.upload_dir.clone(),
            dashboard_dir: config.dashboard_dir.clone(),
            rate_limiter: RateLimiter::new(),
            trust_proxy_headers: config.trust_proxy_headers,
            socket_connections: Arc::new(DashMap::new()),
        })
    }
}
