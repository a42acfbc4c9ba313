//! Service configuration loaded from environment variables

use std::path::PathBuf;

use crate::BoxError;

/// dine-cloud configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port (API, WebSocket, static files)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in hours (1..=MAX_SESSION_TTL_HOURS)
    pub session_ttl_hours: i64,
    /// Base URL diners reach, used to build table QR links
    pub public_base_url: String,
    /// Local print bridge endpoint
    pub print_bridge_url: String,
    /// Receipt line width in characters (48 for 80mm paper, 32 for 58mm)
    pub receipt_width: usize,
    /// Root directory for uploaded images
    pub upload_dir: PathBuf,
    /// Static dashboard assets behind the session gate
    pub dashboard_dir: PathBuf,
    /// Pool size
    pub db_max_connections: u32,
    /// Key rate limits on `X-Forwarded-For` (only behind a reverse proxy)
    pub trust_proxy_headers: bool,
}

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Parse `SESSION_TTL_HOURS`: unset or invalid → default, capped at one year
fn session_ttl_hours(value: Option<&str>) -> i64 {
    value
        .and_then(|h| h.trim().parse::<i64>().ok())
        .filter(|h| *h > 0)
        .map(|h| h.min(MAX_SESSION_TTL_HOURS))
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
}

fn flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            session_ttl_hours: session_ttl_hours(std::env::var("SESSION_TTL_HOURS").ok().as_deref()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            print_bridge_url: std::env::var("PRINT_BRIDGE_URL")
                .unwrap_or_else(|_| receipt_printer::DEFAULT_BRIDGE_URL.into()),
            receipt_width: std::env::var("RECEIPT_WIDTH")
                .ok()
                .and_then(|w| w.parse().ok())
                .filter(|w: &usize| (24..=64).contains(w))
                .unwrap_or(48),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            dashboard_dir: std::env::var("DASHBOARD_DIR")
                .unwrap_or_else(|_| "dashboard".into())
                .into(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            trust_proxy_headers: flag(std::env::var("TRUST_PROXY_HEADERS").ok().as_deref()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Defaults for tests and local tooling (no environment lookups)
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            http_port: 3000,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            public_base_url: "http://localhost:3000".into(),
            print_bridge_url: receipt_printer::DEFAULT_BRIDGE_URL.into(),
            receipt_width: 48,
            upload_dir: "uploads".into(),
            dashboard_dir: "dashboard".into(),
            db_max_connections: 10,
            trust_proxy_headers: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_secret_gets_placeholder() {
        let secret = Config::require_secret("DINE_CLOUD_TEST_UNSET_SECRET", "development").unwrap();
        assert_eq!(secret, "dev-DINE_CLOUD_TEST_UNSET_SECRET-not-for-production");
    }

    #[test]
    fn production_requires_secret() {
        let err = Config::require_secret("DINE_CLOUD_TEST_UNSET_SECRET", "production").unwrap_err();
        assert!(err.to_string().contains("must be set"));
    }

    #[test]
    fn test_config_is_development() {
        let config = Config::for_database("postgres://localhost/dine");
        assert!(config.is_development());
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.receipt_width, 48);
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(session_ttl_hours(None), 24);
        assert_eq!(session_ttl_hours(Some("8")), 8);
        assert_eq!(session_ttl_hours(Some("0")), 24);
        assert_eq!(session_ttl_hours(Some("-5")), 24);
        assert_eq!(session_ttl_hours(Some("soon")), 24);
        assert_eq!(
            session_ttl_hours(Some("9223372036854775807")),
            MAX_SESSION_TTL_HOURS
        );
    }

    #[test]
    fn proxy_flag_parsing() {
        assert!(flag(Some("true")));
        assert!(flag(Some(" 1 ")));
        assert!(flag(Some("YES")));
        assert!(!flag(Some("false")));
        assert!(!flag(None));
    }
}
