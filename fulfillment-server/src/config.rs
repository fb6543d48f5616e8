//! Fulfillment server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default radius for inter-pharmacy transfers
pub const DEFAULT_TRANSFER_RADIUS_KM: f64 = 25.0;

/// Fulfillment server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret (HS256) shared with the identity service
    pub jwt_secret: String,
    /// Maximum distance between pharmacies for automatic transfers
    pub transfer_radius_km: f64,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Log filter directive (env: LOG_LEVEL)
    pub log_level: Option<String>,
    /// Directory for daily rolling log files (env: LOG_DIR)
    pub log_dir: Option<String>,
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

        let transfer_radius_km = match std::env::var("TRANSFER_RADIUS_KM") {
            Ok(v) => {
                let radius: f64 = v
                    .parse()
                    .map_err(|_| format!("TRANSFER_RADIUS_KM is not a number: {v}"))?;
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(format!("TRANSFER_RADIUS_KM must be positive, got {v}").into());
                }
                radius
            }
            Err(_) => DEFAULT_TRANSFER_RADIUS_KM,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/fulfillment.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            environment,
            transfer_radius_km,
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            log_level: std::env::var("LOG_LEVEL").ok().filter(|s| !s.is_empty()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Development configuration over the given database path
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            http_port: 8080,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            transfer_radius_km: DEFAULT_TRANSFER_RADIUS_KM,
            request_timeout: Duration::from_secs(30),
            log_level: None,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_secret_in_production() {
        let err = Config::require_secret("FULFILLMENT_TEST_UNSET_SECRET", "production");
        assert!(err.is_err());
        let dev = Config::require_secret("FULFILLMENT_TEST_UNSET_SECRET", "development").unwrap();
        assert!(dev.starts_with("dev-"));
    }

    #[test]
    fn test_for_database_defaults() {
        let config = Config::for_database("/tmp/x.db");
        assert_eq!(config.transfer_radius_km, DEFAULT_TRANSFER_RADIUS_KM);
        assert_eq!(config.environment, "development");
    }
}
