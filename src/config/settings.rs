//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! configuration files or environment variables.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database configuration.
    pub database: DatabaseSettings,
    /// Rebuild loop configuration.
    pub aggregator: AggregatorSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Metrics configuration.
    pub metrics: MetricsSettings,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// Files are loaded in this order (later overrides earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (if exists)
    /// 3. Environment variables with `LEADERBOARD_` prefix
    ///
    /// # Arguments
    /// * `environment` - Environment name (e.g., "development", "production")
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load(environment: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("database.url", "postgres://localhost/leaderboard")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_ms", 5000)?
            .set_default("database.idle_timeout_ms", 600_000)?
            .set_default("aggregator.interval_secs", 60)?
            .set_default("aggregator.wallet_concurrency", 8)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.host", "0.0.0.0")?
            .set_default("metrics.port", 9090)?
            // Load default configuration file
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            // Load environment-specific file
            .add_source(File::with_name(&format!("{config_dir}/{environment}")).required(false))
            // Override with environment variables (LEADERBOARD_ prefix)
            .add_source(
                Environment::with_prefix("LEADERBOARD")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load settings from a specific file path.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Database validation
        if self.database.url.is_empty() {
            errors.push("database.url cannot be empty".into());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be non-zero".into());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".into());
        }

        // Aggregator validation
        if self.aggregator.interval_secs == 0 {
            errors.push("aggregator.interval_secs must be non-zero".into());
        }
        if self.aggregator.wallet_concurrency == 0 {
            errors.push("aggregator.wallet_concurrency must be non-zero".into());
        }
        if self.aggregator.wallet_concurrency > self.database.max_connections as usize {
            errors.push(
                "aggregator.wallet_concurrency cannot exceed database.max_connections".into(),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum connections to maintain.
    pub min_connections: u32,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connection timeout in milliseconds.
    pub idle_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Get the connection timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Rebuild loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorSettings {
    /// Seconds between rebuild cycles.
    pub interval_secs: u64,
    /// Bounded per-wallet fan-out inside one rebuild.
    pub wallet_concurrency: usize,
}

impl AggregatorSettings {
    /// Get the rebuild interval as a `Duration`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus exporter is enabled.
    pub enabled: bool,
    /// Host to bind the metrics server to.
    pub host: String,
    /// Port for the metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Get the metrics socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create_valid_settings() -> Settings {
        Settings {
            database: DatabaseSettings {
                url: "postgres://localhost/test".into(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_ms: 5000,
                idle_timeout_ms: 600_000,
            },
            aggregator: AggregatorSettings {
                interval_secs: 60,
                wallet_concurrency: 8,
            },
            logging: LoggingSettings {
                level: "info".into(),
                format: "json".into(),
            },
            metrics: MetricsSettings {
                enabled: true,
                host: "0.0.0.0".into(),
                port: 9090,
            },
        }
    }

    #[test]
    fn durations_are_derived_from_millis_and_secs() {
        let settings = create_valid_settings();
        assert_eq!(settings.database.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(settings.database.idle_timeout(), Duration::from_millis(600_000));
        assert_eq!(settings.aggregator.interval(), Duration::from_secs(60));
    }

    #[test]
    fn metrics_socket_addr() {
        let settings = create_valid_settings();
        assert_eq!(settings.metrics.socket_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn validation_catches_zero_connections() {
        let mut settings = create_valid_settings();
        settings.database.max_connections = 0;

        let errors = settings.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("max_connections")));
    }

    #[test]
    fn validation_catches_zero_interval() {
        let mut settings = create_valid_settings();
        settings.aggregator.interval_secs = 0;

        let errors = settings.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("interval_secs")));
    }

    #[test]
    fn validation_bounds_concurrency_by_the_pool() {
        let mut settings = create_valid_settings();
        settings.aggregator.wallet_concurrency = 32;
        settings.database.max_connections = 10;

        let errors = settings.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("wallet_concurrency")));
    }
}
