//! Application configuration loaded from environment variables.

use std::time::Duration;

use inventory::CircuitBreakerConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CACHE_TTL_SECS` — entry/query cache TTL (default: `60`)
/// - `INVENTORY_FAILURE_THRESHOLD` — breaker trip count (default: `5`)
/// - `INVENTORY_OPEN_SECS` — breaker open duration (default: `30`)
/// - `INVENTORY_HALF_OPEN_CALLS` — breaker trial-call cap (default: `3`)
/// - `INVENTORY_SUCCESS_THRESHOLD` — probes to close (default: `2`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cache_ttl_secs: u64,
    pub breaker_failure_threshold: u32,
    pub breaker_open_secs: u64,
    pub breaker_half_open_calls: u32,
    pub breaker_success_threshold: u32,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", 60),
            breaker_failure_threshold: env_parse("INVENTORY_FAILURE_THRESHOLD", 5),
            breaker_open_secs: env_parse("INVENTORY_OPEN_SECS", 30),
            breaker_half_open_calls: env_parse("INVENTORY_HALF_OPEN_CALLS", 3),
            breaker_success_threshold: env_parse("INVENTORY_SUCCESS_THRESHOLD", 2),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the circuit-breaker thresholds for the inventory gateway.
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker_failure_threshold,
            open_duration: Duration::from_secs(self.breaker_open_secs),
            half_open_max_calls: self.breaker_half_open_calls,
            success_threshold: self.breaker_success_threshold,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            cache_ttl_secs: 60,
            breaker_failure_threshold: 5,
            breaker_open_secs: 30,
            breaker_half_open_calls: 3,
            breaker_success_threshold: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn breaker_config_carries_thresholds() {
        let config = Config {
            breaker_failure_threshold: 7,
            breaker_open_secs: 11,
            breaker_half_open_calls: 2,
            breaker_success_threshold: 1,
            ..Config::default()
        };

        let breaker = config.breaker_config();
        assert_eq!(breaker.failure_threshold, 7);
        assert_eq!(breaker.open_duration, Duration::from_secs(11));
        assert_eq!(breaker.half_open_max_calls, 2);
        assert_eq!(breaker.success_threshold, 1);
    }
}
