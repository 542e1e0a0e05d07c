//! config-rs/lib.rs
//! Service configuration for the concept-map service
//! Reads `.env` and process environment into typed settings with defaults

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upstream generative-AI connection settings
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Retry settings for the upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

/// A fixed-window request budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub max_requests: u32,
    pub window: Duration,
}

/// Rate limits applied by the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Applies to every route
    pub general: WindowLimit,
    /// Applies to concept map generation only
    pub concept_map: WindowLimit,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            general: WindowLimit {
                max_requests: 100,
                window: Duration::from_secs(15 * 60),
            },
            concept_map: WindowLimit {
                max_requests: 20,
                window: Duration::from_secs(60 * 60),
            },
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub json_format: bool,
    pub log_dir: Option<String>,
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub upstream: UpstreamSettings,
    pub retry: RetrySettings,
    pub rate_limits: RateLimitSettings,
    pub logging: LoggingSettings,
}

impl ServiceConfig {
    /// Load configuration from `.env` (if present) and the process environment
    pub fn from_env() -> Self {
        // A missing .env file is fine; the process environment still applies
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY");
        let defaults = RateLimitSettings::default();
        let retry_defaults = RetrySettings::default();

        Self {
            host: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT),
            upstream: UpstreamSettings {
                api_key,
                api_url: get("GEMINI_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                timeout: Duration::from_secs(parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 60)),
            },
            retry: RetrySettings {
                max_retries: parse_or(&get, "UPSTREAM_MAX_RETRIES", retry_defaults.max_retries),
                initial_delay: Duration::from_millis(parse_or(
                    &get,
                    "UPSTREAM_INITIAL_RETRY_DELAY_MS",
                    retry_defaults.initial_delay.as_millis() as u64,
                )),
            },
            rate_limits: RateLimitSettings {
                general: WindowLimit {
                    max_requests: parse_or(
                        &get,
                        "RATE_LIMIT_GENERAL_MAX",
                        defaults.general.max_requests,
                    ),
                    window: Duration::from_secs(parse_or(
                        &get,
                        "RATE_LIMIT_GENERAL_WINDOW_SECS",
                        defaults.general.window.as_secs(),
                    )),
                },
                concept_map: WindowLimit {
                    max_requests: parse_or(
                        &get,
                        "RATE_LIMIT_AI_MAX",
                        defaults.concept_map.max_requests,
                    ),
                    window: Duration::from_secs(parse_or(
                        &get,
                        "RATE_LIMIT_AI_WINDOW_SECS",
                        defaults.concept_map.window.as_secs(),
                    )),
                },
            },
            logging: LoggingSettings {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                json_format: get("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
                log_dir: get("LOG_DIR"),
            },
        }
    }

    /// Build configuration from a fixed set of variables
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Socket address the HTTP server binds to
    ///
    /// Falls back to `0.0.0.0:{port}` when the host does not parse.
    pub fn bind_address(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| {
                tracing::warn!(host = %self.host, "Invalid BIND_ADDR, using 0.0.0.0");
                SocketAddr::from(([0, 0, 0, 0], self.port))
            })
    }
}

fn parse_or<T, F>(get: &F, name: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Unparsable value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_map(&HashMap::new());

        assert_eq!(config.port, 3001);
        assert_eq!(config.upstream.model, "gemini-2.5-flash");
        assert!(config.upstream.api_key.is_none());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(1000));
        assert_eq!(config.rate_limits, RateLimitSettings::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_map(&vars(&[
            ("PORT", "8080"),
            ("GEMINI_API_KEY", "secret"),
            ("UPSTREAM_MAX_RETRIES", "0"),
            ("UPSTREAM_INITIAL_RETRY_DELAY_MS", "25"),
            ("RATE_LIMIT_AI_MAX", "5"),
            ("LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream.api_key.as_deref(), Some("secret"));
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(25));
        assert_eq!(config.rate_limits.concept_map.max_requests, 5);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = ServiceConfig::from_map(&vars(&[
            ("PORT", "not-a-port"),
            ("UPSTREAM_MAX_RETRIES", "-3"),
        ]));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = ServiceConfig::from_map(&vars(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_bind_address() {
        let config = ServiceConfig::from_map(&vars(&[("BIND_ADDR", "127.0.0.1"), ("PORT", "9000")]));
        assert_eq!(config.bind_address(), "127.0.0.1:9000".parse().unwrap());

        let config = ServiceConfig::from_map(&vars(&[("BIND_ADDR", "nonsense host")]));
        assert_eq!(config.bind_address().port(), DEFAULT_PORT);
    }
}
