//! Resolver configuration.
//!
//! Defaults suit an interactive run. Override via environment variables or
//! explicit construction for tests.

use std::time::Duration;

/// Default bound on each data source call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How placeholders are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on each individual data source call.
    pub request_timeout: Duration,
    /// Skip the full node and query the lite source directly.
    pub prefer_lite: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            prefer_lite: false,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `C2OTS_REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `C2OTS_PREFER_LITE` (`1`, `true` or `yes`; default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            request_timeout: env_secs("C2OTS_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            prefer_lite: env_flag("C2OTS_PREFER_LITE", defaults.prefer_lite)?,
        })
    }
}

fn env_secs(var: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue(var.to_string(), raw.clone(), e.to_string())
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue(
                    var.to_string(),
                    raw,
                    "timeout must be positive".to_string(),
                ));
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

fn env_flag(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                var.to_string(),
                raw,
                "expected 1/true/yes or 0/false/no".to_string(),
            )),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{1}` for {0}: {2}")]
    InvalidValue(String, String, String),
}
