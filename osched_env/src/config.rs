//! Service endpoint configuration.

use std::time::Duration;
use tracing::warn;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client-side ceiling applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable overriding the base URL.
const ENV_BASE_URL: &str = "OSCHED_API_URL";

/// Environment variable overriding the timeout, in milliseconds.
const ENV_TIMEOUT_MS: &str = "OSCHED_TIMEOUT_MS";

/// Where the computation service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Scheme + host (+ port), without a trailing slash
    pub base_url: String,

    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    /// Reads `OSCHED_API_URL` and `OSCHED_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// An unparsable or zero timeout is logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout = Duration::from_millis(ms),
                _ => warn!("Ignoring invalid {}={:?}", ENV_TIMEOUT_MS, raw),
            }
        }

        config
    }

    /// Sets the base URL (a trailing slash is stripped).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the timeout in whole milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Joins an absolute path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.timeout_ms(), 30_000);
        assert_eq!(
            config.endpoint("/api/simulate/cpu/"),
            "http://localhost:8000/api/simulate/cpu/"
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("OSCHED_API_URL", "https://sched.example.org/"),
            ("OSCHED_TIMEOUT_MS", "5000"),
        ]));
        assert_eq!(config.base_url, "https://sched.example.org");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = ServiceConfig::from_lookup(lookup(&[("OSCHED_TIMEOUT_MS", "soon")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let config = ServiceConfig::from_lookup(lookup(&[("OSCHED_TIMEOUT_MS", "0")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
