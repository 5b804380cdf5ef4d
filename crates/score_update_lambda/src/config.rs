use std::time::Duration;

use score_update_core::contract::DEFAULT_API_ENDPOINT;

use crate::adapters::kii_http::DEFAULT_REQUEST_TIMEOUT;

pub const API_ENDPOINT_ENV: &str = "KII_API_ENDPOINT";
pub const REQUEST_TIMEOUT_ENV: &str = "KII_REQUEST_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("KII_API_ENDPOINT must be an http(s) URL, got '{0}'")]
    InvalidEndpoint(String),
    #[error("KII_REQUEST_TIMEOUT_MS must be a positive integer, got '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(API_ENDPOINT_ENV).filter(|value| !value.trim().is_empty()) {
            let endpoint = value.trim();
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(ConfigError::InvalidEndpoint(value));
            }
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Some(value) = lookup(REQUEST_TIMEOUT_ENV).filter(|value| !value.trim().is_empty()) {
            let millis = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(value.clone()))?;
            config.request_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_to_fixed_endpoint() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[])).expect("config should load");
        assert_eq!(config.endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn honours_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (API_ENDPOINT_ENV, "https://api-jp.example.test/api/"),
            (REQUEST_TIMEOUT_ENV, "2500"),
        ]))
        .expect("config should load");

        assert_eq!(config.endpoint, "https://api-jp.example.test/api");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_bad_values() {
        let endpoint = RuntimeConfig::from_lookup(lookup_from(&[(API_ENDPOINT_ENV, "ftp://x")]))
            .expect_err("endpoint should fail");
        assert!(matches!(endpoint, ConfigError::InvalidEndpoint(_)));

        let timeout = RuntimeConfig::from_lookup(lookup_from(&[(REQUEST_TIMEOUT_ENV, "0")]))
            .expect_err("timeout should fail");
        assert_eq!(
            timeout.to_string(),
            "KII_REQUEST_TIMEOUT_MS must be a positive integer, got '0'"
        );
    }
}
