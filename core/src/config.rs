//! Client settings: base URL, certificate material, and timeout.
//!
//! Settings come from the environment (`SSG_*` variables) or from JSON; the
//! PEM files themselves are only read when a transport is constructed.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.ssg-wsg.sg";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "SSG_BASE_URL";
pub const ENV_CERT_PATH: &str = "SSG_CERT_PATH";
pub const ENV_KEY_PATH: &str = "SSG_KEY_PATH";
pub const ENV_TIMEOUT_SECS: &str = "SSG_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: default_base_url(),
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cert_path = lookup(ENV_CERT_PATH).ok_or(ConfigError::MissingVar(ENV_CERT_PATH))?;
        let key_path = lookup(ENV_KEY_PATH).ok_or(ConfigError::MissingVar(ENV_KEY_PATH))?;
        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let config = Self {
            base_url: lookup(ENV_BASE_URL).unwrap_or_else(default_base_url),
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            timeout_secs,
        };
        config.base_url()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.base_url()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Parsed base URL; must be able to carry path segments.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        value: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            value: raw.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_CERT_PATH, "certificates/cert.pem"),
            (ENV_KEY_PATH, "certificates/key.pem"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.cert_path, PathBuf::from("certificates/cert.pem"));
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_CERT_PATH, "c.pem"),
            (ENV_KEY_PATH, "k.pem"),
            (ENV_BASE_URL, "http://127.0.0.1:3000"),
            (ENV_TIMEOUT_SECS, " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.base_url().unwrap().as_str(), "http://127.0.0.1:3000/");
    }

    #[test]
    fn missing_certificate_variable() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_KEY_PATH, "k.pem")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_CERT_PATH)));
    }

    #[test]
    fn bad_timeout_and_url_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_CERT_PATH, "c.pem"),
            (ENV_KEY_PATH, "k.pem"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));

        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_CERT_PATH, "c.pem"),
            (ENV_KEY_PATH, "k.pem"),
            (ENV_BASE_URL, "mailto:someone@example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn json_with_defaults() {
        let config = ClientConfig::from_json(r#"{"cert_path":"c.pem","key_path":"k.pem"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("c.pem", "k.pem"));
        assert!(matches!(
            ClientConfig::from_json(r#"{"cert_path":"c.pem"}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
