//! Client configuration.

use std::time::Duration;

use thiserror::Error;

/// Default chat backend address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:10086";

/// Default chat endpoint path.
pub const DEFAULT_CHAT_PATH: &str = "/chat";

const BASE_URL_ENV: &str = "CHATWIRE_BASE_URL";
const CHAT_PATH_ENV: &str = "CHATWIRE_CHAT_PATH";
const CONNECT_TIMEOUT_ENV: &str = "CHATWIRE_CONNECT_TIMEOUT_SECS";

/// Invalid client configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL does not parse or is not http(s).
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The chat path does not start with `/`.
    #[error("invalid chat path {0:?}: must start with '/'")]
    InvalidChatPath(String),

    /// The timeout is not a whole number of seconds.
    #[error("invalid connect timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Static configuration for a [`ChatClient`](crate::ChatClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the chat backend.
    pub base_url: String,
    /// Path of the streaming chat endpoint.
    pub chat_path: String,
    /// Limit on establishing the connection. The body itself may stream
    /// for as long as the backend keeps it open.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            chat_path: DEFAULT_CHAT_PATH.into(),
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CHATWIRE_BASE_URL`, `CHATWIRE_CHAT_PATH` and
    /// `CHATWIRE_CONNECT_TIMEOUT_SECS`. Empty variables are ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = var(BASE_URL_ENV) {
            config.base_url = url;
        }
        if let Some(path) = var(CHAT_PATH_ENV) {
            config.chat_path = path;
        }
        if let Some(secs) = var(CONNECT_TIMEOUT_ENV) {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(secs.clone()))?;
            config.connect_timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL and path are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if !self.chat_path.starts_with('/') {
            return Err(ConfigError::InvalidChatPath(self.chat_path.clone()));
        }
        Ok(())
    }

    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.chat_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.chat_url(), "http://127.0.0.1:10086/chat");
        assert!(config.connect_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "https://chat.example.com/"),
            (CHAT_PATH_ENV, "/api/chat"),
            (CONNECT_TIMEOUT_ENV, " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.chat_url(), "https://chat.example.com/api/chat");
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(BASE_URL_ENV, "  ")])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(CONNECT_TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(v) if v == "soon"));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(BASE_URL_ENV, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = ClientConfig::from_lookup(lookup(&[(BASE_URL_ENV, "ftp://host")])).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme ftp"));
    }

    #[test]
    fn path_must_be_absolute() {
        let config = ClientConfig {
            chat_path: "chat".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChatPath(p)) if p == "chat"
        ));
    }
}
