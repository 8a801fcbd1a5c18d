//! Transport configuration for `HttpClient` and per-request overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client-wide transport defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Overall deadline for one attempt. `None` waits indefinitely.
    #[serde(default)]
    pub timeout: Option<Duration>,

    /// Extra attempts after a transport failure.
    #[serde(default)]
    pub retries: u32,

    /// Delay before the first retry, doubled on each further attempt.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Proxy address such as `http://proxy.example.com:8080`.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Statuses treated as success. Empty accepts every status.
    #[serde(default)]
    pub accepted_status_codes: Vec<u16>,

    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Sent when the request has no `User-Agent` header of its own.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest response body read, in bytes. A longer body fails the call
    /// with `HttpError::Transport`.
    #[serde(default = "default_max_response_size")]
    pub max_response_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            retries: 0,
            retry_delay: default_retry_delay(),
            verify_tls: default_verify_tls(),
            proxy: None,
            accepted_status_codes: Vec::new(),
            follow_redirects: default_follow_redirects(),
            user_agent: default_user_agent(),
            max_response_size: default_max_response_size(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5s timeout, no retries.
    pub fn fast() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            retries: 0,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_accepted_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.accepted_status_codes = codes.into_iter().collect();
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_response_size(mut self, bytes: u64) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Apply per-request overrides on top of these defaults.
    pub fn merged(&self, options: &RequestOptions) -> ClientConfig {
        let mut merged = self.clone();
        if let Some(timeout) = options.timeout {
            merged.timeout = Some(timeout);
        }
        if let Some(retries) = options.retries {
            merged.retries = retries;
        }
        if let Some(verify) = options.verify_tls {
            merged.verify_tls = verify;
        }
        if let Some(proxy) = &options.proxy {
            merged.proxy = Some(proxy.clone());
        }
        if let Some(codes) = &options.accepted_status_codes {
            merged.accepted_status_codes = codes.clone();
        }
        if let Some(follow) = options.follow_redirects {
            merged.follow_redirects = follow;
        }
        merged
    }

    /// Delay before retry number `attempt` (0-based), capped at 5s.
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.retry_delay.saturating_mul(factor), MAX_RETRY_DELAY)
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_status_codes.is_empty() || self.accepted_status_codes.contains(&status)
    }
}

/// Per-request transport settings recorded by `RequestBuilder`.
///
/// Unset fields fall back to the client's `ClientConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub verify_tls: Option<bool>,
    pub proxy: Option<String>,
    pub accepted_status_codes: Option<Vec<u16>>,
    pub follow_redirects: Option<bool>,
    /// Skip network I/O and answer with a synthetic `200`.
    pub simulate: bool,
    /// Run on a background thread when sent through `HttpClient::dispatch`.
    pub asynchronous: bool,
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

fn default_retry_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_verify_tls() -> bool {
    true
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_response_size() -> u64 {
    u64::MAX
}

fn default_user_agent() -> String {
    format!("jm-http/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, None);
        assert_eq!(config.retries, 0);
        assert!(config.verify_tls);
        assert!(config.follow_redirects);
        assert!(config.accepted_status_codes.is_empty());
        assert!(config.user_agent.starts_with("jm-http/"));
        assert_eq!(config.max_response_size, u64::MAX);
    }

    #[test]
    fn fast_config() {
        let config = ClientConfig::fast();
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn request_options_override_defaults() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_proxy("http://proxy.example.com:8080");
        let options = RequestOptions {
            timeout: Some(Duration::from_secs(2)),
            retries: Some(4),
            verify_tls: Some(false),
            follow_redirects: Some(false),
            ..Default::default()
        };

        let merged = config.merged(&options);
        assert_eq!(merged.timeout, Some(Duration::from_secs(2)));
        assert_eq!(merged.retries, 4);
        assert!(!merged.verify_tls);
        assert!(!merged.follow_redirects);
        assert_eq!(merged.proxy.as_deref(), Some("http://proxy.example.com:8080"));
    }

    #[test]
    fn empty_accepted_set_accepts_everything() {
        let config = ClientConfig::default();
        assert!(config.accepts(200));
        assert!(config.accepts(503));

        let config = config.with_accepted_status_codes([200, 201]);
        assert!(config.accepts(201));
        assert!(!config.accepts(404));
    }

    #[test]
    fn retry_backoff_doubles_and_caps() {
        let config = ClientConfig::default().with_retry_delay(Duration::from_millis(100));
        assert_eq!(config.retry_backoff(0), Duration::from_millis(100));
        assert_eq!(config.retry_backoff(1), Duration::from_millis(200));
        assert_eq!(config.retry_backoff(3), Duration::from_millis(800));
        assert_eq!(config.retry_backoff(20), Duration::from_secs(5));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"retries":2}"#).unwrap();
        assert_eq!(config.retries, 2);
        assert!(config.verify_tls);
        assert_eq!(config.retry_delay, Duration::from_millis(200));
        assert_eq!(config.max_response_size, u64::MAX);

        let config: ClientConfig =
            serde_json::from_str(r#"{"max_response_size":1024}"#).unwrap();
        assert_eq!(config.max_response_size, 1024);
    }
}
