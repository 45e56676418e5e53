//! HTTP client configuration module
//!
//! Centralised settings for the `reqwest` client the Google gateway and the
//! token refresh share.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout. `None` leaves the call unbounded; callers that
    /// need bounded latency impose it around the whole reconciliation.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: None,
            user_agent: format!("ontime/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn builder(&self) -> ClientBuilder {
        let builder = Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.connect_timeout);

        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    pub fn build_client(&self) -> reqwest::Result<Client> {
        self.builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_request_timeout() {
        let config = HttpConfig::default();
        assert!(config.timeout.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert!(config.user_agent.starts_with("ontime/"));
    }

    #[test]
    fn test_with_timeout() {
        let config = HttpConfig::new().with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_build_client() {
        assert!(HttpConfig::default().build_client().is_ok());
    }
}
