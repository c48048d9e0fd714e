use std::time::Duration;

/// Construction options for [`ConfigClient`](crate::ConfigClient).
///
/// Only the base URL is required.
///
/// # Examples
/// ```
/// # use edflags::ClientConfig;
/// # use std::time::Duration;
/// let config = ClientConfig::new("https://flags.example.com")
///     .api_key("server-key")
///     .timeout(Duration::from_secs(2))
///     .retry_attempts(5);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout: Duration,
    pub(crate) retry_attempts: u32,
    pub(crate) cache_ttl: Duration,
    pub(crate) cache_max_entries: usize,
}

impl ClientConfig {
    /// Default per-attempt timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);
    /// Default number of attempts for one logical request.
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    /// Default time-to-live for cached flag resolutions.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(60_000);
    /// Default bound on cached entries before least-recently-used eviction.
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1_024;

    /// Create a configuration for the given backend base URL. A trailing
    /// slash is stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: None,
            timeout: ClientConfig::DEFAULT_TIMEOUT,
            retry_attempts: ClientConfig::DEFAULT_RETRY_ATTEMPTS,
            cache_ttl: ClientConfig::DEFAULT_CACHE_TTL,
            cache_max_entries: ClientConfig::DEFAULT_CACHE_MAX_ENTRIES,
        }
    }

    /// Set the API key sent as a bearer token on every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Update the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Update the attempt budget for one logical request.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Update the cache time-to-live.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Update the bound on cached entries.
    pub fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = max_entries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("https://flags.example.com");
        assert_eq!(config.timeout, ClientConfig::DEFAULT_TIMEOUT);
        assert_eq!(config.retry_attempts, ClientConfig::DEFAULT_RETRY_ATTEMPTS);
        assert_eq!(config.cache_ttl, ClientConfig::DEFAULT_CACHE_TTL);
        assert_eq!(config.cache_max_entries, ClientConfig::DEFAULT_CACHE_MAX_ENTRIES);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("https://flags.example.com/");
        assert_eq!(config.base_url, "https://flags.example.com");
    }
}
