// ABOUTME: Configuration options for page fetching including FetchOptions and FetcherBuilder.
// ABOUTME: FetcherBuilder provides a fluent API for constructing Fetcher instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;
use crate::fetch::Fetcher;

/// Desktop browser identity sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause between sequential requests when fetching in bulk.
pub const BULK_PAUSE: Duration = Duration::from_millis(500);

/// Configuration options for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// Minimum delay between two consecutive requests. Zero disables pacing.
    pub pause: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            pause: Duration::ZERO,
        }
    }
}

/// Builder for constructing Fetcher instances with custom configuration.
#[derive(Debug, Clone)]
pub struct FetcherBuilder {
    opts: FetchOptions,
}

impl FetcherBuilder {
    /// Create a new FetcherBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: FetchOptions::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set the pause enforced between consecutive requests.
    pub fn pause(mut self, pause: Duration) -> Self {
        self.opts.pause = pause;
        self
    }

    /// Build the Fetcher with the configured options.
    pub fn build(self) -> Result<Fetcher, FetchError> {
        Fetcher::new(self.opts)
    }
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
