// ABOUTME: Error types for page fetching including FetchErrorCode enum and FetchError struct.
// ABOUTME: Every code is recovered locally by callers; the codes only exist for diagnostics.

use std::fmt;

/// Categories of page fetch failures.
///
/// Callers must treat every code the same way: the fetch failed and a fallback
/// value is used instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    InvalidUrl,
    Status,
    Timeout,
    Network,
}

impl fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorCode::InvalidUrl => "invalid URL",
            FetchErrorCode::Status => "non-2xx status",
            FetchErrorCode::Timeout => "timeout",
            FetchErrorCode::Network => "network error",
        };
        write!(f, "{}", s)
    }
}

/// A failed page fetch.
#[derive(Debug, thiserror::Error)]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub url: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch {}: {}", self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl FetchError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: FetchErrorCode::InvalidUrl,
            url: url.into(),
            source,
        }
    }

    /// Create a Status error for a non-2xx response.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self {
            code: FetchErrorCode::Status,
            url: url.into(),
            source: Some(anyhow::anyhow!("HTTP status {}", status)),
        }
    }

    /// Create a Timeout error.
    pub fn timeout(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: FetchErrorCode::Timeout,
            url: url.into(),
            source,
        }
    }

    /// Create a Network error.
    pub fn network(url: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: FetchErrorCode::Network,
            url: url.into(),
            source,
        }
    }

    /// Map a reqwest transport error onto Timeout or Network.
    pub fn from_transport(url: impl Into<String>, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(url, Some(anyhow::Error::new(err)))
        } else {
            Self::network(url, Some(anyhow::Error::new(err)))
        }
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == FetchErrorCode::InvalidUrl
    }

    /// Returns true if this is a Status error.
    pub fn is_status(&self) -> bool {
        self.code == FetchErrorCode::Status
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == FetchErrorCode::Timeout
    }

    /// Returns true if this is a Network error.
    pub fn is_network(&self) -> bool {
        self.code == FetchErrorCode::Network
    }
}
