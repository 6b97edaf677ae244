// ABOUTME: Page fetching: the PageFetcher seam, the blocking HTTP Fetcher and a request-scoped cache.
// ABOUTME: One attempt per call, no retry; any non-2xx status or transport error is a FetchError.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::options::{FetchOptions, FetcherBuilder};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Anything that can turn a URL into page markup.
///
/// Implemented by [`Fetcher`] for real HTTP, by [`CachedFetcher`], and by any
/// `Fn(&str) -> Result<String, FetchError>` so tests can serve synthetic pages.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> PageFetcher for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

/// Blocking HTTP page fetcher with a browser-like identity and a bounded timeout.
#[derive(Debug)]
pub struct Fetcher {
    opts: FetchOptions,
    http_client: reqwest::blocking::Client,
    last_request: Cell<Option<Instant>>,
}

impl Fetcher {
    /// Create a builder with default options.
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::new()
    }

    /// Create a Fetcher from explicit options.
    pub fn new(opts: FetchOptions) -> Result<Self, FetchError> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(&opts.user_agent)
            .timeout(opts.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| {
                FetchError::network(
                    "",
                    Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                )
            })?;

        Ok(Self {
            opts,
            http_client,
            last_request: Cell::new(None),
        })
    }

    /// The options this fetcher was built with.
    pub fn options(&self) -> &FetchOptions {
        &self.opts
    }

    /// Sleep until the configured pause has elapsed since the previous request.
    fn wait_for_turn(&self) {
        if self.opts.pause.is_zero() {
            return;
        }
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.opts.pause {
                thread::sleep(self.opts.pause - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl PageFetcher for Fetcher {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::invalid_url(url, None));
        }

        let parsed_url = url::Url::parse(url).map_err(|e| {
            FetchError::invalid_url(url, Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::invalid_url(
                url,
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        self.wait_for_turn();
        debug!(url, "fetching page");

        let mut request = self.http_client.get(parsed_url);
        for (key, value) in &self.opts.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .map_err(|e| FetchError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "page fetch rejected");
            return Err(FetchError::status(url, status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(FetchError::network(
                    url,
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response
            .bytes()
            .map_err(|e| FetchError::from_transport(url, e))?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(FetchError::network(
                url,
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

/// Memoizes successful fetches by URL for the lifetime of one batch.
///
/// Failures are not stored, so a later call for the same URL tries again and
/// fails or succeeds on its own.
#[derive(Debug)]
pub struct CachedFetcher<F> {
    inner: F,
    pages: RefCell<HashMap<String, String>>,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            pages: RefCell::new(HashMap::new()),
        }
    }

    /// Number of pages currently held.
    pub fn len(&self) -> usize {
        self.pages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.borrow().is_empty()
    }
}

impl<F: PageFetcher> PageFetcher for CachedFetcher<F> {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        if let Some(markup) = self.pages.borrow().get(url) {
            debug!(url, "page cache hit");
            return Ok(markup.clone());
        }
        let markup = self.inner.fetch_page(url)?;
        self.pages
            .borrow_mut()
            .insert(url.to_string(), markup.clone());
        Ok(markup)
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn create_test_fetcher() -> Fetcher {
        Fetcher::builder()
            .user_agent("test-agent")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<p>olá</p>");
        });

        let fetcher = create_test_fetcher();
        let markup = fetcher.fetch_page(&server.url("/page")).unwrap();
        mock.assert();
        assert_eq!(markup, "<p>olá</p>");
    }

    #[test]
    fn test_fetch_sends_configured_user_agent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/ua")
                .header("user-agent", "test-agent");
            then.status(200).body("ok");
        });

        let fetcher = create_test_fetcher();
        assert_eq!(fetcher.fetch_page(&server.url("/ua")).unwrap(), "ok");
        mock.assert();
    }

    #[test]
    fn test_fetch_non_2xx_is_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not found");
        });

        let fetcher = create_test_fetcher();
        let err = fetcher.fetch_page(&server.url("/missing")).unwrap_err();
        mock.assert_hits(1);
        assert!(err.is_status());
    }

    #[test]
    fn test_fetch_single_attempt_on_server_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let fetcher = create_test_fetcher();
        assert!(fetcher.fetch_page(&server.url("/flaky")).is_err());
        mock.assert_hits(1);
    }

    #[test]
    fn test_fetch_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(1500)).body("late");
        });

        let fetcher = Fetcher::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = fetcher.fetch_page(&server.url("/slow")).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_fetch_rejects_invalid_urls_without_request() {
        let fetcher = create_test_fetcher();
        assert!(fetcher.fetch_page("").unwrap_err().is_invalid_url());
        assert!(fetcher.fetch_page("not a url").unwrap_err().is_invalid_url());
        assert!(fetcher
            .fetch_page("ftp://example.com/file")
            .unwrap_err()
            .is_invalid_url());
    }

    #[test]
    fn test_pause_spaces_out_requests() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/paced");
            then.status(200).body("ok");
        });

        let fetcher = Fetcher::builder()
            .pause(Duration::from_millis(150))
            .build()
            .unwrap();
        let start = Instant::now();
        fetcher.fetch_page(&server.url("/paced")).unwrap();
        fetcher.fetch_page(&server.url("/paced")).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_cached_fetcher_reuses_successes_only() {
        let calls = Cell::new(0);
        let inner = |url: &str| -> Result<String, FetchError> {
            calls.set(calls.get() + 1);
            if url.ends_with("/down") {
                Err(FetchError::status(url, 500))
            } else {
                Ok(format!("page {}", url))
            }
        };
        let cached = CachedFetcher::new(inner);

        assert_eq!(cached.fetch_page("https://a.test/x").unwrap(), "page https://a.test/x");
        assert_eq!(cached.fetch_page("https://a.test/x").unwrap(), "page https://a.test/x");
        assert!(cached.fetch_page("https://a.test/down").is_err());
        assert!(cached.fetch_page("https://a.test/down").is_err());

        assert_eq!(calls.get(), 3);
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn test_decode_iso_8859_1_from_header() {
        let iso_bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        let decoded = decode_body(iso_bytes, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }
}
