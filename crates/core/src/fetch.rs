//! Document retrieval.
//!
//! The core never talks to the network directly. Every fetch goes through the [`Fetcher`]
//! trait, so callers can swap in their own transport (proxies, cookie jars, rate limiting)
//! and tests can serve fixtures from memory. [`HttpFetcher`] is the stock implementation:
//! HTTP/HTTPS URLs are fetched with a blocking reqwest client, anything else is read from
//! the local filesystem.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;

use crate::{Result, ScrapeError};

/// Request options passed through to the fetcher untouched.
///
/// This struct controls timeout, user agent, extra headers and cookies for HTTP requests.
/// It is deserialized from the `driver` section of a scraper definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Extra request headers, sent in order.
    pub headers: Vec<(String, String)>,
    /// Cookies as `(name, value)` pairs, sent as a single `Cookie` header.
    pub cookies: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Mapscrape/0.3; +https://github.com/stormlightlabs/mapscrape)"
                .to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }
}

impl FetchConfig {
    /// Renders the configured cookies as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Fetch collaborator: retrieves the body of a document.
///
/// Implementations own timeouts and retries; the core performs neither.
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body as text.
    fn fetch(&self, url: &str, config: &FetchConfig) -> Result<String>;
}

/// Default fetcher: HTTP(S) through reqwest, local paths from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, config: &FetchConfig) -> Result<String> {
        if is_remote(url) {
            fetch_url(url, config)
        } else {
            fetch_file(url.strip_prefix("file://").unwrap_or(url))
        }
    }
}

/// In-memory fetcher serving pre-fetched documents.
///
/// Every requested URL is recorded, whether or not a document exists for it. Unknown URLs
/// fail with [`ScrapeError::HttpStatus`] 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `body` as the response for `url`.
    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, _config: &FetchConfig) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::HttpStatus { status: 404, url: url.to_string() })
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Fetches a document over HTTP.
///
/// Follows redirects and respects the configured timeout. Non-success statuses are errors.
#[cfg(feature = "fetch")]
pub fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    use std::time::Duration;

    let parsed_url = url::Url::parse(url).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(ScrapeError::Http)?;

    let mut request = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "application/json,text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
        );

    for (name, value) in &config.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    if let Some(cookies) = config.cookie_header() {
        request = request.header("Cookie", cookies);
    }

    let response = request.send().map_err(|e| {
        if e.is_timeout() { ScrapeError::Timeout { timeout: config.timeout } } else { ScrapeError::Http(e) }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::HttpStatus { status: status.as_u16(), url: url.to_string() });
    }

    Ok(response.text()?)
}

/// Without the `fetch` feature only local documents can be loaded.
#[cfg(not(feature = "fetch"))]
pub fn fetch_url(url: &str, _config: &FetchConfig) -> Result<String> {
    Err(ScrapeError::Unsupported(format!("fetching {} without the `fetch` feature", url)))
}

/// Reads a document from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(ScrapeError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(ScrapeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Mapscrape"));
        assert!(config.cookie_header().is_none());
    }

    #[test]
    fn test_cookie_header() {
        let config = FetchConfig {
            cookies: vec![("age_verified".into(), "1".into()), ("lang".into(), "en".into())],
            ..Default::default()
        };
        assert_eq!(config.cookie_header().as_deref(), Some("age_verified=1; lang=en"));
    }

    #[test]
    fn test_fetch_config_from_json() {
        let config: FetchConfig =
            serde_json::from_str(r#"{"timeout": 5, "headers": [["X-Api-Key", "abc"]]}"#).unwrap();
        assert_eq!(config.timeout, 5);
        assert_eq!(config.headers, vec![("X-Api-Key".to_string(), "abc".to_string())]);
        assert!(config.user_agent.contains("Mapscrape"));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.json");
        assert!(matches!(result, Err(ScrapeError::FileNotFound(_))));
    }

    #[test]
    fn test_http_fetcher_reads_local_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();

        let fetcher = HttpFetcher::new();
        let plain = fetcher.fetch(path.to_str().unwrap(), &FetchConfig::default()).unwrap();
        let prefixed = fetcher
            .fetch(&format!("file://{}", path.display()), &FetchConfig::default())
            .unwrap();

        assert_eq!(plain, r#"{"a":1}"#);
        assert_eq!(prefixed, plain);
    }

    #[test]
    fn test_static_fetcher_records_requests() {
        let fetcher = StaticFetcher::new().with_document("https://example.com/a", "body");
        let config = FetchConfig::default();

        assert_eq!(fetcher.fetch("https://example.com/a", &config).unwrap(), "body");
        assert!(matches!(
            fetcher.fetch("https://example.com/b", &config),
            Err(ScrapeError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(fetcher.requests(), vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com"));
        assert!(is_remote("https://example.com"));
        assert!(!is_remote("tests/fixtures/doc.json"));
        assert!(!is_remote("file:///tmp/doc.json"));
    }
}
