//! Backend-specific document queries.
//!
//! A [`DocumentQuery`] wraps one fetched payload and answers selector lookups with an
//! ordered sequence of strings. The field mapping model only ever talks to this trait, so
//! the same mapping logic runs against JSON and HTML documents alike.
//!
//! # Example
//!
//! ```rust
//! use mapscrape_core::document::{Backend, DocumentQuery, QueryContext};
//! use mapscrape_core::{FetchConfig, StaticFetcher};
//!
//! let fetcher = StaticFetcher::new();
//! let fetch_config = FetchConfig::default();
//! let ctx = QueryContext::new(&fetcher, &fetch_config);
//!
//! let query = Backend::Json.wrap(r#"{"tags": ["a", "b"]}"#, "https://example.com/api", ctx).unwrap();
//! assert_eq!(query.run_query("tags"), vec!["a", "b"]);
//! ```

pub mod html;
pub mod json;
pub mod path;

pub use html::HtmlQuery;
pub use json::JsonQuery;

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::Result;
use crate::fetch::{FetchConfig, Fetcher};

/// Selector evaluation over one fetched document.
pub trait DocumentQuery {
    /// Evaluates `selector`, returning matched values in document order.
    ///
    /// A selector that resolves to nothing yields an empty sequence.
    fn run_query(&self, selector: &str) -> Vec<String>;

    /// Fetches the document linked by `value` and wraps it with the same backend.
    ///
    /// Returns `None` if the fetch or the document construction fails.
    fn sub_scrape(&self, value: &str) -> Option<Box<dyn DocumentQuery + '_>>;
}

/// Collaborators shared by every query spawned from one scrape call.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub fetch_config: &'a FetchConfig,
    /// Log every loaded payload at info level.
    pub print_document: bool,
}

impl<'a> QueryContext<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, fetch_config: &'a FetchConfig) -> Self {
        Self { fetcher, fetch_config, print_document: false }
    }

    pub fn with_print_document(mut self, print_document: bool) -> Self {
        self.print_document = print_document;
        self
    }

    /// Fetches the raw payload at `url`.
    pub fn load(&self, url: &str) -> Result<String> {
        let payload = self.fetcher.fetch(url, self.fetch_config)?;
        info!("loadURL ({})", url);

        if self.print_document {
            info!("loadURL ({}) response: \n{}", url, payload);
        }

        Ok(payload)
    }
}

/// Document backend selected by a scraper definition's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Json,
    Html,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Html => "html",
        }
    }

    /// Wraps an already fetched payload.
    pub fn wrap<'a>(self, payload: &str, url: &str, ctx: QueryContext<'a>) -> Result<Box<dyn DocumentQuery + 'a>> {
        Ok(match self {
            Backend::Json => Box::new(JsonQuery::from_payload(payload, url, ctx)?),
            Backend::Html => Box::new(HtmlQuery::from_payload(payload, url, ctx)),
        })
    }

    /// Fetches `url` and wraps the payload.
    pub fn load<'a>(self, url: &str, ctx: QueryContext<'a>) -> Result<Box<dyn DocumentQuery + 'a>> {
        let payload = ctx.load(url)?;
        self.wrap(&payload, url, ctx)
    }
}

/// Sub-scrape shared by both backends. Failures are logged, never propagated.
pub(crate) fn sub_scrape<'a>(
    backend: Backend, base_url: &str, value: &str, ctx: QueryContext<'a>,
) -> Option<Box<dyn DocumentQuery + 'a>> {
    let url = resolve_url(base_url, value);
    debug!("Sub-scraping for: {}", url);

    match backend.load(&url, ctx) {
        Ok(query) => Some(query),
        Err(e) => {
            warn!("Error getting URL '{}' for sub-scraper: {}", url, e);
            None
        }
    }
}

/// Resolves `value` against `base_url` when it is relative.
///
/// A base that is a local path resolves against the directory of that file. Absolute
/// URLs, and values that cannot be joined, are returned unchanged.
pub fn resolve_url(base_url: &str, value: &str) -> String {
    let value = value.trim();

    if url::Url::parse(value).is_ok() {
        return value.to_string();
    }

    match url::Url::parse(base_url) {
        Ok(base) => base.join(value).map(|u| u.to_string()).unwrap_or_else(|_| value.to_string()),
        Err(_) => match Path::new(base_url).parent() {
            Some(dir) => dir.join(value).to_string_lossy().into_owned(),
            None => value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    #[test]
    fn test_resolve_url_absolute() {
        assert_eq!(
            resolve_url("https://example.com/a/b", "https://other.org/x"),
            "https://other.org/x"
        );
    }

    #[test]
    fn test_resolve_url_relative() {
        assert_eq!(
            resolve_url("https://example.com/scenes/1", "/performers/7"),
            "https://example.com/performers/7"
        );
        assert_eq!(
            resolve_url("https://example.com/scenes/1", "2"),
            "https://example.com/scenes/2"
        );
    }

    #[test]
    fn test_resolve_url_against_local_file() {
        assert_eq!(resolve_url("fixtures/docs/scene.json", "studio.json"), "fixtures/docs/studio.json");
        assert_eq!(resolve_url("../fixtures/docs/scene.json", "../pages/a.html"), "../fixtures/docs/../pages/a.html");
        assert_eq!(resolve_url("scene.json", "studio.json"), "studio.json");
        assert_eq!(resolve_url("fixtures/scene.json", "https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn test_sub_scrape_from_local_document() {
        let fetcher = StaticFetcher::new().with_document("docs/studio.json", r#"{"logo": "acme.png"}"#);
        let config = FetchConfig::default();
        let ctx = QueryContext::new(&fetcher, &config);

        let sub = sub_scrape(Backend::Json, "docs/scene.json", "studio.json", ctx).expect("sub document");
        assert_eq!(sub.run_query("logo"), vec!["acme.png"]);
    }

    #[test]
    fn test_sub_scrape_failure_is_none() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let ctx = QueryContext::new(&fetcher, &config);

        assert!(sub_scrape(Backend::Json, "https://example.com/", "missing", ctx).is_none());
        assert_eq!(fetcher.requests(), vec!["https://example.com/missing"]);
    }

    #[test]
    fn test_backend_deserialize() {
        let backend: Backend = serde_json::from_str(r#""html""#).unwrap();
        assert_eq!(backend, Backend::Html);
        assert_eq!(backend.name(), "html");
    }
}
