use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::{Backend, DocumentQuery, QueryContext, path, sub_scrape};
use crate::{Result, ScrapeError};

/// `callback( ... );` wrapper around a JSON payload.
static JSONP_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^{\[]+\((.+)\);?$").expect("JSONP pattern is valid"));

/// JSON document query using dotted paths (see [`path`]).
pub struct JsonQuery<'a> {
    doc: Value,
    url: String,
    ctx: QueryContext<'a>,
}

impl<'a> JsonQuery<'a> {
    /// Parses `payload`, repairing JSONP if required.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidDocument`] if the payload is not JSON, even after the
    /// JSONP wrapper has been stripped.
    pub fn from_payload(payload: &str, url: &str, ctx: QueryContext<'a>) -> Result<Self> {
        let doc = parse_payload(payload)
            .ok_or_else(|| ScrapeError::InvalidDocument { backend: "json", url: url.to_string() })?;

        Ok(Self { doc, url: url.to_string(), ctx })
    }

    /// The parsed document.
    pub fn document(&self) -> &Value {
        &self.doc
    }
}

/// Parses JSON, falling back to stripping a JSONP wrapper.
pub fn parse_payload(payload: &str) -> Option<Value> {
    let payload = payload.trim();

    if let Ok(doc) = serde_json::from_str(payload) {
        return Some(doc);
    }

    let repaired = JSONP_SYNTAX.replace_all(payload, "$1");
    serde_json::from_str(&repaired).ok()
}

impl DocumentQuery for JsonQuery<'_> {
    fn run_query(&self, selector: &str) -> Vec<String> {
        match path::get(&self.doc, selector) {
            None => {
                warn!("Could not find json path '{}' in json object", selector);
                Vec::new()
            }
            Some(Value::Array(items)) => items.iter().map(path::stringify).collect(),
            Some(value) => vec![path::stringify(&value)],
        }
    }

    fn sub_scrape(&self, value: &str) -> Option<Box<dyn DocumentQuery + '_>> {
        sub_scrape(Backend::Json, &self.url, value, self.ctx)
    }
}
