//! Query URL templates.
//!
//! Two substitution modes exist. A search template carries a single `{}` token that takes
//! the query-escaped search term. An entity template carries named `{checksum}`-style
//! placeholders filled from a stored scene or gallery. Either way the configured
//! replacement rules then run over the finished URL.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::form_urlencoded;

use crate::mapping::RegexReplace;
use crate::storage::{StoredGallery, StoredScene};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Post-substitution rewrite of a constructed URL.
pub type ReplacementRule = RegexReplace;

/// Ordered placeholder values. Absent attributes are simply not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryUrlParameters {
    params: Vec<(&'static str, String)>,
}

impl QueryUrlParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a placeholder value. `None` and empty values are skipped.
    pub fn with(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.params.push((name, value.to_string()));
        }
        self
    }

    pub fn from_scene(scene: &StoredScene) -> Self {
        Self::new()
            .with("checksum", scene.checksum.as_deref())
            .with("oshash", scene.oshash.as_deref())
            .with("filename", scene.path.as_deref().and_then(base_name))
            .with("title", scene.title.as_deref())
            .with("url", scene.url.as_deref())
            .with("date", scene.date.as_deref())
    }

    pub fn from_gallery(gallery: &StoredGallery) -> Self {
        Self::new()
            .with("checksum", gallery.checksum.as_deref())
            .with("filename", gallery.path.as_deref().and_then(base_name))
            .with("title", gallery.title.as_deref())
            .with("url", gallery.url.as_deref())
            .with("date", gallery.date.as_deref())
    }

    /// Parameters for a by-URL template: only `{url}`.
    pub fn from_url(url: &str) -> Self {
        Self::new().with("url", Some(url))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// Replaces every `{name}` with its value in one pass, so inserted values are never
    /// re-scanned. Unknown placeholders are left as written.
    pub fn construct_url(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

fn base_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|name| name.to_str())
}

/// Builds a search URL by replacing every `{}` with the query-escaped `term`.
pub fn search_url(template: &str, term: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(term.as_bytes()).collect();
    template.replace("{}", &escaped)
}

/// Runs `rules` in order over `url`. Invalid patterns are skipped.
pub fn apply_replacements(url: &str, rules: &[ReplacementRule]) -> String {
    rules.iter().fold(url.to_string(), |acc, rule| match rule.compile() {
        Some(re) => re.replace_all(&acc, rule.with.as_str()).into_owned(),
        None => acc,
    })
}
