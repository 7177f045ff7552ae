//! Scraper definitions and their loader.
//!
//! A scraper definition is a JSON file. It says which lookup modes a scraper supports and
//! which named mapping each mode uses, along with the URL templates and request options:
//!
//! ```json
//! {
//!     "name": "Example API",
//!     "scene_by_url": [{ "action": "json", "url": ["example.com/scene/"], "scraper": "scene" }],
//!     "scene_by_fragment": {
//!         "action": "json",
//!         "scraper": "scene",
//!         "query_url": "https://api.example.com/find?hash={oshash}"
//!     },
//!     "json_scrapers": { "scene": { "scene": { "title": "data.title" } } }
//! }
//! ```
//!
//! Definitions are loaded once into a [`ScraperRegistry`] and never mutated afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::document::Backend;
use crate::error::{ConfigError, Result, ScrapeError};
use crate::fetch::FetchConfig;
use crate::mapping::MappedScraper;
use crate::query_url::ReplacementRule;

/// What evaluates a lookup mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperAction {
    Json,
    Html,
    /// External scripts. Recognised in definitions but not run by this crate.
    Script,
}

impl ScraperAction {
    /// The document backend, or `None` for actions evaluated elsewhere.
    pub fn backend(self) -> Option<Backend> {
        match self {
            ScraperAction::Json => Some(Backend::Json),
            ScraperAction::Html => Some(Backend::Html),
            ScraperAction::Script => None,
        }
    }
}

/// Settings for one lookup mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScraperTypeConfig {
    pub action: ScraperAction,
    /// Name of the mapping in `json_scrapers` / `html_scrapers`.
    #[serde(default)]
    pub scraper: String,
    #[serde(default)]
    pub query_url: Option<String>,
    /// Rules applied to the URL built from `query_url`.
    #[serde(default)]
    pub query_url_replace: Vec<ReplacementRule>,
    /// Rules applied to caller-supplied URLs in by-URL mode.
    #[serde(default)]
    pub url_rewrite: Vec<ReplacementRule>,
}

/// A by-URL entry: a lookup mode plus the URLs it accepts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ByUrlConfig {
    /// Substring patterns; any match selects this entry.
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(flatten)]
    pub config: ScraperTypeConfig,
}

impl ByUrlConfig {
    pub fn matches(&self, url: &str) -> bool {
        self.url.iter().any(|pattern| !pattern.is_empty() && url.contains(pattern.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Log every loaded document.
    pub print_document: bool,
}

/// The record kinds a by-URL lookup can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Performer,
    Scene,
    Gallery,
    Movie,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Performer => "performer",
            RecordKind::Scene => "scene",
            RecordKind::Gallery => "gallery",
            RecordKind::Movie => "movie",
        }
    }
}

/// One scraper definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Registry key; the definition's file stem.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub performer_by_name: Option<ScraperTypeConfig>,
    pub performer_by_fragment: Option<ScraperTypeConfig>,
    pub scene_by_fragment: Option<ScraperTypeConfig>,
    pub gallery_by_fragment: Option<ScraperTypeConfig>,
    pub performer_by_url: Vec<ByUrlConfig>,
    pub scene_by_url: Vec<ByUrlConfig>,
    pub gallery_by_url: Vec<ByUrlConfig>,
    pub movie_by_url: Vec<ByUrlConfig>,
    pub json_scrapers: BTreeMap<String, MappedScraper>,
    pub html_scrapers: BTreeMap<String, MappedScraper>,
    /// Request options for every fetch made by this scraper.
    pub driver: FetchConfig,
    pub debug: DebugOptions,
}

impl ScraperConfig {
    /// Parses and validates a definition. `id` names it in the registry and in errors.
    pub fn from_json(id: &str, json: &str) -> Result<Self> {
        let mut config: ScraperConfig = serde_json::from_str(json)
            .map_err(|e| ConfigError::Invalid { source_name: id.to_string(), message: e.to_string() })?;

        config.id = id.to_string();
        if config.name.is_empty() {
            config.name = id.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScrapeError::FileNotFound(path.to_path_buf()));
        }

        let id = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Self::from_json(id, &fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        let singles = [
            ("performer_by_name", &self.performer_by_name),
            ("performer_by_fragment", &self.performer_by_fragment),
            ("scene_by_fragment", &self.scene_by_fragment),
            ("gallery_by_fragment", &self.gallery_by_fragment),
        ];
        let by_url = [
            ("performer_by_url", &self.performer_by_url),
            ("scene_by_url", &self.scene_by_url),
            ("gallery_by_url", &self.gallery_by_url),
            ("movie_by_url", &self.movie_by_url),
        ];

        let singles = singles.into_iter().filter_map(|(mode, c)| c.as_ref().map(|c| (mode, c)));

        // by-name and fragment lookups have no caller URL to fall back on;
        // performer_by_fragment never builds one
        for (mode, entry) in singles.clone().filter(|(mode, _)| *mode != "performer_by_fragment") {
            if entry.action != ScraperAction::Script && entry.query_url.as_deref().is_none_or(str::is_empty) {
                return Err(self.invalid(format!("{} has no query_url", mode)));
            }
        }

        let entries =
            singles.chain(by_url.into_iter().flat_map(|(mode, list)| list.iter().map(move |e| (mode, &e.config))));

        for (mode, entry) in entries {
            if entry.action != ScraperAction::Script && entry.scraper.trim().is_empty() {
                return Err(self.invalid(format!("{} has no scraper name", mode)));
            }
        }

        Ok(())
    }

    fn invalid(&self, message: String) -> ScrapeError {
        ConfigError::Invalid { source_name: self.id.clone(), message }.into()
    }

    /// By-URL entries for a record kind.
    pub fn by_url(&self, kind: RecordKind) -> &[ByUrlConfig] {
        match kind {
            RecordKind::Performer => &self.performer_by_url,
            RecordKind::Scene => &self.scene_by_url,
            RecordKind::Gallery => &self.gallery_by_url,
            RecordKind::Movie => &self.movie_by_url,
        }
    }

    /// First by-URL entry for `kind` that accepts `url`.
    pub fn match_url(&self, kind: RecordKind, url: &str) -> Option<&ScraperTypeConfig> {
        self.by_url(kind).iter().find(|entry| entry.matches(url)).map(|entry| &entry.config)
    }

    /// Looks up a named mapping for a backend.
    pub fn mapped_scraper(&self, backend: Backend, name: &str) -> Result<&MappedScraper> {
        let (kind, set) = match backend {
            Backend::Json => ("json scraper", &self.json_scrapers),
            Backend::Html => ("html scraper", &self.html_scrapers),
        };

        set.get(name)
            .ok_or_else(|| ConfigError::NotFound { kind, name: name.to_string() }.into())
    }

    /// Lookup modes this definition supports, for listings.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let flags = [
            ("performer_by_name", self.performer_by_name.is_some()),
            ("performer_by_fragment", self.performer_by_fragment.is_some()),
            ("scene_by_fragment", self.scene_by_fragment.is_some()),
            ("gallery_by_fragment", self.gallery_by_fragment.is_some()),
            ("performer_by_url", !self.performer_by_url.is_empty()),
            ("scene_by_url", !self.scene_by_url.is_empty()),
            ("gallery_by_url", !self.gallery_by_url.is_empty()),
            ("movie_by_url", !self.movie_by_url.is_empty()),
        ];

        flags.into_iter().filter(|(_, on)| *on).map(|(mode, _)| mode).collect()
    }
}

/// Immutable set of loaded scraper definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ScraperRegistry {
    scrapers: BTreeMap<String, Arc<ScraperConfig>>,
}

impl ScraperRegistry {
    pub fn new(configs: impl IntoIterator<Item = ScraperConfig>) -> Self {
        Self { scrapers: configs.into_iter().map(|c| (c.id.clone(), Arc::new(c))).collect() }
    }

    pub fn get(&self, id: &str) -> Result<Arc<ScraperConfig>> {
        self.scrapers
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound { kind: "scraper", name: id.to_string() }.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScraperConfig>> {
        self.scrapers.values()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }

    /// Scrapers with a by-URL entry for `kind` that accepts `url`, in id order.
    pub fn for_url(&self, kind: RecordKind, url: &str) -> Vec<Arc<ScraperConfig>> {
        self.scrapers
            .values()
            .filter(|c| c.match_url(kind, url).is_some())
            .cloned()
            .collect()
    }
}

/// Loads every `*.json` definition in a directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Loads the registry. Files that fail to parse or validate are logged and skipped.
    ///
    /// # Errors
    ///
    /// Fails only if the directory itself cannot be read. No directory yields an empty
    /// registry.
    pub fn load(&self) -> Result<ScraperRegistry> {
        let Some(dir) = &self.dir else {
            return Ok(ScraperRegistry::default());
        };
        if !dir.exists() {
            return Ok(ScraperRegistry::default());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut configs = Vec::new();
        for path in files {
            match ScraperConfig::from_file(&path) {
                Ok(config) => {
                    debug!("Loaded scraper '{}' from {}", config.id, path.display());
                    configs.push(config);
                }
                Err(e) => warn!("Failed to load scraper definition {}: {}", path.display(), e),
            }
        }

        Ok(ScraperRegistry::new(configs))
    }

    /// Get default config directory (~/.config/mapscrape/scrapers)
    fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("mapscrape").join("scrapers"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        let mut builder = ConfigLoaderBuilder::new();

        if let Some(dir) = Self::default_dir() {
            builder = builder.dir(dir);
        }

        builder.build()
    }
}

/// Builder for ConfigLoader
#[derive(Debug, Default)]
pub struct ConfigLoaderBuilder {
    dir: Option<PathBuf>,
}

impl ConfigLoaderBuilder {
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Set the definitions directory
    pub fn dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> ConfigLoader {
        ConfigLoader { dir: self.dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFINITION: &str = r#"{
        "name": "Example",
        "performer_by_name": {
            "action": "json",
            "scraper": "performer",
            "query_url": "https://api.example.com/search?q={}"
        },
        "scene_by_url": [
            { "action": "html", "url": ["example.com/video/"], "scraper": "page" },
            { "action": "json", "url": ["api.example.com/scene/"], "scraper": "scene" }
        ],
        "movie_by_url": [{ "action": "script", "url": ["example.com/movie/"] }],
        "json_scrapers": { "scene": { "scene": { "title": "title" } } },
        "html_scrapers": { "page": { "scene": { "title": "h1" } } },
        "driver": { "timeout": 5, "headers": [["X-Api-Key", "secret"]] },
        "debug": { "print_document": true }
    }"#;

    #[test]
    fn test_parse_definition() {
        let config = ScraperConfig::from_json("example", DEFINITION).unwrap();

        assert_eq!(config.id, "example");
        assert_eq!(config.name, "Example");
        assert_eq!(config.driver.timeout, 5);
        assert_eq!(config.driver.headers, vec![("X-Api-Key".to_string(), "secret".to_string())]);
        assert!(config.debug.print_document);
        assert_eq!(config.scene_by_url.len(), 2);
        assert_eq!(config.movie_by_url[0].config.action, ScraperAction::Script);
    }

    #[test]
    fn test_name_defaults_to_id() {
        let config = ScraperConfig::from_json("bare", "{}").unwrap();
        assert_eq!(config.name, "bare");
        assert!(config.capabilities().is_empty());
    }

    #[test]
    fn test_match_url_picks_first_matching_entry() {
        let config = ScraperConfig::from_json("example", DEFINITION).unwrap();

        let page = config.match_url(RecordKind::Scene, "https://www.example.com/video/12").unwrap();
        assert_eq!(page.action, ScraperAction::Html);

        let api = config.match_url(RecordKind::Scene, "https://api.example.com/scene/3").unwrap();
        assert_eq!(api.scraper, "scene");

        assert!(config.match_url(RecordKind::Scene, "https://other.org/video/1").is_none());
        assert!(config.match_url(RecordKind::Gallery, "https://www.example.com/video/12").is_none());
    }

    #[test]
    fn test_mapped_scraper_lookup() {
        let config = ScraperConfig::from_json("example", DEFINITION).unwrap();

        assert!(config.mapped_scraper(Backend::Html, "page").is_ok());
        let missing = config.mapped_scraper(Backend::Json, "page");
        assert!(matches!(
            missing,
            Err(ScrapeError::Config(ConfigError::NotFound { kind: "json scraper", .. }))
        ));
    }

    #[test]
    fn test_empty_scraper_name_is_invalid() {
        let result = ScraperConfig::from_json(
            "broken",
            r#"{"scene_by_fragment": {"action": "json", "query_url": "https://example.com/{oshash}"}}"#,
        );
        match result {
            Err(ScrapeError::Config(ConfigError::Invalid { source_name, message })) => {
                assert_eq!(source_name, "broken");
                assert_eq!(message, "scene_by_fragment has no scraper name");
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_fragment_without_query_url_is_invalid() {
        let result = ScraperConfig::from_json("broken", r#"{"gallery_by_fragment": {"action": "json", "scraper": "g"}}"#);
        assert!(
            matches!(result, Err(ScrapeError::Config(ConfigError::Invalid { message, .. })) if message.contains("query_url"))
        );

        let by_url = ScraperConfig::from_json("ok", r#"{"scene_by_url": [{"action": "json", "url": ["x"], "scraper": "s"}]}"#);
        assert!(by_url.is_ok());
    }

    #[test]
    fn test_performer_fragment_needs_no_query_url() {
        let config = ScraperConfig::from_json(
            "x",
            r#"{
                "performer_by_fragment": {"action": "json", "scraper": "api"},
                "scene_by_url": [{"action": "json", "url": ["example.com/scene/"], "scraper": "api"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.capabilities(), vec!["performer_by_fragment", "scene_by_url"]);
        assert!(config.match_url(RecordKind::Scene, "https://example.com/scene/1").is_some());
    }

    #[test]
    fn test_unknown_action_is_invalid() {
        let result = ScraperConfig::from_json("x", r#"{"scene_by_fragment": {"action": "xpath", "scraper": "s"}}"#);
        assert!(matches!(result, Err(ScrapeError::Config(ConfigError::Invalid { .. }))));
    }

    #[test]
    fn test_capabilities() {
        let config = ScraperConfig::from_json("example", DEFINITION).unwrap();
        assert_eq!(config.capabilities(), vec!["performer_by_name", "scene_by_url", "movie_by_url"]);
    }

    #[test]
    fn test_loader_skips_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("example.json"), DEFINITION).unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = ConfigLoaderBuilder::new().dir(temp_dir.path()).build().load().unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("example").unwrap().name, "Example");
        assert!(matches!(
            registry.get("broken"),
            Err(ScrapeError::Config(ConfigError::NotFound { kind: "scraper", .. }))
        ));
    }

    #[test]
    fn test_loader_missing_dir_is_empty() {
        let loader = ConfigLoaderBuilder::new().dir("/nonexistent/mapscrape").build();
        assert!(loader.load().unwrap().is_empty());
        assert!(ConfigLoader::new().load().unwrap().is_empty());
    }

    #[test]
    fn test_registry_for_url() {
        let example = ScraperConfig::from_json("example", DEFINITION).unwrap();
        let other = ScraperConfig::from_json("other", "{}").unwrap();
        let registry = ScraperRegistry::new([example, other]);

        let found = registry.for_url(RecordKind::Scene, "https://api.example.com/scene/3");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "example");
        assert!(registry.for_url(RecordKind::Performer, "https://api.example.com/scene/3").is_empty());
    }
}
