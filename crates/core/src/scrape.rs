//! Scrape orchestration.
//!
//! [`Scraper`] ties one scraper definition to a fetcher and an entity store. Each public
//! method is a one-shot pipeline: resolve the lookup mode, build the request URL, fetch,
//! wrap the payload in the configured backend, and assemble the record from the mapping.
//! Everything that can be decided from the definition alone is checked before any I/O.
//!
//! # Example
//!
//! ```rust
//! use mapscrape_core::{InMemoryStore, ScraperConfig, Scraper, StaticFetcher};
//!
//! let config = ScraperConfig::from_json("example", r#"{
//!     "scene_by_url": [{ "action": "json", "url": ["example.com/api/"], "scraper": "scene" }],
//!     "json_scrapers": { "scene": { "scene": { "title": "title" } } }
//! }"#).unwrap();
//!
//! let fetcher = StaticFetcher::new().with_document("https://example.com/api/1", r#"{"title": "Intro"}"#);
//! let store = InMemoryStore::new();
//! let scraper = Scraper::new(&config, &fetcher, &store);
//!
//! let scene = scraper.scrape_scene_by_url("https://example.com/api/1").unwrap();
//! assert_eq!(scene.title.as_deref(), Some("Intro"));
//! ```

use tracing::debug;

use crate::config::{RecordKind, ScraperConfig, ScraperTypeConfig};
use crate::document::{Backend, DocumentQuery, QueryContext};
use crate::fetch::Fetcher;
use crate::mapping::MappedScraper;
use crate::models::{ScrapedGallery, ScrapedMovie, ScrapedPerformer, ScrapedScene};
use crate::query_url::{QueryUrlParameters, apply_replacements, search_url};
use crate::storage::{EntityStore, GalleryUpdateInput, SceneUpdateInput};
use crate::{ConfigError, Result, ScrapeError};

/// A lookup mode resolved against the definition.
struct Resolved<'a> {
    mode: &'static str,
    type_config: &'a ScraperTypeConfig,
    backend: Backend,
    mapping: &'a MappedScraper,
}

impl<'a> Resolved<'a> {
    /// The record-kind mapping, or `Unsupported` if the named mapping has none.
    fn require<T>(&self, kind: &str, mapping: &'a Option<T>) -> Result<&'a T> {
        mapping.as_ref().ok_or_else(|| {
            ScrapeError::Unsupported(format!(
                "{} for {} scraper '{}' without a {} mapping",
                self.mode,
                self.backend.name(),
                self.type_config.scraper,
                kind
            ))
        })
    }

    /// `query_url` plus `query_url_replace` with the given parameters.
    fn query_url(&self, id: &str, build: impl FnOnce(&str) -> String) -> Result<String> {
        let template = self
            .type_config
            .query_url
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Invalid {
                source_name: id.to_string(),
                message: format!("{} has no query_url", self.mode),
            })?;

        Ok(apply_replacements(&build(template), &self.type_config.query_url_replace))
    }
}

/// Runs lookups for one scraper definition.
pub struct Scraper<'a> {
    config: &'a ScraperConfig,
    fetcher: &'a dyn Fetcher,
    store: &'a dyn EntityStore,
}

impl<'a> Scraper<'a> {
    pub fn new(config: &'a ScraperConfig, fetcher: &'a dyn Fetcher, store: &'a dyn EntityStore) -> Self {
        Self { config, fetcher, store }
    }

    pub fn config(&self) -> &'a ScraperConfig {
        self.config
    }

    fn context(&self) -> QueryContext<'a> {
        QueryContext::new(self.fetcher, &self.config.driver).with_print_document(self.config.debug.print_document)
    }

    fn resolve(&self, mode: &'static str, type_config: Option<&'a ScraperTypeConfig>) -> Result<Resolved<'a>> {
        let type_config = type_config
            .ok_or_else(|| ScrapeError::Unsupported(format!("{} for scraper '{}'", mode, self.config.id)))?;

        let backend = type_config
            .action
            .backend()
            .ok_or_else(|| ScrapeError::Unsupported(format!("{} with script action", mode)))?;

        let mapping = self.config.mapped_scraper(backend, &type_config.scraper)?;

        Ok(Resolved { mode, type_config, backend, mapping })
    }

    fn resolve_url(&self, kind: RecordKind, mode: &'static str, url: &str) -> Result<Resolved<'a>> {
        self.resolve(mode, self.config.match_url(kind, url))
    }

    /// Caller URL → request URL: `url_rewrite`, then the optional `query_url` template.
    fn by_url_target(&self, resolved: &Resolved<'_>, url: &str) -> String {
        let rewritten = apply_replacements(url, &resolved.type_config.url_rewrite);

        match resolved.type_config.query_url.as_deref().filter(|t| !t.is_empty()) {
            Some(template) => apply_replacements(
                &QueryUrlParameters::from_url(&rewritten).construct_url(template),
                &resolved.type_config.query_url_replace,
            ),
            None => rewritten,
        }
    }

    fn load(&self, resolved: &Resolved<'_>, url: &str) -> Result<Box<dyn DocumentQuery + 'a>> {
        debug!("{} via {} scraper '{}': {}", resolved.mode, resolved.backend.name(), resolved.type_config.scraper, url);
        resolved.backend.load(url, self.context())
    }

    pub fn scrape_performer_by_url(&self, url: &str) -> Result<ScrapedPerformer> {
        let resolved = self.resolve_url(RecordKind::Performer, "performer_by_url", url)?;
        let mapping = resolved.require("performer", &resolved.mapping.performer)?;

        let q = self.load(&resolved, &self.by_url_target(&resolved, url))?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }

    pub fn scrape_scene_by_url(&self, url: &str) -> Result<ScrapedScene> {
        let resolved = self.resolve_url(RecordKind::Scene, "scene_by_url", url)?;
        let mapping = resolved.require("scene", &resolved.mapping.scene)?;

        let q = self.load(&resolved, &self.by_url_target(&resolved, url))?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }

    pub fn scrape_gallery_by_url(&self, url: &str) -> Result<ScrapedGallery> {
        let resolved = self.resolve_url(RecordKind::Gallery, "gallery_by_url", url)?;
        let mapping = resolved.require("gallery", &resolved.mapping.gallery)?;

        let q = self.load(&resolved, &self.by_url_target(&resolved, url))?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }

    pub fn scrape_movie_by_url(&self, url: &str) -> Result<ScrapedMovie> {
        let resolved = self.resolve_url(RecordKind::Movie, "movie_by_url", url)?;
        let mapping = resolved.require("movie", &resolved.mapping.movie)?;

        let q = self.load(&resolved, &self.by_url_target(&resolved, url))?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }

    /// Searches performers by name. Every matched result becomes one performer.
    pub fn scrape_performers_by_name(&self, name: &str) -> Result<Vec<ScrapedPerformer>> {
        let resolved = self.resolve("performer_by_name", self.config.performer_by_name.as_ref())?;
        let mapping = resolved.require("performer", &resolved.mapping.performer)?;

        let url = resolved.query_url(&self.config.id, |template| search_url(template, name))?;
        let q = self.load(&resolved, &url)?;
        Ok(mapping.scrape_list(q.as_ref(), &resolved.mapping.common))
    }

    /// Not available for mapped scrapers; fails without any I/O.
    pub fn scrape_performer_by_fragment(&self, _fragment: &ScrapedPerformer) -> Result<ScrapedPerformer> {
        Err(ScrapeError::Unsupported(format!(
            "performer_by_fragment for mapped scraper '{}'",
            self.config.id
        )))
    }

    pub fn scrape_scene_by_fragment(&self, input: &SceneUpdateInput) -> Result<ScrapedScene> {
        let resolved = self.resolve("scene_by_fragment", self.config.scene_by_fragment.as_ref())?;
        let mapping = resolved.require("scene", &resolved.mapping.scene)?;

        let stored = self
            .store
            .scene_from_update(input)?
            .ok_or_else(|| ScrapeError::EntityNotFound { kind: "scene", id: input.id.clone() })?;

        let params = QueryUrlParameters::from_scene(&stored);
        let url = resolved.query_url(&self.config.id, |template| params.construct_url(template))?;
        let q = self.load(&resolved, &url)?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }

    pub fn scrape_gallery_by_fragment(&self, input: &GalleryUpdateInput) -> Result<ScrapedGallery> {
        let resolved = self.resolve("gallery_by_fragment", self.config.gallery_by_fragment.as_ref())?;
        let mapping = resolved.require("gallery", &resolved.mapping.gallery)?;

        let stored = self
            .store
            .gallery_from_update(input)?
            .ok_or_else(|| ScrapeError::EntityNotFound { kind: "gallery", id: input.id.clone() })?;

        let params = QueryUrlParameters::from_gallery(&stored);
        let url = resolved.query_url(&self.config.id, |template| params.construct_url(template))?;
        let q = self.load(&resolved, &url)?;
        Ok(mapping.scrape(q.as_ref(), &resolved.mapping.common))
    }
}
