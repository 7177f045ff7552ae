pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod mapping;
pub mod models;
pub mod query_url;
pub mod scrape;
pub mod storage;

pub use config::{
    ByUrlConfig, ConfigLoader, ConfigLoaderBuilder, DebugOptions, RecordKind, ScraperAction, ScraperConfig,
    ScraperRegistry, ScraperTypeConfig,
};
pub use document::{Backend, DocumentQuery, HtmlQuery, JsonQuery, QueryContext};
pub use error::{ConfigError, Result, ScrapeError};
pub use fetch::{FetchConfig, Fetcher, HttpFetcher, StaticFetcher};
pub use fetch::{fetch_file, fetch_url};
pub use mapping::{
    CommonSelectors, FieldMapping, GalleryMapping, MappedAttribute, MappedScraper, MovieMapping, PerformerMapping,
    PostProcessStep, RegexReplace, SceneMapping,
};
pub use models::{ScrapedGallery, ScrapedMovie, ScrapedPerformer, ScrapedRecord, ScrapedScene, ScrapedStudio, ScrapedTag};
pub use query_url::{QueryUrlParameters, ReplacementRule, apply_replacements, search_url};
pub use scrape::Scraper;
pub use storage::{
    EntityStore, GalleryUpdateInput, InMemoryStore, SceneUpdateInput, StoredGallery, StoredScene,
};
