//! Declarative field mappings.
//!
//! A [`MappedScraper`] describes how to turn one document into typed records: every output
//! field names a selector plus an optional post-processing pipeline. Mappings are
//! backend-agnostic; selectors are handed verbatim to whichever [`DocumentQuery`] wraps the
//! fetched document.
//!
//! # Example
//!
//! ```rust
//! use mapscrape_core::document::{Backend, QueryContext};
//! use mapscrape_core::mapping::MappedScraper;
//! use mapscrape_core::{FetchConfig, StaticFetcher};
//!
//! let scraper: MappedScraper = serde_json::from_str(r#"{
//!     "scene": {
//!         "title": "data.title",
//!         "date": { "selector": "data.released", "post_process": [{ "parse_date": "%d/%m/%Y" }] },
//!         "tags": { "name": "data.tags.#.label" }
//!     }
//! }"#).unwrap();
//!
//! let fetcher = StaticFetcher::new();
//! let fetch_config = FetchConfig::default();
//! let ctx = QueryContext::new(&fetcher, &fetch_config);
//! let doc = r#"{"data": {"title": "Intro", "released": "02/01/2006", "tags": [{"label": "outdoor"}]}}"#;
//! let query = Backend::Json.wrap(doc, "https://example.com/scene/1", ctx).unwrap();
//!
//! let scene = scraper.scene.as_ref().unwrap().scrape(query.as_ref(), &scraper.common);
//! assert_eq!(scene.title.as_deref(), Some("Intro"));
//! assert_eq!(scene.date.as_deref(), Some("2006-01-02"));
//! assert_eq!(scene.tags[0].name.as_deref(), Some("outdoor"));
//! ```

pub mod postprocess;

pub use postprocess::{PostProcessStep, RegexReplace};

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

use crate::document::DocumentQuery;
use crate::models::{
    ScrapedGallery, ScrapedMovie, ScrapedPerformer, ScrapedRecord, ScrapedScene, ScrapedStudio, ScrapedTag,
};

/// Named selector fragments, substituted into selectors by name (`$performer`).
pub type CommonSelectors = BTreeMap<String, String>;

/// How one output field is produced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "AttributeRepr")]
pub struct MappedAttribute {
    pub selector: String,
    /// Static value; when set the selector is not evaluated.
    pub fixed: Option<String>,
    pub post_process: Vec<PostProcessStep>,
    /// Join all selector results into one value before post-processing.
    pub concat: Option<String>,
    /// Split every post-processed value on this separator.
    pub split: Option<String>,
}

/// A bare string is shorthand for `{ "selector": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeRepr {
    Selector(String),
    Full {
        #[serde(default)]
        selector: String,
        #[serde(default)]
        fixed: Option<String>,
        #[serde(default)]
        post_process: Vec<PostProcessStep>,
        #[serde(default)]
        concat: Option<String>,
        #[serde(default)]
        split: Option<String>,
    },
}

impl From<AttributeRepr> for MappedAttribute {
    fn from(repr: AttributeRepr) -> Self {
        match repr {
            AttributeRepr::Selector(selector) => Self { selector, ..Default::default() },
            AttributeRepr::Full { selector, fixed, post_process, concat, split } => {
                Self { selector, fixed, post_process, concat, split }
            }
        }
    }
}

impl MappedAttribute {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(), ..Default::default() }
    }

    pub fn fixed(value: impl Into<String>) -> Self {
        Self { fixed: Some(value.into()), ..Default::default() }
    }

    pub fn with_step(mut self, step: PostProcessStep) -> Self {
        self.post_process.push(step);
        self
    }

    /// Evaluates the attribute: selector (or fixed value), concat, post-processing, split.
    ///
    /// Returned values are trimmed and never empty.
    pub fn evaluate(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> Vec<String> {
        let mut values = match &self.fixed {
            Some(fixed) => vec![fixed.clone()],
            None if self.selector.trim().is_empty() => return Vec::new(),
            None => q.run_query(&apply_common(&self.selector, common)),
        };

        if let Some(separator) = &self.concat
            && !values.is_empty()
        {
            values = vec![values.join(separator)];
        }

        for step in &self.post_process {
            if values.is_empty() {
                break;
            }
            values = step.apply(values, q, common);
        }

        if let Some(separator) = &self.split {
            values = values
                .iter()
                .flat_map(|v| v.split(separator.as_str()))
                .map(str::to_string)
                .collect();
        }

        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Substitutes common fragments, longest name first so `$perf` never clobbers `$performer`.
fn apply_common(selector: &str, common: &CommonSelectors) -> String {
    if common.is_empty() || !selector.contains('$') {
        return selector.to_string();
    }

    let mut names: Vec<&String> = common.keys().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    names.into_iter().fold(selector.to_string(), |acc, name| acc.replace(name.as_str(), &common[name]))
}

/// Ordered `field name → attribute` list. Field names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    fields: Vec<(String, MappedAttribute)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any previous attribute with the same name in place.
    pub fn with_field(mut self, name: impl Into<String>, attr: MappedAttribute) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = attr,
            None => self.fields.push((name, attr)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &MappedAttribute)> {
        self.fields.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Evaluates every field in order.
    pub fn evaluate(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> Vec<(&str, Vec<String>)> {
        self.fields()
            .map(|(name, attr)| (name, attr.evaluate(q, common)))
            .collect()
    }

    /// Builds one record from the first value of every field.
    pub fn assemble<R: ScrapedRecord>(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> R {
        let mut record = R::default();

        for (name, values) in self.evaluate(q, common) {
            if let Some(value) = values.into_iter().next()
                && !record.set_field(name, value)
            {
                debug!("Ignoring unknown {} field '{}'", R::KIND, name);
            }
        }

        record
    }

    /// Builds one record per result index; record `i` takes the `i`-th value of every field.
    pub fn assemble_list<R: ScrapedRecord>(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> Vec<R> {
        let evaluated = self.evaluate(q, common);
        let count = evaluated.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        let mut records: Vec<R> = (0..count).map(|_| R::default()).collect();

        for (name, values) in evaluated {
            for (record, value) in records.iter_mut().zip(values) {
                if !record.set_field(name, value) {
                    debug!("Ignoring unknown {} field '{}'", R::KIND, name);
                    break;
                }
            }
        }

        records
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMappingVisitor;

        impl<'de> Visitor<'de> for FieldMappingVisitor {
            type Value = FieldMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to selectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldMapping, A::Error> {
                let mut fields: Vec<(String, MappedAttribute)> = Vec::new();

                while let Some((name, attr)) = map.next_entry::<String, MappedAttribute>()? {
                    if fields.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate field '{}'", name)));
                    }
                    fields.push((name, attr));
                }

                Ok(FieldMapping { fields })
            }
        }

        deserializer.deserialize_map(FieldMappingVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerformerMapping {
    #[serde(flatten)]
    pub fields: FieldMapping,
    pub tags: Option<FieldMapping>,
}

impl PerformerMapping {
    pub fn scrape(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> ScrapedPerformer {
        let mut performer: ScrapedPerformer = self.fields.assemble(q, common);
        if let Some(tags) = &self.tags {
            performer.tags = tags.assemble_list(q, common);
        }
        performer
    }

    /// Search results: one performer per matched result.
    pub fn scrape_list(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> Vec<ScrapedPerformer> {
        self.fields.assemble_list(q, common)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SceneMapping {
    #[serde(flatten)]
    pub fields: FieldMapping,
    pub tags: Option<FieldMapping>,
    pub performers: Option<FieldMapping>,
    pub studio: Option<FieldMapping>,
    pub movies: Option<FieldMapping>,
}

impl SceneMapping {
    pub fn scrape(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> ScrapedScene {
        let mut scene: ScrapedScene = self.fields.assemble(q, common);

        if let Some(tags) = &self.tags {
            scene.tags = tags.assemble_list::<ScrapedTag>(q, common);
        }
        if let Some(performers) = &self.performers {
            scene.performers = performers.assemble_list::<ScrapedPerformer>(q, common);
        }
        if let Some(studio) = &self.studio {
            scene.studio = scrape_studio(studio, q, common);
        }
        if let Some(movies) = &self.movies {
            scene.movies = movies.assemble_list::<ScrapedMovie>(q, common);
        }

        scene
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GalleryMapping {
    #[serde(flatten)]
    pub fields: FieldMapping,
    pub tags: Option<FieldMapping>,
    pub performers: Option<FieldMapping>,
    pub studio: Option<FieldMapping>,
}

impl GalleryMapping {
    pub fn scrape(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> ScrapedGallery {
        let mut gallery: ScrapedGallery = self.fields.assemble(q, common);

        if let Some(tags) = &self.tags {
            gallery.tags = tags.assemble_list::<ScrapedTag>(q, common);
        }
        if let Some(performers) = &self.performers {
            gallery.performers = performers.assemble_list::<ScrapedPerformer>(q, common);
        }
        if let Some(studio) = &self.studio {
            gallery.studio = scrape_studio(studio, q, common);
        }

        gallery
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieMapping {
    #[serde(flatten)]
    pub fields: FieldMapping,
    pub studio: Option<FieldMapping>,
}

impl MovieMapping {
    pub fn scrape(&self, q: &dyn DocumentQuery, common: &CommonSelectors) -> ScrapedMovie {
        let mut movie: ScrapedMovie = self.fields.assemble(q, common);
        if let Some(studio) = &self.studio {
            movie.studio = scrape_studio(studio, q, common);
        }
        movie
    }
}

fn scrape_studio(mapping: &FieldMapping, q: &dyn DocumentQuery, common: &CommonSelectors) -> Option<ScrapedStudio> {
    let studio: ScrapedStudio = mapping.assemble(q, common);
    if studio.is_empty() { None } else { Some(studio) }
}

/// One named mapping set, shared by every lookup mode that references it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MappedScraper {
    pub common: CommonSelectors,
    pub performer: Option<PerformerMapping>,
    pub scene: Option<SceneMapping>,
    pub gallery: Option<GalleryMapping>,
    pub movie: Option<MovieMapping>,
}
