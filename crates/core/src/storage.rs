//! Entity lookup for fragment scrapes.
//!
//! Fragment mode re-scrapes an already stored scene or gallery: the orchestrator fetches
//! the stored attributes by id and feeds them to the URL template. Persistence itself lives
//! outside this crate; [`InMemoryStore`] covers the CLI and tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Result, ScrapeError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoredScene {
    pub id: String,
    pub checksum: Option<String>,
    pub oshash: Option<String>,
    /// Full path of the underlying file.
    pub path: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoredGallery {
    pub id: String,
    pub checksum: Option<String>,
    pub path: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
}

/// Partial update referencing a stored scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SceneUpdateInput {
    pub id: String,
}

/// Partial update referencing a stored gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GalleryUpdateInput {
    pub id: String,
}

/// Read access to stored scenes and galleries.
pub trait EntityStore: Send + Sync {
    fn find_scene(&self, id: &str) -> Result<Option<StoredScene>>;

    fn find_gallery(&self, id: &str) -> Result<Option<StoredGallery>>;

    fn scene_from_update(&self, input: &SceneUpdateInput) -> Result<Option<StoredScene>> {
        self.find_scene(&input.id)
    }

    fn gallery_from_update(&self, input: &GalleryUpdateInput) -> Result<Option<StoredGallery>> {
        self.find_gallery(&input.id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreFile {
    scenes: Vec<StoredScene>,
    galleries: Vec<StoredGallery>,
}

/// Map-backed store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    scenes: HashMap<String, StoredScene>,
    galleries: HashMap<String, StoredGallery>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, scene: StoredScene) -> Self {
        self.scenes.insert(scene.id.clone(), scene);
        self
    }

    pub fn with_gallery(mut self, gallery: StoredGallery) -> Self {
        self.galleries.insert(gallery.id.clone(), gallery);
        self
    }

    /// Parses `{"scenes": [...], "galleries": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: StoreFile = serde_json::from_str(json).map_err(|e| ScrapeError::Storage(e.to_string()))?;

        let store = file.scenes.into_iter().fold(Self::new(), Self::with_scene);
        Ok(file.galleries.into_iter().fold(store, Self::with_gallery))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScrapeError::FileNotFound(path.to_path_buf()));
        }

        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl EntityStore for InMemoryStore {
    fn find_scene(&self, id: &str) -> Result<Option<StoredScene>> {
        Ok(self.scenes.get(id).cloned())
    }

    fn find_gallery(&self, id: &str) -> Result<Option<StoredGallery>> {
        Ok(self.galleries.get(id).cloned())
    }
}
