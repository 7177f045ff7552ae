//! Error types for scrape operations.
//!
//! This module defines the main error type [`ScrapeError`]. It covers every failure that
//! ends a scrape invocation: configuration lookups, unsupported lookup modes, fetching,
//! and document construction.
//!
//! Absent data is deliberately *not* represented here. A selector that resolves to nothing,
//! or a sub-document that cannot be fetched, degrades to an omitted field and is only logged.
//!
//! # Example
//!
//! ```rust
//! use mapscrape_core::{Result, ScrapeError};
//!
//! fn require_name(name: &str) -> Result<&str> {
//!     if name.is_empty() {
//!         return Err(ScrapeError::Unsupported("empty search term".to_string()));
//!     }
//!     Ok(name)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the loaded scraper definitions.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A named scraper or mapping is absent from the loaded config set.
    #[error("{kind} with name '{name}' not found in config")]
    NotFound { kind: &'static str, name: String },

    /// A scraper definition could not be parsed or failed validation.
    #[error("invalid scraper definition {source_name}: {message}")]
    Invalid { source_name: String, message: String },
}

/// Main error type for scrape operations.
///
/// # Example
///
/// ```rust
/// use mapscrape_core::{ScrapeError, Scraper};
/// # fn run(scraper: &Scraper<'_>) {
/// match scraper.scrape_scene_by_url("https://example.com/scene/1") {
///     Ok(scene) => println!("title: {:?}", scene.title),
///     Err(ScrapeError::Unsupported(what)) => println!("not supported: {}", what),
///     Err(e) => println!("Error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP transport errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided or constructed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local document not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Standard I/O errors while reading documents or definitions.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload is not a valid document for the backend, even after JSONP repair.
    #[error("not valid {backend}: {url}")]
    InvalidDocument { backend: &'static str, url: String },

    /// Scraper or mapping lookup failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The lookup mode has no implementation for this record kind or backend.
    ///
    /// Returned before any I/O is attempted.
    #[error("{0} not supported")]
    Unsupported(String),

    /// Fragment-mode lookup found no stored entity.
    #[error("no {kind} found with id {id}")]
    EntityNotFound { kind: &'static str, id: String },

    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for ScrapeError.
pub type Result<T> = std::result::Result<T, ScrapeError>;
