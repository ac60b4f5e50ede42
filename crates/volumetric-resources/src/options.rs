//! Configuration of a resource cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ResourceResult;

/// Settings a [`ResourceCache`](crate::ResourceCache) is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Whether loads of the same filename share one entry (default true).
    pub caching: bool,

    /// Directories tried, in order, when a filename does not exist as given.
    pub search_paths: Vec<PathBuf>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            caching: true,
            search_paths: Vec::new(),
        }
    }
}

impl CacheOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables sharing of entries by filename.
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    /// Appends a search path.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> ResourceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
