//! Configuration options for volume processing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parameters consulted by the built-in derived-data factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Number of buckets of the intensity histogram (default 256).
    pub histogram_buckets: usize,

    /// Edge length of the square preview thumbnail in pixels (default 64).
    pub preview_size: u32,

    /// Gamma applied to normalized preview samples (default 1.8).
    pub preview_gamma: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            histogram_buckets: 256,
            preview_size: 64,
            preview_gamma: 1.8,
        }
    }
}

impl Options {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the histogram bucket count.
    pub fn with_histogram_buckets(mut self, buckets: usize) -> Self {
        self.histogram_buckets = buckets;
        self
    }

    /// Sets the preview edge length.
    pub fn with_preview_size(mut self, size: u32) -> Self {
        self.preview_size = size;
        self
    }

    /// Sets the preview gamma.
    pub fn with_preview_gamma(mut self, gamma: f32) -> Self {
        self.preview_gamma = gamma;
        self
    }

    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
