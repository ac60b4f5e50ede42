//! Error types for volumetric-rs.

use thiserror::Error;

/// The main error type for volume operations.
#[derive(Error, Debug)]
pub enum VolumeError {
    /// Voxel storage could not be obtained.
    #[error("failed to allocate {voxels} voxels ({bytes} bytes)")]
    AllocationFailed { voxels: usize, bytes: usize },

    /// Data size does not match the grid dimensions.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The volume holds no representation of the requested kind.
    #[error("representation '{0}' not found")]
    RepresentationNotFound(&'static str),

    /// A derived-data factory could not produce a value.
    #[error("derived data '{0}' could not be created")]
    DerivedDataUnavailable(&'static str),

    /// The element format name is not known.
    #[error("unknown voxel format '{0}'")]
    UnknownFormat(String),

    /// The element format has no texture counterpart.
    #[error("voxel format '{0}' cannot be staged as a texture")]
    UnsupportedTextureFormat(&'static str),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// A specialized Result type for volume operations.
pub type Result<T> = std::result::Result<T, VolumeError>;
