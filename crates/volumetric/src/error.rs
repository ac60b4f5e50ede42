//! Error type spanning the volumetric-rs crates.

use thiserror::Error;
use volumetric_core::VolumeError;
use volumetric_resources::ResourceError;

/// Any error raised by volumetric-rs.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the volume model.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Error from the resource cache.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for volumetric-rs.
pub type Result<T> = std::result::Result<T, Error>;
