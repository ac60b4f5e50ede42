//! Shared, path-addressable resources for volumetric-rs.
//!
//! [`ResourceCache`] keeps one instance of every loaded resource per filename
//! and counts how many consumers use it. Files are located through a list of
//! search paths and read through a [`FileSystem`].

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod filesystem;
pub mod options;

pub use cache::ResourceCache;
pub use error::{ResourceError, ResourceResult};
pub use filesystem::{FileSystem, MemoryFileSystem, StdFileSystem};
pub use options::CacheOptions;
