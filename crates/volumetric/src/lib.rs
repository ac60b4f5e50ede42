//! volumetric-rs: multi-representation scalar volumes with cached derived data.
//!
//! A [`Volume`] is one voxel grid (e.g. a CT scan) held in one or more
//! representations: a typed RAM buffer, a texture staging layout, or any
//! representation a collaborator defines. Expensive statistics are computed
//! on first request and cached on the volume.
//!
//! # Quick Start
//!
//! ```
//! use volumetric_rs::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let buffer = VoxelBuffer::from_vec(
//!         vec![0u8, 50, 100, 150, 200, 250, 255, 10],
//!         UVec3::splat(2),
//!     )?;
//!     let mut volume = Volume::from_buffer(buffer, Vec3::ONE, Vec3::ZERO);
//!
//!     let stats = volume.derived_data::<VolumeMinMax>()?;
//!     assert_eq!(stats.max, 255.0);
//!
//!     let world = volume.transform_point(Space::Voxel, Space::World, Vec3::ONE);
//!     assert_eq!(world, Vec3::ONE);
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `volumetric-core`: voxel buffers, representations, volumes, derived data
//! - `volumetric-resources`: the filename-keyed [`ResourceCache`]

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

mod error;
mod init;
pub mod raw;

pub use error::{Error, Result};
pub use init::init_logging;
pub use raw::{load_raw, read_raw, read_raw_file, read_raw_volume, RawVolumeInfo};

// Re-export core types
pub use volumetric_core::{
    default_sink, ByteOrder, ConvertibleRepresentation, DerivedData, Diagnostic, DiagnosticSink,
    ElementFormat, Histogram1D, LogSink, Options, RecordingSink, SharedSink, Space, SpatialFrame,
    TexelFormat, ValueMapping, Volume, VolumeError, VolumeHistogramIntensity, VolumeMinMax,
    VolumePreview, VolumeRam, VolumeRepresentation, VolumeTexture, VoxelBuffer, VoxelElement,
};

// Re-export resource types
pub use volumetric_resources::{
    CacheOptions, FileSystem, MemoryFileSystem, ResourceCache, ResourceError, ResourceResult,
    StdFileSystem,
};

// Re-export glam types for convenience
pub use glam::{Mat4, UVec3, Vec2, Vec3};
