//! Core volume model for volumetric-rs.
//!
//! This crate provides the fundamental types for working with scalar voxel grids:
//! - [`VoxelBuffer`] typed voxel storage for ten numeric element kinds
//! - [`VolumeRepresentation`] trait for storage forms, with [`VolumeRam`] and
//!   [`VolumeTexture`] as concrete representations
//! - [`Volume`] aggregating representations, cached [`DerivedData`] and spatial metadata
//! - Coordinate transforms between texture, voxel, physical and world space
//! - Diagnostics and configuration options

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Accessors and builders return values that callers may legitimately ignore
#![allow(clippy::must_use_candidate)]
// Voxel grids index with u32 coordinates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod derived;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod options;
pub mod ram;
pub mod representation;
pub mod texture;
pub mod value_mapping;
pub mod volume;

pub use buffer::VoxelBuffer;
pub use derived::{DerivedData, Histogram1D, VolumeHistogramIntensity, VolumeMinMax, VolumePreview};
pub use diagnostics::{default_sink, Diagnostic, DiagnosticSink, LogSink, RecordingSink, SharedSink};
pub use element::{ByteOrder, ElementFormat, VoxelElement};
pub use error::{Result, VolumeError};
pub use options::Options;
pub use ram::VolumeRam;
pub use representation::{ConvertibleRepresentation, VolumeRepresentation};
pub use texture::{TexelFormat, VolumeTexture};
pub use value_mapping::ValueMapping;
pub use volume::{Space, SpatialFrame, Volume};

// Re-export glam types for convenience
pub use glam::{Mat4, UVec3, Vec2, Vec3};
