//! Loading headerless voxel payloads.
//!
//! A raw payload is the bare sample array of a volume, x-fastest, with the
//! element format, dimensions and byte order supplied by the caller.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use glam::{UVec3, Vec3};
use volumetric_core::representation::voxel_count;
use volumetric_core::{ByteOrder, ElementFormat, Volume, VolumeError, VolumeRam};
use volumetric_resources::ResourceCache;

use crate::error::Result;

/// Layout and placement of a raw voxel payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVolumeInfo {
    pub format: ElementFormat,
    pub dimensions: UVec3,
    pub spacing: Vec3,
    pub offset: Vec3,
    pub byte_order: ByteOrder,
}

impl RawVolumeInfo {
    /// Describes a little-endian payload with unit spacing at the origin.
    pub fn new(format: ElementFormat, dimensions: UVec3) -> Self {
        Self {
            format,
            dimensions,
            spacing: Vec3::ONE,
            offset: Vec3::ZERO,
            byte_order: ByteOrder::Little,
        }
    }

    #[must_use]
    pub fn with_spacing(mut self, spacing: Vec3) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Size of the payload in bytes, or `None` if it overflows.
    pub fn num_bytes(&self) -> Option<usize> {
        voxel_count(self.dimensions)?.checked_mul(self.format.bytes_per_voxel())
    }
}

/// Reads one payload from `reader` into a RAM representation.
///
/// Exactly [`RawVolumeInfo::num_bytes`] bytes are consumed; a shorter stream
/// fails with [`VolumeError::SizeMismatch`].
pub fn read_raw(reader: &mut dyn Read, info: &RawVolumeInfo) -> volumetric_core::Result<VolumeRam> {
    let expected = info.num_bytes().ok_or(VolumeError::AllocationFailed {
        voxels: usize::MAX,
        bytes: usize::MAX,
    })?;
    let mut bytes = Vec::new();
    if bytes.try_reserve_exact(expected).is_err() {
        return Err(VolumeError::AllocationFailed {
            voxels: expected / info.format.bytes_per_voxel(),
            bytes: expected,
        });
    }
    (&mut *reader).take(expected as u64).read_to_end(&mut bytes)?;
    if bytes.len() != expected {
        return Err(VolumeError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    VolumeRam::from_bytes(info.format, info.dimensions, &bytes, info.byte_order)
}

/// Reads a payload and wraps it into a volume placed as `info` describes.
pub fn read_raw_volume(reader: &mut dyn Read, info: &RawVolumeInfo) -> Result<Volume> {
    let ram = read_raw(reader, info)?;
    Ok(Volume::new(ram, info.spacing, info.offset))
}

/// Reads a payload from the file at `path`. The volume's origin is set to the
/// path.
pub fn read_raw_file(path: impl AsRef<Path>, info: &RawVolumeInfo) -> Result<Volume> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    Ok(read_raw_volume(&mut reader, info)?.with_origin(path.display().to_string()))
}

/// Loads a payload through `cache`, sharing it with earlier loads of the same
/// filename.
pub fn load_raw(
    cache: &mut ResourceCache<VolumeRam>,
    filename: &str,
    info: &RawVolumeInfo,
) -> Result<Rc<VolumeRam>> {
    Ok(cache.load_with(filename, |reader| read_raw(reader, info))?)
}
