//! The storage-form contract shared by every representation of a volume.
//!
//! A [`VolumeRepresentation`] stores the voxels of one logical grid in some
//! form: a typed RAM buffer, a texture staging layout, or anything a
//! collaborator defines. All representations held by one volume report the
//! same dimensions.

use std::any::Any;

use glam::UVec3;

use crate::error::Result;
use crate::ram::VolumeRam;
use crate::volume::Volume;

/// A concrete storage form of a volume's voxel grid.
pub trait VolumeRepresentation: Any {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Short human-readable name of the representation kind (e.g. "ram").
    fn kind_name(&self) -> &'static str;

    /// Grid dimensions in voxels. Fixed for the lifetime of the representation.
    fn dimensions(&self) -> UVec3;

    /// Product of the dimensions.
    fn num_voxels(&self) -> usize;

    /// Bytes used to store one voxel.
    fn bytes_per_voxel(&self) -> usize;

    /// Total bytes of voxel storage.
    fn num_bytes(&self) -> usize {
        self.num_voxels() * self.bytes_per_voxel()
    }

    /// Moves typed RAM storage into a [`VolumeRam`]. Representations of any
    /// other kind are handed back unchanged.
    fn into_volume_ram(self) -> std::result::Result<VolumeRam, Self>
    where
        Self: Sized,
    {
        Err(self)
    }
}

/// A representation that can be derived from another one held by the volume.
///
/// [`Volume::representation_or_convert`] uses this to fill in a missing
/// representation on first request.
pub trait ConvertibleRepresentation: VolumeRepresentation + Sized {
    /// Builds this representation from the volume's existing representations.
    fn convert_from(volume: &Volume) -> Result<Self>;
}

/// Returns the number of voxels in a grid, or `None` if it overflows `usize`.
pub fn voxel_count(dimensions: UVec3) -> Option<usize> {
    let x = usize::try_from(dimensions.x).ok()?;
    let y = usize::try_from(dimensions.y).ok()?;
    let z = usize::try_from(dimensions.z).ok()?;
    x.checked_mul(y)?.checked_mul(z)
}
