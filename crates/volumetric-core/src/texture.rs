//! Texture staging representation.
//!
//! A [`VolumeTexture`] describes the single-channel 3D texture a GPU
//! collaborator uploads for a volume: texel format, upload extent, the staged
//! bytes and the pixel-transfer mapping that relates texel values read in a
//! shader back to normalized sample values. This module never talks to a GPU
//! API.

use std::any::Any;

use glam::UVec3;

use crate::element::ElementFormat;
use crate::error::{Result, VolumeError};
use crate::ram::VolumeRam;
use crate::representation::{ConvertibleRepresentation, VolumeRepresentation};
use crate::value_mapping::ValueMapping;
use crate::volume::Volume;

/// Single-channel texel formats a volume can be staged as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    R8Unorm,
    R8Snorm,
    R16Unorm,
    R16Snorm,
    R32Uint,
    R32Sint,
    R32Float,
}

impl TexelFormat {
    /// Picks the texel format for an element format.
    ///
    /// 64-bit integers and doubles have no single-channel texture counterpart.
    pub fn for_element(format: ElementFormat) -> Result<Self> {
        match format {
            ElementFormat::UInt8 => Ok(TexelFormat::R8Unorm),
            ElementFormat::Int8 => Ok(TexelFormat::R8Snorm),
            ElementFormat::UInt16 => Ok(TexelFormat::R16Unorm),
            ElementFormat::Int16 => Ok(TexelFormat::R16Snorm),
            ElementFormat::UInt32 => Ok(TexelFormat::R32Uint),
            ElementFormat::Int32 => Ok(TexelFormat::R32Sint),
            ElementFormat::Float => Ok(TexelFormat::R32Float),
            ElementFormat::UInt64 | ElementFormat::Int64 | ElementFormat::Double => {
                Err(VolumeError::UnsupportedTextureFormat(format.name()))
            }
        }
    }

    /// Size of one texel in bytes.
    pub fn bytes_per_texel(self) -> usize {
        match self {
            TexelFormat::R8Unorm | TexelFormat::R8Snorm => 1,
            TexelFormat::R16Unorm | TexelFormat::R16Snorm => 2,
            TexelFormat::R32Uint | TexelFormat::R32Sint | TexelFormat::R32Float => 4,
        }
    }
}

/// A volume staged for upload as a 3D texture.
#[derive(Debug, Clone)]
pub struct VolumeTexture {
    dimensions: UVec3,
    num_voxels: usize,
    texture_dimensions: UVec3,
    element_format: ElementFormat,
    texel_format: TexelFormat,
    data: Vec<u8>,
    pixel_transfer: ValueMapping,
}

impl VolumeTexture {
    /// Stages the samples of a RAM representation.
    ///
    /// Volumes with a single slice are doubled in depth, since a 3D texture
    /// needs at least two slices for linear filtering along z.
    pub fn from_ram(ram: &VolumeRam) -> Result<Self> {
        let element_format = ram.format();
        let texel_format = TexelFormat::for_element(element_format)?;

        let dimensions = ram.dimensions();
        let bytes = ram.as_bytes();
        let (texture_dimensions, data) = if dimensions.z > 1 {
            (dimensions, bytes.to_vec())
        } else {
            log::warn!(
                target: "VolumeTexture",
                "3D textures need more than one slice: cloning slice"
            );
            let mut doubled = Vec::with_capacity(bytes.len() * 2);
            doubled.extend_from_slice(bytes);
            doubled.extend_from_slice(bytes);
            (UVec3::new(dimensions.x, dimensions.y, dimensions.z * 2), doubled)
        };

        // Texel reads return raw / type max for normalized formats. Signed
        // types are additionally shifted from [-1, 1] to [0, 1] on upload.
        let scale = if element_format.is_integer() {
            ram.element_range().y
        } else {
            1.0
        };
        let pixel_transfer = if element_format.is_integer() && element_format.is_signed() {
            ValueMapping::new(1.0 / scale * 0.5, 0.5)
        } else {
            ValueMapping::new(1.0 / scale, 0.0)
        };

        Ok(Self {
            dimensions,
            num_voxels: ram.num_voxels(),
            texture_dimensions,
            element_format,
            texel_format,
            data,
            pixel_transfer,
        })
    }

    /// Format of the staged texels.
    pub fn texel_format(&self) -> TexelFormat {
        self.texel_format
    }

    /// Element format of the volume the texture was staged from.
    pub fn element_format(&self) -> ElementFormat {
        self.element_format
    }

    /// Extent of the texture to allocate. Differs from
    /// [`VolumeRepresentation::dimensions`] only for single-slice volumes.
    pub fn texture_dimensions(&self) -> UVec3 {
        self.texture_dimensions
    }

    /// Staged texel bytes in host byte order, x-fastest.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Maps raw sample values to the value a shader reads from the texture.
    pub fn pixel_transfer(&self) -> &ValueMapping {
        &self.pixel_transfer
    }
}

impl VolumeRepresentation for VolumeTexture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind_name(&self) -> &'static str {
        "texture"
    }

    fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    fn num_voxels(&self) -> usize {
        self.num_voxels
    }

    fn bytes_per_voxel(&self) -> usize {
        self.texel_format.bytes_per_texel()
    }
}

impl ConvertibleRepresentation for VolumeTexture {
    fn convert_from(volume: &Volume) -> Result<Self> {
        Self::from_ram(volume.ram()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::VoxelBuffer;

    #[test]
    fn test_texel_format_for_element() {
        assert_eq!(
            TexelFormat::for_element(ElementFormat::UInt8).unwrap(),
            TexelFormat::R8Unorm
        );
        assert_eq!(
            TexelFormat::for_element(ElementFormat::Int16).unwrap(),
            TexelFormat::R16Snorm
        );
        assert_eq!(
            TexelFormat::for_element(ElementFormat::Float).unwrap(),
            TexelFormat::R32Float
        );
        for format in [ElementFormat::UInt64, ElementFormat::Int64, ElementFormat::Double] {
            assert!(matches!(
                TexelFormat::for_element(format),
                Err(VolumeError::UnsupportedTextureFormat(_))
            ));
        }
    }

    #[test]
    fn test_stage_multi_slice() {
        let data: Vec<u16> = (0..8).collect();
        let ram = VolumeRam::from(VoxelBuffer::from_vec(data, UVec3::splat(2)).unwrap());
        let texture = VolumeTexture::from_ram(&ram).unwrap();
        assert_eq!(texture.texture_dimensions(), UVec3::splat(2));
        assert_eq!(texture.dimensions(), UVec3::splat(2));
        assert_eq!(texture.data(), ram.as_bytes());
        assert_eq!(texture.num_voxels(), 8);
        assert_eq!(texture.bytes_per_voxel(), 2);
        assert!((texture.pixel_transfer().map(65535.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_slice_is_doubled() {
        let ram =
            VolumeRam::from(VoxelBuffer::from_vec(vec![1u8, 2, 3, 4], UVec3::new(2, 2, 1)).unwrap());
        let texture = VolumeTexture::from_ram(&ram).unwrap();
        assert_eq!(texture.texture_dimensions(), UVec3::new(2, 2, 2));
        assert_eq!(texture.dimensions(), UVec3::new(2, 2, 1));
        assert_eq!(texture.data(), &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(texture.num_voxels(), 4);
    }

    #[test]
    fn test_signed_pixel_transfer() {
        let ram = VolumeRam::from(VoxelBuffer::from_vec(vec![0i8, 127], UVec3::new(1, 1, 2)).unwrap());
        let texture = VolumeTexture::from_ram(&ram).unwrap();
        let mapping = texture.pixel_transfer();
        assert!((mapping.map(0.0) - 0.5).abs() < 1e-6);
        assert!((mapping.map(127.0) - 1.0).abs() < 1e-6);
        assert!(mapping.map(-127.0).abs() < 1e-6);
    }

    #[test]
    fn test_float_pixel_transfer_is_identity() {
        let ram =
            VolumeRam::from(VoxelBuffer::from_vec(vec![0.5f32, -2.0], UVec3::new(1, 1, 2)).unwrap());
        let texture = VolumeTexture::from_ram(&ram).unwrap();
        assert_eq!(texture.pixel_transfer().map(-2.0), -2.0);
        assert_eq!(texture.texel_format(), TexelFormat::R32Float);
    }

    #[test]
    fn test_double_is_rejected() {
        let ram = VolumeRam::create(ElementFormat::Double, UVec3::splat(2)).unwrap();
        assert!(matches!(
            VolumeTexture::from_ram(&ram),
            Err(VolumeError::UnsupportedTextureFormat("double"))
        ));
    }
}
