//! The type-erased RAM representation.
//!
//! [`VolumeRam`] holds one [`VoxelBuffer`] of any supported element type and
//! exposes the element-agnostic part of its API. Loaders that learn the
//! sample format at runtime create one through [`VolumeRam::create`] or
//! [`VolumeRam::from_bytes`].

use std::any::Any;

use glam::{UVec3, Vec2, Vec3};

use crate::buffer::VoxelBuffer;
use crate::element::{ByteOrder, ElementFormat, VoxelElement};
use crate::error::{Result, VolumeError};
use crate::representation::VolumeRepresentation;

/// A voxel buffer of any supported element type.
#[derive(Debug, Clone)]
pub enum VolumeRam {
    UInt8(VoxelBuffer<u8>),
    Int8(VoxelBuffer<i8>),
    UInt16(VoxelBuffer<u16>),
    Int16(VoxelBuffer<i16>),
    UInt32(VoxelBuffer<u32>),
    Int32(VoxelBuffer<i32>),
    UInt64(VoxelBuffer<u64>),
    Int64(VoxelBuffer<i64>),
    Float(VoxelBuffer<f32>),
    Double(VoxelBuffer<f64>),
}

macro_rules! dispatch {
    ($ram:expr, $buffer:ident => $body:expr) => {
        match $ram {
            VolumeRam::UInt8($buffer) => $body,
            VolumeRam::Int8($buffer) => $body,
            VolumeRam::UInt16($buffer) => $body,
            VolumeRam::Int16($buffer) => $body,
            VolumeRam::UInt32($buffer) => $body,
            VolumeRam::Int32($buffer) => $body,
            VolumeRam::UInt64($buffer) => $body,
            VolumeRam::Int64($buffer) => $body,
            VolumeRam::Float($buffer) => $body,
            VolumeRam::Double($buffer) => $body,
        }
    };
}

/// Runs `$body` with `$t` bound to the element type of `$format`.
macro_rules! with_element_type {
    ($format:expr, $t:ident => $body:expr) => {
        match $format {
            ElementFormat::UInt8 => {
                type $t = u8;
                $body
            }
            ElementFormat::Int8 => {
                type $t = i8;
                $body
            }
            ElementFormat::UInt16 => {
                type $t = u16;
                $body
            }
            ElementFormat::Int16 => {
                type $t = i16;
                $body
            }
            ElementFormat::UInt32 => {
                type $t = u32;
                $body
            }
            ElementFormat::Int32 => {
                type $t = i32;
                $body
            }
            ElementFormat::UInt64 => {
                type $t = u64;
                $body
            }
            ElementFormat::Int64 => {
                type $t = i64;
                $body
            }
            ElementFormat::Float => {
                type $t = f32;
                $body
            }
            ElementFormat::Double => {
                type $t = f64;
                $body
            }
        }
    };
}

impl VolumeRam {
    /// Allocates a zero-filled buffer of the given format.
    pub fn create(format: ElementFormat, dimensions: UVec3) -> Result<Self> {
        with_element_type!(format, T => VoxelBuffer::<T>::new(dimensions).map(T::into_ram))
    }

    /// Allocates a zero-filled buffer for a format given by name
    /// ("uint8", "int16", "float", ...).
    pub fn create_named(format: &str, dimensions: UVec3) -> Result<Self> {
        Self::create(ElementFormat::from_name(format)?, dimensions)
    }

    /// Decodes a raw sample payload stored in `order`.
    ///
    /// `bytes` must hold exactly `dimensions` voxels of `format`. Samples are
    /// byte-swapped when `order` differs from the host byte order.
    pub fn from_bytes(
        format: ElementFormat,
        dimensions: UVec3,
        bytes: &[u8],
        order: ByteOrder,
    ) -> Result<Self> {
        with_element_type!(format, T => decode::<T>(dimensions, bytes, order).map(T::into_ram))
    }

    /// Returns the element format.
    pub fn format(&self) -> ElementFormat {
        dispatch!(self, b => b.format())
    }

    /// Returns the typed buffer if it holds elements of type `T`.
    pub fn as_buffer<T: VoxelElement>(&self) -> Option<&VoxelBuffer<T>> {
        T::buffer_ref(self)
    }

    /// Mutable variant of [`VolumeRam::as_buffer`].
    pub fn as_buffer_mut<T: VoxelElement>(&mut self) -> Option<&mut VoxelBuffer<T>> {
        T::buffer_mut(self)
    }

    pub fn is_signed(&self) -> bool {
        self.format().is_signed()
    }

    pub fn is_integer(&self) -> bool {
        self.format().is_integer()
    }

    pub fn bits_allocated(&self) -> usize {
        dispatch!(self, b => b.bits_allocated())
    }

    pub fn is_allocated(&self) -> bool {
        dispatch!(self, b => b.is_allocated())
    }

    /// The element type's representable range as floats.
    pub fn element_range(&self) -> Vec2 {
        dispatch!(self, b => b.element_range())
    }

    /// Smallest sample cast to float (cached).
    pub fn min_value(&self) -> f32 {
        dispatch!(self, b => b.min_value())
    }

    /// Largest sample cast to float (cached).
    pub fn max_value(&self) -> f32 {
        dispatch!(self, b => b.max_value())
    }

    pub fn voxel(&self, pos: UVec3) -> f32 {
        dispatch!(self, b => b.voxel(pos))
    }

    pub fn voxel_normalized(&self, pos: UVec3) -> f32 {
        dispatch!(self, b => b.voxel_normalized(pos))
    }

    /// See [`VoxelBuffer::voxel_normalized_linear`].
    pub fn voxel_normalized_linear(&self, pos: Vec3) -> f32 {
        dispatch!(self, b => b.voxel_normalized_linear(pos))
    }

    pub fn swap_endianness(&mut self) {
        dispatch!(self, b => b.swap_endianness());
    }

    pub fn clear(&mut self) {
        dispatch!(self, b => b.clear());
    }

    pub fn invalidate(&self) {
        dispatch!(self, b => b.invalidate());
    }

    /// The samples as raw bytes in host byte order.
    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(self, b => b.as_bytes())
    }

    /// Calls `f` with every sample cast to float, in storage order.
    pub fn for_each_value(&self, mut f: impl FnMut(f32)) {
        dispatch!(self, b => {
            for &value in b.data() {
                f(value.to_f32());
            }
        });
    }
}

fn decode<T: VoxelElement>(dimensions: UVec3, bytes: &[u8], order: ByteOrder) -> Result<VoxelBuffer<T>> {
    let mut buffer = VoxelBuffer::<T>::new(dimensions)?;
    let expected = buffer.num_bytes();
    if bytes.len() != expected {
        return Err(VolumeError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    bytemuck::cast_slice_mut::<T, u8>(buffer.data_mut()).copy_from_slice(bytes);
    if order != ByteOrder::native() {
        buffer.swap_endianness();
    }
    Ok(buffer)
}

impl<T: VoxelElement> From<VoxelBuffer<T>> for VolumeRam {
    fn from(buffer: VoxelBuffer<T>) -> Self {
        T::into_ram(buffer)
    }
}

impl VolumeRepresentation for VolumeRam {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind_name(&self) -> &'static str {
        "ram"
    }

    fn dimensions(&self) -> UVec3 {
        dispatch!(self, b => b.dimensions())
    }

    fn num_voxels(&self) -> usize {
        dispatch!(self, b => b.num_voxels())
    }

    fn bytes_per_voxel(&self) -> usize {
        self.format().bytes_per_voxel()
    }

    fn into_volume_ram(self) -> std::result::Result<VolumeRam, Self> {
        Ok(self)
    }
}
