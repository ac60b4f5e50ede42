//! Typed voxel storage.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::mem::size_of;

use glam::{UVec3, Vec2, Vec3};

use crate::element::{ElementFormat, VoxelElement};
use crate::error::{Result, VolumeError};
use crate::ram::VolumeRam;
use crate::representation::{voxel_count, VolumeRepresentation};

/// A contiguous grid of samples of one numeric type.
///
/// Samples are stored x-fastest: the voxel at `(x, y, z)` lives at index
/// `(z * dim.y + y) * dim.x + x`. The minimum and maximum sample are computed
/// lazily in a single scan and cached until the data is mutated through
/// [`VoxelBuffer::data_mut`], [`VoxelBuffer::set_voxel`],
/// [`VoxelBuffer::clear`] or [`VoxelBuffer::swap_endianness`].
#[derive(Clone)]
pub struct VoxelBuffer<T: VoxelElement> {
    dimensions: UVec3,
    num_voxels: usize,
    data: Vec<T>,
    min_max: Cell<Option<(T, T)>>,
}

impl<T: VoxelElement> VoxelBuffer<T> {
    /// Allocates a zero-filled buffer for `dimensions`.
    ///
    /// Fails with [`VolumeError::AllocationFailed`] if the voxel count
    /// overflows or memory cannot be reserved. There is no retry; callers may
    /// try again with smaller dimensions.
    pub fn new(dimensions: UVec3) -> Result<Self> {
        let mut buffer = Self::unallocated(dimensions)?;
        let mut data = Vec::new();
        if data.try_reserve_exact(buffer.num_voxels).is_err() {
            return Err(buffer.allocation_error());
        }
        data.resize(buffer.num_voxels, T::ZERO);
        buffer.data = data;
        Ok(buffer)
    }

    /// Creates a buffer without storage. Adopt data later with
    /// [`VoxelBuffer::set_data`].
    pub fn unallocated(dimensions: UVec3) -> Result<Self> {
        let num_voxels = voxel_count(dimensions).ok_or(VolumeError::AllocationFailed {
            voxels: usize::MAX,
            bytes: usize::MAX,
        })?;
        Ok(Self {
            dimensions,
            num_voxels,
            data: Vec::new(),
            min_max: Cell::new(None),
        })
    }

    /// Adopts existing storage. `data` must hold exactly one sample per voxel.
    pub fn from_vec(data: Vec<T>, dimensions: UVec3) -> Result<Self> {
        let mut buffer = Self::unallocated(dimensions)?;
        buffer.set_data(data)?;
        Ok(buffer)
    }

    /// Replaces the storage of this buffer.
    pub fn set_data(&mut self, data: Vec<T>) -> Result<()> {
        if data.len() != self.num_voxels {
            return Err(VolumeError::SizeMismatch {
                expected: self.num_voxels,
                actual: data.len(),
            });
        }
        self.data = data;
        self.invalidate();
        Ok(())
    }

    fn allocation_error(&self) -> VolumeError {
        VolumeError::AllocationFailed {
            voxels: self.num_voxels,
            bytes: self.num_voxels.saturating_mul(size_of::<T>()),
        }
    }

    /// Whether storage is present.
    pub fn is_allocated(&self) -> bool {
        self.data.len() == self.num_voxels
    }

    /// Returns the element format of this buffer.
    pub fn format(&self) -> ElementFormat {
        T::FORMAT
    }

    pub fn is_signed(&self) -> bool {
        T::IS_SIGNED
    }

    pub fn is_integer(&self) -> bool {
        T::IS_INTEGER
    }

    /// Bits allocated per voxel.
    pub fn bits_allocated(&self) -> usize {
        size_of::<T>() * 8
    }

    /// The type's lowest and highest representable values as floats.
    pub fn element_range(&self) -> Vec2 {
        Vec2::new(T::RANGE_MIN.to_f32(), T::RANGE_MAX.to_f32())
    }

    /// Read access to the samples.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Write access to the samples. Invalidates the cached min/max.
    pub fn data_mut(&mut self) -> &mut [T] {
        self.invalidate();
        &mut self.data
    }

    /// Consumes the buffer and returns its storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The samples as raw bytes in host byte order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Linear index of a voxel position.
    #[inline]
    pub fn linear_index(&self, pos: UVec3) -> usize {
        debug_assert!(
            pos.cmplt(self.dimensions).all(),
            "voxel {pos} outside {}",
            self.dimensions
        );
        let (dx, dy) = (self.dimensions.x as usize, self.dimensions.y as usize);
        (pos.z as usize * dy + pos.y as usize) * dx + pos.x as usize
    }

    /// Returns the raw sample at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if the position lies outside the grid or storage is missing.
    pub fn value(&self, pos: UVec3) -> T {
        let index = self.linear_index(pos);
        assert!(index < self.num_voxels, "voxel index {index} out of range");
        self.data[index]
    }

    /// Writes the sample at `pos`. Invalidates the cached min/max.
    pub fn set_voxel(&mut self, pos: UVec3, value: T) {
        let index = self.linear_index(pos);
        assert!(index < self.num_voxels, "voxel index {index} out of range");
        self.data[index] = value;
        self.invalidate();
    }

    /// Returns the raw sample at `pos` cast to float.
    pub fn voxel(&self, pos: UVec3) -> f32 {
        self.value(pos).to_f32()
    }

    /// Returns the sample at `pos` normalized by the type range.
    pub fn voxel_normalized(&self, pos: UVec3) -> f32 {
        self.value(pos).normalized()
    }

    /// Trilinearly interpolated normalized sample at a fractional position.
    ///
    /// Coordinates outside `[0, dim - 1]` are clamped to the nearest valid
    /// voxel before interpolation, so integer positions inside the grid return
    /// exactly [`VoxelBuffer::voxel_normalized`].
    pub fn voxel_normalized_linear(&self, pos: Vec3) -> f32 {
        let upper = self.dimensions.max(UVec3::ONE) - UVec3::ONE;
        let p = pos.clamp(Vec3::ZERO, upper.as_vec3());
        let lower = p.floor();
        let t = p - lower;
        let lo = lower.as_uvec3().min(upper);
        let hi = p.ceil().as_uvec3().min(upper);

        let sample = |x: u32, y: u32, z: u32| self.voxel_normalized(UVec3::new(x, y, z));

        sample(lo.x, lo.y, lo.z) * (1.0 - t.x) * (1.0 - t.y) * (1.0 - t.z)
            + sample(hi.x, lo.y, lo.z) * t.x * (1.0 - t.y) * (1.0 - t.z)
            + sample(hi.x, hi.y, lo.z) * t.x * t.y * (1.0 - t.z)
            + sample(lo.x, hi.y, lo.z) * (1.0 - t.x) * t.y * (1.0 - t.z)
            + sample(lo.x, lo.y, hi.z) * (1.0 - t.x) * (1.0 - t.y) * t.z
            + sample(hi.x, lo.y, hi.z) * t.x * (1.0 - t.y) * t.z
            + sample(hi.x, hi.y, hi.z) * t.x * t.y * t.z
            + sample(lo.x, hi.y, hi.z) * (1.0 - t.x) * t.y * t.z
    }

    /// Smallest sample in the buffer.
    pub fn min(&self) -> T {
        self.min_max().0
    }

    /// Largest sample in the buffer.
    pub fn max(&self) -> T {
        self.min_max().1
    }

    /// Smallest sample cast to float.
    pub fn min_value(&self) -> f32 {
        self.min().to_f32()
    }

    /// Largest sample cast to float.
    pub fn max_value(&self) -> f32 {
        self.max().to_f32()
    }

    fn min_max(&self) -> (T, T) {
        if let Some(cached) = self.min_max.get() {
            return cached;
        }
        let computed = scan_min_max(&self.data);
        self.min_max.set(Some(computed));
        computed
    }

    /// Whether the min/max cache currently holds a value.
    pub fn is_min_max_cached(&self) -> bool {
        self.min_max.get().is_some()
    }

    /// Drops the cached min/max so the next query rescans.
    pub fn invalidate(&self) {
        self.min_max.set(None);
    }

    /// Reverses the byte order of every sample in place.
    pub fn swap_endianness(&mut self) {
        for value in &mut self.data {
            *value = value.swap_bytes();
        }
        self.invalidate();
    }

    /// Sets every sample to zero.
    pub fn clear(&mut self) {
        self.data.fill(T::ZERO);
        self.invalidate();
    }
}

/// One pass computing both extremes. NaN samples are skipped; an empty or
/// all-NaN slice yields `(ZERO, ZERO)`.
fn scan_min_max<T: VoxelElement>(data: &[T]) -> (T, T) {
    let mut iter = data.iter().copied().filter(|v| v.partial_cmp(v).is_some());
    let Some(first) = iter.next() else {
        return (T::ZERO, T::ZERO);
    };
    iter.fold((first, first), |(lo, hi), v| {
        (if v < lo { v } else { lo }, if v > hi { v } else { hi })
    })
}

impl<T: VoxelElement> VolumeRepresentation for VoxelBuffer<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind_name(&self) -> &'static str {
        "voxel-buffer"
    }

    fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    fn num_voxels(&self) -> usize {
        self.num_voxels
    }

    fn bytes_per_voxel(&self) -> usize {
        size_of::<T>()
    }

    fn into_volume_ram(self) -> std::result::Result<VolumeRam, Self> {
        Ok(T::into_ram(self))
    }
}

impl<T: VoxelElement> fmt::Debug for VoxelBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelBuffer")
            .field("format", &T::FORMAT)
            .field("dimensions", &self.dimensions)
            .field("allocated", &self.is_allocated())
            .field("min_max", &self.min_max.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario_u8() -> VoxelBuffer<u8> {
        VoxelBuffer::from_vec(vec![0, 50, 100, 150, 200, 250, 255, 10], UVec3::splat(2)).unwrap()
    }

    #[test]
    fn test_scenario_min_max() {
        let buffer = scenario_u8();
        assert_eq!(buffer.min(), 0);
        assert_eq!(buffer.max(), 255);
        // the 255 sample sits at index 6 = (0, 1, 1)
        assert!((buffer.voxel_normalized(UVec3::new(0, 1, 1)) - 1.0).abs() < 1e-6);
        assert_eq!(buffer.voxel(UVec3::new(1, 0, 0)), 50.0);
    }

    #[test]
    fn test_new_is_zero_filled() {
        let buffer = VoxelBuffer::<i16>::new(UVec3::new(3, 2, 2)).unwrap();
        assert!(buffer.is_allocated());
        assert_eq!(buffer.num_voxels(), 12);
        assert!(buffer.data().iter().all(|&v| v == 0));
        assert_eq!(buffer.num_bytes(), 24);
    }

    #[test]
    fn test_unallocated_then_adopt() {
        let mut buffer = VoxelBuffer::<f32>::unallocated(UVec3::new(2, 1, 1)).unwrap();
        assert!(!buffer.is_allocated());
        assert!(matches!(
            buffer.set_data(vec![1.0]),
            Err(VolumeError::SizeMismatch { expected: 2, actual: 1 })
        ));
        buffer.set_data(vec![1.0, -2.0]).unwrap();
        assert!(buffer.is_allocated());
        assert_eq!(buffer.min(), -2.0);
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = VoxelBuffer::<u16>::from_vec(vec![1, 2, 3], UVec3::splat(2));
        assert!(matches!(result, Err(VolumeError::SizeMismatch { .. })));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_allocation_failure() {
        let result = VoxelBuffer::<u64>::new(UVec3::splat(u32::MAX));
        assert!(matches!(result, Err(VolumeError::AllocationFailed { .. })));
    }

    #[test]
    fn test_min_max_cache_invalidation() {
        let mut buffer = scenario_u8();
        assert!(!buffer.is_min_max_cached());
        assert_eq!(buffer.max(), 255);
        assert!(buffer.is_min_max_cached());

        buffer.set_voxel(UVec3::new(0, 1, 1), 3);
        assert!(!buffer.is_min_max_cached());
        assert_eq!(buffer.max(), 250);

        buffer.data_mut()[0] = 7;
        assert_eq!(buffer.min(), 3);
    }

    #[test]
    fn test_clear_resets_min_max() {
        let mut buffer = scenario_u8();
        let _ = buffer.max();
        buffer.clear();
        assert_eq!(buffer.min(), 0);
        assert_eq!(buffer.max(), 0);

        let mut signed = VoxelBuffer::from_vec(vec![-5i32, 9], UVec3::new(2, 1, 1)).unwrap();
        signed.clear();
        assert_eq!(signed.min(), 0);
        assert_eq!(signed.max(), 0);

        let mut float = VoxelBuffer::from_vec(vec![-1.5f64, 2.5], UVec3::new(1, 2, 1)).unwrap();
        float.clear();
        assert_eq!(float.min(), 0.0);
        assert_eq!(float.max(), 0.0);
    }

    #[test]
    fn test_min_max_skips_nan() {
        let buffer =
            VoxelBuffer::from_vec(vec![f32::NAN, 2.0, -1.0, f32::NAN], UVec3::new(4, 1, 1))
                .unwrap();
        assert_eq!(buffer.min(), -1.0);
        assert_eq!(buffer.max(), 2.0);
    }

    #[test]
    fn test_swap_endianness_twice_restores() {
        let original = vec![0x0102u16, 0xA0B0, 0, 0xFFFF];
        let mut buffer = VoxelBuffer::from_vec(original.clone(), UVec3::new(2, 2, 1)).unwrap();
        buffer.swap_endianness();
        assert_eq!(buffer.data()[0], 0x0201);
        buffer.swap_endianness();
        assert_eq!(buffer.data(), original.as_slice());
    }

    #[test]
    fn test_signed_normalization() {
        let buffer =
            VoxelBuffer::from_vec(vec![i8::MIN, 0, i8::MAX, -64], UVec3::new(4, 1, 1)).unwrap();
        assert_eq!(buffer.voxel_normalized(UVec3::new(0, 0, 0)), -1.0);
        assert_eq!(buffer.voxel_normalized(UVec3::new(1, 0, 0)), 0.0);
        assert_eq!(buffer.voxel_normalized(UVec3::new(2, 0, 0)), 1.0);
        assert!((buffer.voxel_normalized(UVec3::new(3, 0, 0)) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_linear_matches_nearest_at_integers() {
        let buffer = scenario_u8();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    let pos = UVec3::new(x, y, z);
                    let linear = buffer.voxel_normalized_linear(pos.as_vec3());
                    assert!((linear - buffer.voxel_normalized(pos)).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_linear_interpolates_and_clamps() {
        let buffer = VoxelBuffer::from_vec(vec![0.0f32, 1.0], UVec3::new(2, 1, 1)).unwrap();
        assert!((buffer.voxel_normalized_linear(Vec3::new(0.25, 0.0, 0.0)) - 0.25).abs() < 1e-6);
        assert!((buffer.voxel_normalized_linear(Vec3::new(-3.0, 0.0, 0.0))).abs() < 1e-6);
        assert!((buffer.voxel_normalized_linear(Vec3::new(9.0, 4.0, -2.0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_element_range_and_bits() {
        let buffer = VoxelBuffer::<i16>::new(UVec3::ONE).unwrap();
        assert_eq!(buffer.element_range(), Vec2::new(-32768.0, 32767.0));
        assert_eq!(buffer.bits_allocated(), 16);
        assert_eq!(buffer.format(), ElementFormat::Int16);
        assert!(buffer.is_signed());
        assert!(buffer.is_integer());
    }

    #[test]
    fn test_as_bytes_host_order() {
        let buffer = VoxelBuffer::from_vec(vec![1u32], UVec3::ONE).unwrap();
        assert_eq!(buffer.as_bytes(), 1u32.to_ne_bytes().as_slice());
    }

    proptest! {
        #[test]
        fn prop_linear_matches_nearest(
            data in proptest::collection::vec(any::<i16>(), 27),
            x in 0u32..3, y in 0u32..3, z in 0u32..3,
        ) {
            let buffer = VoxelBuffer::from_vec(data, UVec3::splat(3)).unwrap();
            let pos = UVec3::new(x, y, z);
            let linear = buffer.voxel_normalized_linear(pos.as_vec3());
            prop_assert!((linear - buffer.voxel_normalized(pos)).abs() < 1e-5);
        }

        #[test]
        fn prop_swap_endianness_round_trip(data in proptest::collection::vec(any::<i64>(), 8)) {
            let mut buffer = VoxelBuffer::from_vec(data.clone(), UVec3::splat(2)).unwrap();
            buffer.swap_endianness();
            buffer.swap_endianness();
            prop_assert_eq!(buffer.data(), data.as_slice());
        }

        #[test]
        fn prop_min_max_bounds(data in proptest::collection::vec(any::<u16>(), 1..64)) {
            let len = u32::try_from(data.len()).unwrap();
            let buffer = VoxelBuffer::from_vec(data.clone(), UVec3::new(len, 1, 1)).unwrap();
            prop_assert_eq!(buffer.min(), *data.iter().min().unwrap());
            prop_assert_eq!(buffer.max(), *data.iter().max().unwrap());
        }
    }
}
