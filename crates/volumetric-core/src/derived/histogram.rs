//! Intensity histograms.

use serde::{Deserialize, Serialize};

use crate::derived::{DerivedData, VolumeMinMax};
use crate::error::{Result, VolumeError};
use crate::volume::Volume;

/// A fixed-bucket histogram over `[min, max]`.
///
/// Samples below `min` land in the first bucket, samples above `max` in the
/// last. NaN samples are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    min: f32,
    max: f32,
    buckets: Vec<u64>,
    num_samples: u64,
}

impl Histogram1D {
    /// Creates an empty histogram.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is zero.
    pub fn new(min: f32, max: f32, num_buckets: usize) -> Self {
        assert!(num_buckets > 0, "a histogram needs at least one bucket");
        debug_assert!(min <= max, "histogram range [{min}, {max}] is inverted");
        Self {
            min,
            max,
            buckets: vec![0; num_buckets],
            num_samples: 0,
        }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Number of samples counted so far.
    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Bucket index for `value`: `floor(count * (value - min) / (max - min))`
    /// clamped to the valid range. A degenerate range maps everything to 0.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn bucket_of(&self, value: f32) -> usize {
        let last = self.buckets.len() - 1;
        if value <= self.min || self.max <= self.min {
            return 0;
        }
        if value >= self.max {
            return last;
        }
        let t = f64::from(value - self.min) / f64::from(self.max - self.min);
        ((self.buckets.len() as f64 * t) as usize).min(last)
    }

    /// Counts one sample.
    pub fn add_sample(&mut self, value: f32) {
        if value.is_nan() {
            return;
        }
        let bucket = self.bucket_of(value);
        self.increase_bucket(bucket, 1);
    }

    /// Adds `count` samples to bucket `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` is out of range.
    pub fn increase_bucket(&mut self, b: usize, count: u64) {
        self.buckets[b] += count;
        self.num_samples += count;
    }

    /// Samples counted in bucket `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` is out of range.
    pub fn bucket(&self, b: usize) -> u64 {
        self.buckets[b]
    }

    /// Largest bucket count.
    pub fn max_bucket(&self) -> u64 {
        self.buckets.iter().copied().max().unwrap_or(0)
    }

    /// Bucket count divided by the largest bucket count (0 when empty).
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized(&self, b: usize) -> f32 {
        let max = self.max_bucket();
        if max == 0 {
            return 0.0;
        }
        self.bucket(b) as f32 / max as f32
    }

    /// `ln(1 + count) / ln(1 + max count)` (0 when empty).
    #[allow(clippy::cast_precision_loss)]
    pub fn log_normalized(&self, b: usize) -> f32 {
        let max = self.max_bucket();
        if max == 0 {
            return 0.0;
        }
        ((1 + self.bucket(b)) as f32).ln() / ((1 + max) as f32).ln()
    }
}

/// Intensity histogram of a volume's raw samples over its min/max range.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeHistogramIntensity {
    histogram: Histogram1D,
}

impl VolumeHistogramIntensity {
    pub fn new(histogram: Histogram1D) -> Self {
        Self { histogram }
    }

    pub fn histogram(&self) -> &Histogram1D {
        &self.histogram
    }

    pub fn num_buckets(&self) -> usize {
        self.histogram.num_buckets()
    }

    /// Count of bucket `b`.
    pub fn value(&self, b: usize) -> u64 {
        self.histogram.bucket(b)
    }

    /// Count of the bucket at fractional position `t` in `[0, 1]`.
    pub fn value_at(&self, t: f32) -> u64 {
        self.value(self.bucket_at(t))
    }

    pub fn normalized(&self, b: usize) -> f32 {
        self.histogram.normalized(b)
    }

    pub fn normalized_at(&self, t: f32) -> f32 {
        self.normalized(self.bucket_at(t))
    }

    pub fn log_normalized(&self, b: usize) -> f32 {
        self.histogram.log_normalized(b)
    }

    pub fn log_normalized_at(&self, t: f32) -> f32 {
        self.log_normalized(self.bucket_at(t))
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn bucket_at(&self, t: f32) -> usize {
        let last = self.num_buckets() - 1;
        ((t.clamp(0.0, 1.0) * last as f32).floor() as usize).min(last)
    }
}

impl DerivedData for VolumeHistogramIntensity {
    const NAME: &'static str = "intensity histogram";

    fn create_from(volume: &mut Volume) -> Result<Self> {
        let num_buckets = volume.options().histogram_buckets;
        if num_buckets == 0 {
            return Err(VolumeError::DerivedDataUnavailable(Self::NAME));
        }
        let stats = volume.derived_data::<VolumeMinMax>()?;
        let mut histogram = Histogram1D::new(stats.min, stats.max, num_buckets);
        volume.ram()?.for_each_value(|v| histogram.add_sample(v));
        Ok(Self::new(histogram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::VoxelBuffer;
    use crate::options::Options;
    use glam::{UVec3, Vec3};
    use std::rc::Rc;

    #[test]
    fn test_bucket_mapping() {
        let h = Histogram1D::new(0.0, 100.0, 10);
        assert_eq!(h.bucket_of(0.0), 0);
        assert_eq!(h.bucket_of(9.99), 0);
        assert_eq!(h.bucket_of(10.0), 1);
        assert_eq!(h.bucket_of(55.0), 5);
        assert_eq!(h.bucket_of(100.0), 9);
        assert_eq!(h.bucket_of(-5.0), 0);
        assert_eq!(h.bucket_of(1e9), 9);
    }

    #[test]
    fn test_degenerate_range() {
        let mut h = Histogram1D::new(3.0, 3.0, 4);
        h.add_sample(3.0);
        h.add_sample(3.0);
        assert_eq!(h.bucket(0), 2);
        assert_eq!(h.num_samples(), 2);
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut h = Histogram1D::new(0.0, 1.0, 4);
        h.add_sample(f32::NAN);
        assert_eq!(h.num_samples(), 0);
    }

    #[test]
    fn test_normalization() {
        let mut h = Histogram1D::new(0.0, 4.0, 4);
        assert_eq!(h.normalized(0), 0.0);
        assert_eq!(h.log_normalized(0), 0.0);
        h.increase_bucket(1, 3);
        h.add_sample(0.5);
        assert_eq!(h.max_bucket(), 3);
        assert_eq!(h.normalized(1), 1.0);
        assert!((h.normalized(0) - 1.0 / 3.0).abs() < 1e-6);
        assert!((h.log_normalized(0) - 2f32.ln() / 4f32.ln()).abs() < 1e-6);
        assert_eq!(h.log_normalized(2), 0.0);
    }

    #[test]
    fn test_volume_histogram() {
        let buffer =
            VoxelBuffer::from_vec(vec![0u8, 50, 100, 150, 200, 250, 255, 10], UVec3::splat(2))
                .unwrap();
        let mut volume = Volume::from_buffer(buffer, Vec3::ONE, Vec3::ZERO);
        let histogram = volume.derived_data::<VolumeHistogramIntensity>().unwrap();

        assert_eq!(histogram.num_buckets(), 256);
        assert_eq!(histogram.histogram().num_samples(), 8);
        assert_eq!(histogram.histogram().min(), 0.0);
        assert_eq!(histogram.histogram().max(), 255.0);
        assert_eq!(histogram.value(0), 1);
        assert_eq!(histogram.value(255), 1);
        assert_eq!(histogram.value(50), 1);
        assert_eq!(histogram.value_at(1.0), 1);
        assert_eq!(histogram.normalized_at(0.0), 1.0);
        assert_eq!(histogram.log_normalized_at(0.5), 0.0);

        // the statistics entry was created along the way
        assert!(volume.has_derived_data::<VolumeMinMax>().is_some());
        let again = volume.derived_data::<VolumeHistogramIntensity>().unwrap();
        assert!(Rc::ptr_eq(&histogram, &again));
    }

    #[test]
    fn test_bucket_count_from_options() {
        let buffer = VoxelBuffer::from_vec(vec![0.0f32, 0.5, 1.0, 1.0], UVec3::new(4, 1, 1)).unwrap();
        let mut volume = Volume::from_buffer(buffer, Vec3::ONE, Vec3::ZERO)
            .with_options(Options::new().with_histogram_buckets(2));
        let histogram = volume.derived_data::<VolumeHistogramIntensity>().unwrap();
        assert_eq!(histogram.histogram().buckets(), &[1, 3]);
    }

    #[test]
    fn test_zero_buckets_unavailable() {
        let buffer = VoxelBuffer::from_vec(vec![1u16], UVec3::ONE).unwrap();
        let mut volume = Volume::from_buffer(buffer, Vec3::ONE, Vec3::ZERO)
            .with_options(Options::new().with_histogram_buckets(0));
        assert!(volume.derived_data::<VolumeHistogramIntensity>().is_err());
        assert_eq!(volume.num_derived_data(), 0);
    }
}
