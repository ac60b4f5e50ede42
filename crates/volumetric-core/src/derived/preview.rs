//! Grayscale thumbnail of a volume's middle slice.

use std::io::Cursor;

use glam::Vec3;
use image::{GrayImage, ImageFormat, Luma};

use crate::derived::DerivedData;
use crate::error::{Result, VolumeError};
use crate::volume::Volume;

/// A square 8-bit preview of the middle z-slice, rows top to bottom in y.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePreview {
    size: u32,
    data: Vec<u8>,
}

impl VolumePreview {
    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixels, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.size + x) as usize]
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.size, self.size, |x, y| Luma([self.pixel(x, y)]))
    }

    /// Encodes the preview as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.to_image().write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

impl DerivedData for VolumePreview {
    const NAME: &'static str = "preview";

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn create_from(volume: &mut Volume) -> Result<Self> {
        let size = volume.options().preview_size;
        let gamma = volume.options().preview_gamma;
        if size < 2 {
            return Err(VolumeError::DerivedDataUnavailable(Self::NAME));
        }

        let spacing = volume.spacing();
        let dims = volume.dimensions().as_vec3();
        let ram = volume.ram()?;
        let edge = (size - 1) as f32;

        // Keep the physical aspect ratio: the longer axis spans the whole
        // thumbnail, the shorter one is centered.
        let aspect = (dims.y * spacing.y) / (dims.x * spacing.x);
        let (x_offset, y_offset, x_scale, y_scale) = if aspect <= 1.0 {
            (0.0, edge * (1.0 - aspect) / 2.0, 1.0, 1.0 / aspect)
        } else {
            (edge * (1.0 - 1.0 / aspect) / 2.0, 0.0, aspect, 1.0)
        };

        let z = ((dims.z - 1.0) / 2.0).floor();
        let (x_limit, y_limit) = (dims.x - 1.0 + 1e-3, dims.y - 1.0 + 1e-3);

        let mut samples = Vec::with_capacity((size * size) as usize);
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for y in 0..size {
            for x in 0..size {
                let px = (x as f32 - x_offset) / edge * x_scale * (dims.x - 1.0);
                let py = (y as f32 - y_offset) / edge * y_scale * (dims.y - 1.0);
                let value = if (0.0..=x_limit).contains(&px) && (0.0..=y_limit).contains(&py) {
                    ram.voxel_normalized_linear(Vec3::new(px, py, z))
                } else {
                    0.0
                };
                lo = lo.min(value);
                hi = hi.max(value);
                samples.push(value);
            }
        }

        let range = hi - lo;
        let data = samples
            .into_iter()
            .map(|v| {
                let v = if range > 0.0 {
                    ((v - lo) / range).powf(1.0 / gamma)
                } else {
                    v
                };
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            })
            .collect();

        Ok(Self { size, data })
    }
}
