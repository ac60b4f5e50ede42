//! Min/max statistics of a volume.

use crate::derived::DerivedData;
use crate::error::Result;
use crate::volume::Volume;

/// Smallest and largest raw sample, and both after the rescale mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMinMax {
    pub min: f32,
    pub max: f32,
    /// `min` under the volume's rescale mapping.
    pub min_real: f32,
    /// `max` under the volume's rescale mapping.
    pub max_real: f32,
}

impl VolumeMinMax {
    /// Width of the raw value range.
    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

impl DerivedData for VolumeMinMax {
    const NAME: &'static str = "min/max statistics";

    fn create_from(volume: &mut Volume) -> Result<Self> {
        let mapping = volume.rescale_mapping();
        let ram = volume.ram()?;
        let (min, max) = (ram.min_value(), ram.max_value());
        Ok(Self {
            min,
            max,
            min_real: mapping.map(min),
            max_real: mapping.map(max),
        })
    }
}
