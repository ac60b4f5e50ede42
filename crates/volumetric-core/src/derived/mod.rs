//! Data derived from a volume on demand.
//!
//! A [`DerivedData`] kind is computed from a [`Volume`] the first time it is
//! requested through [`Volume::derived_data`] and cached on the volume until
//! [`Volume::clear_derived_data`] is called. At most one value of each kind
//! lives on a volume.

mod histogram;
mod minmax;
mod preview;

pub use histogram::{Histogram1D, VolumeHistogramIntensity};
pub use minmax::VolumeMinMax;
pub use preview::VolumePreview;

use std::any::Any;

use crate::error::Result;
use crate::volume::Volume;

/// A cacheable artifact computed from a volume.
pub trait DerivedData: Any + Sized {
    /// Human-readable name of the kind, used in diagnostics.
    const NAME: &'static str;

    /// Computes the artifact.
    ///
    /// Factories may read the volume's representations and request other
    /// derived data (a histogram reads the min/max statistics for its range).
    fn create_from(volume: &mut Volume) -> Result<Self>;
}
