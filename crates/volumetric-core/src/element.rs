//! Numeric voxel element kinds.
//!
//! Every sample type a volume can hold implements [`VoxelElement`]. The trait
//! carries the per-type constants (format name, range, signedness) that the
//! rest of the crate needs, so buffers, statistics and texture staging are
//! written once and instantiated for all ten element kinds.

use std::fmt;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use crate::buffer::VoxelBuffer;
use crate::error::{Result, VolumeError};
use crate::ram::VolumeRam;

/// The ten supported element formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFormat {
    #[serde(rename = "uint8")]
    UInt8,
    Int8,
    #[serde(rename = "uint16")]
    UInt16,
    Int16,
    #[serde(rename = "uint32")]
    UInt32,
    Int32,
    #[serde(rename = "uint64")]
    UInt64,
    Int64,
    Float,
    Double,
}

impl ElementFormat {
    /// All formats, unsigned before signed within each width.
    pub const ALL: [ElementFormat; 10] = [
        ElementFormat::UInt8,
        ElementFormat::Int8,
        ElementFormat::UInt16,
        ElementFormat::Int16,
        ElementFormat::UInt32,
        ElementFormat::Int32,
        ElementFormat::UInt64,
        ElementFormat::Int64,
        ElementFormat::Float,
        ElementFormat::Double,
    ];

    /// Returns the canonical format name (e.g. "uint8", "float").
    pub fn name(self) -> &'static str {
        match self {
            ElementFormat::UInt8 => "uint8",
            ElementFormat::Int8 => "int8",
            ElementFormat::UInt16 => "uint16",
            ElementFormat::Int16 => "int16",
            ElementFormat::UInt32 => "uint32",
            ElementFormat::Int32 => "int32",
            ElementFormat::UInt64 => "uint64",
            ElementFormat::Int64 => "int64",
            ElementFormat::Float => "float",
            ElementFormat::Double => "double",
        }
    }

    /// Parses a format name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| VolumeError::UnknownFormat(name.to_string()))
    }

    /// Base type of the format. Scalar formats are their own base type.
    pub fn base_type(self) -> &'static str {
        self.name()
    }

    /// Size of one element in bytes.
    pub fn bytes_per_voxel(self) -> usize {
        match self {
            ElementFormat::UInt8 | ElementFormat::Int8 => 1,
            ElementFormat::UInt16 | ElementFormat::Int16 => 2,
            ElementFormat::UInt32 | ElementFormat::Int32 | ElementFormat::Float => 4,
            ElementFormat::UInt64 | ElementFormat::Int64 | ElementFormat::Double => 8,
        }
    }

    /// Whether the element type can hold negative values.
    pub fn is_signed(self) -> bool {
        !matches!(
            self,
            ElementFormat::UInt8
                | ElementFormat::UInt16
                | ElementFormat::UInt32
                | ElementFormat::UInt64
        )
    }

    /// Whether the element type is an integer type.
    pub fn is_integer(self) -> bool {
        !matches!(self, ElementFormat::Float | ElementFormat::Double)
    }
}

impl fmt::Display for ElementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a raw voxel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the running host.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// A numeric sample type storable in a [`VoxelBuffer`].
pub trait VoxelElement: Pod + PartialOrd + Default + fmt::Debug {
    /// Format tag of this element type.
    const FORMAT: ElementFormat;
    const IS_SIGNED: bool;
    const IS_INTEGER: bool;
    const ZERO: Self;
    /// Lowest representable value.
    const RANGE_MIN: Self;
    /// Highest representable value.
    const RANGE_MAX: Self;

    fn to_f32(self) -> f32;

    fn to_f64(self) -> f64;

    /// Reverses the byte order of the value.
    #[must_use]
    fn swap_bytes(self) -> Self;

    /// Maps the raw value into `[0, 1]` (unsigned) or `[-1, 1]` (signed).
    ///
    /// Signed integers divide positive values by the type maximum and
    /// negative values by the negated type minimum, so both ends reach
    /// exactly ±1 and zero stays at zero. Floating-point values pass through.
    #[allow(clippy::cast_possible_truncation)]
    fn normalized(self) -> f32 {
        if !Self::IS_INTEGER {
            return self.to_f32();
        }
        let value = self.to_f64();
        if Self::IS_SIGNED && value < 0.0 {
            (value / -Self::RANGE_MIN.to_f64()) as f32
        } else {
            (value / Self::RANGE_MAX.to_f64()) as f32
        }
    }

    /// Wraps a typed buffer into the type-erased RAM representation.
    fn into_ram(buffer: VoxelBuffer<Self>) -> VolumeRam;

    /// Returns the typed buffer if `ram` holds this element type.
    fn buffer_ref(ram: &VolumeRam) -> Option<&VoxelBuffer<Self>>;

    /// Mutable variant of [`VoxelElement::buffer_ref`].
    fn buffer_mut(ram: &mut VolumeRam) -> Option<&mut VoxelBuffer<Self>>;
}

macro_rules! impl_ram_access {
    ($variant:ident) => {
        fn into_ram(buffer: VoxelBuffer<Self>) -> VolumeRam {
            VolumeRam::$variant(buffer)
        }

        fn buffer_ref(ram: &VolumeRam) -> Option<&VoxelBuffer<Self>> {
            match ram {
                VolumeRam::$variant(buffer) => Some(buffer),
                _ => None,
            }
        }

        fn buffer_mut(ram: &mut VolumeRam) -> Option<&mut VoxelBuffer<Self>> {
            match ram {
                VolumeRam::$variant(buffer) => Some(buffer),
                _ => None,
            }
        }
    };
}

macro_rules! impl_integer_element {
    ($t:ty, $variant:ident, $signed:expr) => {
        impl VoxelElement for $t {
            const FORMAT: ElementFormat = ElementFormat::$variant;
            const IS_SIGNED: bool = $signed;
            const IS_INTEGER: bool = true;
            const ZERO: Self = 0;
            const RANGE_MIN: Self = <$t>::MIN;
            const RANGE_MAX: Self = <$t>::MAX;

            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn to_f32(self) -> f32 {
                self as f32
            }

            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn swap_bytes(self) -> Self {
                <$t>::swap_bytes(self)
            }

            impl_ram_access!($variant);
        }
    };
}

macro_rules! impl_float_element {
    ($t:ty, $variant:ident) => {
        impl VoxelElement for $t {
            const FORMAT: ElementFormat = ElementFormat::$variant;
            const IS_SIGNED: bool = true;
            const IS_INTEGER: bool = false;
            const ZERO: Self = 0.0;
            const RANGE_MIN: Self = <$t>::MIN;
            const RANGE_MAX: Self = <$t>::MAX;

            #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
            fn to_f32(self) -> f32 {
                self as f32
            }

            #[allow(clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn swap_bytes(self) -> Self {
                <$t>::from_bits(self.to_bits().swap_bytes())
            }

            impl_ram_access!($variant);
        }
    };
}

impl_integer_element!(u8, UInt8, false);
impl_integer_element!(i8, Int8, true);
impl_integer_element!(u16, UInt16, false);
impl_integer_element!(i16, Int16, true);
impl_integer_element!(u32, UInt32, false);
impl_integer_element!(i32, Int32, true);
impl_integer_element!(u64, UInt64, false);
impl_integer_element!(i64, Int64, true);
impl_float_element!(f32, Float);
impl_float_element!(f64, Double);
