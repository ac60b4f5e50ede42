//! Linear value mappings (rescale slope/intercept, pixel transfer).

use serde::{Deserialize, Serialize};

/// A linear mapping `value * scale + offset` with an optional unit label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    pub scale: f32,
    pub offset: f32,
    #[serde(default)]
    pub unit: String,
}

impl Default for ValueMapping {
    fn default() -> Self {
        Self::identity()
    }
}

impl ValueMapping {
    /// Creates a mapping without a unit.
    pub fn new(scale: f32, offset: f32) -> Self {
        Self {
            scale,
            offset,
            unit: String::new(),
        }
    }

    /// The mapping that leaves values unchanged.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0)
    }

    /// Sets the unit label.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Applies the mapping: `value * scale + offset`.
    pub fn map(&self, value: f32) -> f32 {
        value * self.scale + self.offset
    }

    /// Reverts the mapping: `(value - offset) / scale`.
    pub fn unmap(&self, value: f32) -> f32 {
        (value - self.offset) / self.scale
    }

    /// Returns the mapping that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            scale: 1.0 / self.scale,
            offset: -self.offset / self.scale,
            unit: format!("1/{}", self.unit),
        }
    }

    /// Combined mapping applying `first`, then `second`. The unit of `second`
    /// is kept.
    pub fn combine(first: &ValueMapping, second: &ValueMapping) -> Self {
        Self {
            scale: first.scale * second.scale,
            offset: second.scale * first.offset + second.offset,
            unit: second.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_unmap() {
        let hu = ValueMapping::new(1.0, -1024.0).with_unit("HU");
        assert_eq!(hu.map(1024.0), 0.0);
        assert_eq!(hu.unmap(0.0), 1024.0);
        assert_eq!(hu.unit, "HU");
    }

    #[test]
    fn test_inverse() {
        let m = ValueMapping::new(2.0, 4.0).with_unit("mm");
        let inv = m.inverse();
        assert!((inv.map(m.map(3.0)) - 3.0).abs() < 1e-6);
        assert_eq!(inv.unit, "1/mm");
    }

    #[test]
    fn test_combine_applies_first_then_second() {
        let a = ValueMapping::new(2.0, 1.0);
        let b = ValueMapping::new(3.0, -5.0).with_unit("u");
        let c = ValueMapping::combine(&a, &b);
        assert_eq!(c.map(7.0), b.map(a.map(7.0)));
        assert_eq!(c.unit, "u");
    }

    #[test]
    fn test_identity_default() {
        let m = ValueMapping::default();
        assert_eq!(m.map(42.0), 42.0);
    }
}
