//! Lux → discrete light level

use serde::Serialize;

/// Upper bounds (inclusive) of levels 0, 1 and 2; anything above is level 3
const THRESHOLDS: [f64; 3] = [10.0, 200.0, 2000.0];

/// Coarse light level shown by the UI
///
/// Derived from the latest lux reading only; there is no hysteresis, so a
/// reading that hovers on a boundary moves the level every sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LightLevel {
    #[default]
    Dark = 0,
    Dim = 1,
    Bright = 2,
    Sunny = 3,
}

impl LightLevel {
    /// Map raw lux onto a level. Boundary values belong to the lower level.
    pub fn from_lux(lux: f64) -> Self {
        if lux <= THRESHOLDS[0] {
            LightLevel::Dark
        } else if lux <= THRESHOLDS[1] {
            LightLevel::Dim
        } else if lux <= THRESHOLDS[2] {
            LightLevel::Bright
        } else {
            LightLevel::Sunny
        }
    }

    /// Numeric level in `0..=3`
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
