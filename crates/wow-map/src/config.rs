//! Packing thresholds.

use serde::Deserialize;

/// Tuning of the lossy encodings, read from the `map:` block of the
/// extractor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Clamp heights below `use_min_height`.
    pub allow_height_limit: bool,
    pub use_min_height: f32,
    /// Allow `u8`/`u16` height grids and the flatness shortcuts.
    pub allow_float_to_int: bool,
    pub float_to_byte_limit: f32,
    pub float_to_short_limit: f32,
    pub flat_height_delta_limit: f32,
    pub flat_liquid_delta_limit: f32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            allow_height_limit: true,
            use_min_height: -500.0,
            allow_float_to_int: true,
            float_to_byte_limit: 2.0,
            float_to_short_limit: 2048.0,
            flat_height_delta_limit: 0.005,
            flat_liquid_delta_limit: 0.001,
        }
    }
}

/// Version stamp written into every `.map` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapVersion {
    pub magic: [u8; 4],
    pub build: u32,
}

impl MapVersion {
    pub const CLASSIC: Self = Self {
        magic: *b"z1.5",
        build: 5875,
    };
}

impl Default for MapVersion {
    fn default() -> Self {
        Self::CLASSIC
    }
}
