use serde::{Deserialize, Serialize};

use crate::errors::TileError;

/// The physical size, in inches, that the assembled tiles must reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSpec {
    pub width_in: f64,
    pub height_in: f64,
}

impl PhysicalSpec {
    pub fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }
}

/// Pixels-per-inch along each axis.
///
/// The two axes are resolved independently. When the source aspect ratio differs from the
/// requested physical aspect ratio the print is stretched so that it matches the physical size
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ppi {
    pub x: f64,
    pub y: f64,
}

impl Ppi {
    pub fn resolve(
        source_width: u32,
        source_height: u32,
        target: PhysicalSpec,
    ) -> Result<Self, TileError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(target.width_in) || !ok(target.height_in) {
            return Err(TileError::invalid_spec(format!(
                "target size must be positive, got {}x{} in",
                target.width_in, target.height_in
            )));
        }

        Ok(Self {
            x: f64::from(source_width) / target.width_in,
            y: f64::from(source_height) / target.height_in,
        })
    }

    pub fn is_uniform(&self) -> bool {
        (self.x - self.y).abs() < 1e-9
    }
}
