use std::path::Path;

use clap::ValueEnum;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::encode::{FormatTileEncoder, JpegTileEncoder, TileEncoder, DEFAULT_JPEG_QUALITY};
use crate::engine::Tiler;
use crate::errors::TileError;
use crate::grid::OverlapSpec;
use crate::paper::{PaperProfile, DEFAULT_PAPER};
use crate::scale::PhysicalSpec;

pub const DEFAULT_TARGET_WIDTH_IN: f64 = 15.0;
pub const DEFAULT_TARGET_HEIGHT_IN: f64 = 20.0;
pub const DEFAULT_OVERLAP_IN: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

/// Everything needed to run one tiling job. Missing fields in a job file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub target_width_in: f64,
    pub target_height_in: f64,
    /// Catalog name, ignored when both custom paper dimensions are given.
    pub paper: String,
    pub paper_width_in: Option<f64>,
    pub paper_height_in: Option<f64>,
    pub borderless: Option<bool>,
    pub overlap_in: f64,
    pub format: OutputFormat,
    /// JPEG quality, 1-100.
    pub quality: u8,
    pub max_in_flight: Option<usize>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            target_width_in: DEFAULT_TARGET_WIDTH_IN,
            target_height_in: DEFAULT_TARGET_HEIGHT_IN,
            paper: DEFAULT_PAPER.to_string(),
            paper_width_in: None,
            paper_height_in: None,
            borderless: None,
            overlap_in: DEFAULT_OVERLAP_IN,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
            max_in_flight: None,
        }
    }
}

impl JobConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn target(&self) -> PhysicalSpec {
        PhysicalSpec::new(self.target_width_in, self.target_height_in)
    }

    pub fn overlap(&self) -> OverlapSpec {
        OverlapSpec::new(self.overlap_in)
    }

    pub fn paper_profile(&self) -> Result<PaperProfile, TileError> {
        let profile = match (self.paper_width_in, self.paper_height_in) {
            (Some(w), Some(h)) => PaperProfile::with_borderless(
                format!("Custom {w}x{h} in"),
                w,
                h,
                self.borderless.unwrap_or(false),
            ),
            (None, None) => {
                let mut profile = PaperProfile::by_name(&self.paper)?;
                if let Some(borderless) = self.borderless {
                    profile.borderless = borderless;
                }
                profile
            }
            _ => {
                return Err(TileError::invalid_spec(
                    "custom paper needs both a width and a height",
                ))
            }
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn encoder(&self) -> Result<Box<dyn TileEncoder>, TileError> {
        match self.format {
            OutputFormat::Jpeg => {
                if !(1..=100).contains(&self.quality) {
                    return Err(TileError::invalid_spec(format!(
                        "JPEG quality must be between 1 and 100, got {}",
                        self.quality
                    )));
                }
                Ok(Box::new(JpegTileEncoder {
                    quality: self.quality,
                }))
            }
            OutputFormat::Png => Ok(Box::new(FormatTileEncoder(ImageFormat::Png))),
        }
    }

    pub fn tiler(&self) -> Result<Tiler, TileError> {
        let tiler = Tiler::new().with_encoder(self.encoder()?);
        Ok(match self.max_in_flight {
            Some(n) => tiler.with_max_in_flight(n),
            None => tiler,
        })
    }
}
