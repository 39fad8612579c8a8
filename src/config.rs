use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::StickerColor;
use crate::pipeline::BoundingBox;

/// Inclusive HSV range for one sticker color (hue on the 0..180 scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HueBand {
    pub color: StickerColor,
    pub hue_min: u8,
    pub hue_max: u8,
    pub min_saturation: u8,
    pub min_value: u8,
}

impl HueBand {
    pub const fn new(color: StickerColor, hue_min: u8, hue_max: u8) -> Self {
        Self {
            color,
            hue_min,
            hue_max,
            min_saturation: 100,
            min_value: 100,
        }
    }

    pub fn contains_hue(&self, hue: u8) -> bool {
        hue >= self.hue_min && hue <= self.hue_max
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.contains_hue(hsv[0]) && hsv[1] >= self.min_saturation && hsv[2] >= self.min_value
    }
}

pub fn default_bands() -> Vec<HueBand> {
    vec![
        HueBand::new(StickerColor::Yellow, 20, 35),
        HueBand::new(StickerColor::Green, 40, 85),
        HueBand::new(StickerColor::Blue, 90, 130),
    ]
}

/// Tunable thresholds for the sticker detector.
///
/// Every field has a default, so a JSON config only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub bands: Vec<HueBand>,
    /// Median filter kernel size applied to the color mask (odd)
    pub median_kernel: u32,
    pub min_region_size: u32,
    /// Regions may span at most `1 / max_region_fraction` of each image dimension
    pub max_region_fraction: u32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_fill_ratio: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter
    pub polygon_epsilon: f64,
    pub circularity_threshold: f64,
    /// Grayscale values at or below this are background when extracting color
    pub background_threshold: u8,
    pub hue_min_saturation: u8,
    pub hue_min_value: u8,
    /// Bounding boxes dropped on exact match
    pub excluded_regions: Vec<BoundingBox>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            median_kernel: 5,
            min_region_size: 25,
            max_region_fraction: 3,
            min_aspect_ratio: 0.7,
            max_aspect_ratio: 1.5,
            min_fill_ratio: 0.5,
            polygon_epsilon: 0.04,
            circularity_threshold: 0.75,
            background_threshold: 40,
            hue_min_saturation: 50,
            hue_min_value: 50,
            excluded_regions: Vec::new(),
        }
    }
}

impl DetectorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_excluded_regions(mut self, regions: impl IntoIterator<Item = BoundingBox>) -> Self {
        self.excluded_regions.extend(regions);
        self
    }
}
