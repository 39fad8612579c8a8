use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::config::DetectorConfig;
use crate::models::Region;

/// Find the outermost boundaries of the foreground components of a mask.
///
/// Regions come back in the order the border follower discovers them (raster
/// order of each component's first pixel). Holes and components nested inside
/// holes are skipped.
pub fn find_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| Region::from_points(c.points))
        .collect()
}

/// Why a candidate region was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooSmall,
    TooLarge,
    AspectRatio,
    FillRatio,
}

/// Size and shape plausibility checks for candidate sticker regions
#[derive(Debug, Clone)]
pub struct RegionFilter {
    pub min_size: u32,
    pub max_fraction: u32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_fill_ratio: f64,
}

impl RegionFilter {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            min_size: config.min_region_size,
            max_fraction: config.max_region_fraction.max(1),
            min_aspect_ratio: config.min_aspect_ratio,
            max_aspect_ratio: config.max_aspect_ratio,
            min_fill_ratio: config.min_fill_ratio,
        }
    }

    /// Run the checks in order and stop at the first failure
    pub fn check(&self, region: &Region, img_width: u32, img_height: u32) -> Result<(), Rejection> {
        let (w, h) = (region.width(), region.height());

        if w < self.min_size || h < self.min_size {
            return Err(Rejection::TooSmall);
        }
        if w > img_width / self.max_fraction || h > img_height / self.max_fraction {
            return Err(Rejection::TooLarge);
        }

        let aspect = region.aspect_ratio();
        if aspect < self.min_aspect_ratio || aspect > self.max_aspect_ratio {
            return Err(Rejection::AspectRatio);
        }
        if region.fill_ratio() < self.min_fill_ratio {
            return Err(Rejection::FillRatio);
        }

        Ok(())
    }
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

/// Keep only the regions that pass every check
pub fn filter_regions(regions: &[Region], filter: &RegionFilter, img_width: u32, img_height: u32) -> Vec<Region> {
    regions
        .iter()
        .filter(|r| filter.check(r, img_width, img_height).is_ok())
        .cloned()
        .collect()
}
