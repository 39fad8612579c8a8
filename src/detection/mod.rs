pub mod color;
pub mod contours;
pub mod preprocessing;
pub mod shapes;
pub mod steps;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::models::{Region, StickerDetection};
use crate::pipeline::{Pipeline, PipelineData};
use steps::*;

/// Main sticker detector: color mask → regions → shape → color → exclusions
#[derive(Debug, Clone)]
pub struct StickerDetector {
    pub config: DetectorConfig,
    /// Each `detect` call dumps its step images into `run_NN/` under this directory
    debug_out: Option<PathBuf>,
    /// Shared by clones so runs never reuse a directory
    runs: Arc<AtomicUsize>,
}

impl StickerDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            debug_out: None,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enable debug dumps. The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(DetectError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug_out = Some(output_dir);
        Ok(self)
    }

    /// Run the full detection pipeline on an image
    pub fn detect(&self, img: &DynamicImage) -> Result<Vec<StickerDetection>> {
        let mut pipeline = build_standard_pipeline(&self.config);
        if let Some(dir) = &self.debug_out {
            let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
            pipeline = pipeline.with_debug(dir.join(format!("run_{:02}", run)))?;
        }

        let items = pipeline.run(img.clone())?;
        let detections: Vec<StickerDetection> = items
            .iter()
            .filter_map(to_detection)
            .enumerate()
            .map(|(i, detection)| StickerDetection {
                index: i + 1,
                ..detection
            })
            .collect();

        debug!("Detected {} stickers", detections.len());
        Ok(detections)
    }

    /// Smoothed color mask of an image (for debugging)
    pub fn mask(&self, img: &DynamicImage) -> GrayImage {
        let mask = preprocessing::color_mask(&img.to_rgb8(), &self.config.bands);
        preprocessing::smooth_mask(&mask, self.config.median_kernel)
    }

    /// Candidate regions that pass the size and shape checks (for debugging)
    pub fn regions(&self, img: &DynamicImage) -> Vec<Region> {
        let filter = contours::RegionFilter::from_config(&self.config);
        let regions = contours::find_regions(&self.mask(img));
        contours::filter_regions(&regions, &filter, img.width(), img.height())
    }
}

impl Default for StickerDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Items that made it through every step carry a bbox, shape and color
fn to_detection(item: &PipelineData) -> Option<StickerDetection> {
    Some(StickerDetection {
        index: 0,
        shape: item.get_shape("shape")?,
        color: item.get_color("color")?,
        bbox: item.bbox?,
        representative_rgb: item.get_rgb("representative_rgb").unwrap_or([0, 0, 0]),
    })
}

/// Build the standard sticker pipeline using the composable pipeline system
pub fn build_standard_pipeline(config: &DetectorConfig) -> Pipeline {
    Pipeline::new()
        .add_step(Arc::new(ColorMaskStep::from_config(config)))
        .add_step(Arc::new(RegionExtractionStep::from_config(config)))
        .add_step(Arc::new(ShapeClassificationStep::from_config(config)))
        .add_step(Arc::new(DominantColorStep::from_config(config)))
        .add_step(Arc::new(ExclusionStep::from_config(config)))
}

/// Detect stickers with the default thresholds and no exclusions
pub fn detect_stickers(img: &DynamicImage) -> Result<Vec<StickerDetection>> {
    StickerDetector::default().detect(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn standard_pipeline_has_five_steps() {
        assert_eq!(build_standard_pipeline(&DetectorConfig::default()).len(), 5);
    }

    #[test]
    fn blank_image_has_no_stickers() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 120, Rgb([255, 255, 255])));
        assert!(detect_stickers(&img).unwrap().is_empty());
    }

    #[test]
    fn debug_detector_can_run_repeatedly() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("debug");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 60, Rgb([255, 255, 255])));

        let detector = StickerDetector::default().with_debug(out.clone()).unwrap();
        detector.detect(&img).unwrap();
        detector.clone().detect(&img).unwrap();

        assert!(out.join("run_01/00_input/01.png").exists());
        assert!(out.join("run_02/00_input/01.png").exists());
        assert!(out.join("run_02/01_color_mask/01.png").exists());
    }

    #[test]
    fn debug_dir_is_checked_once_up_front() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("stale.txt"), "x").unwrap();

        let result = StickerDetector::default().with_debug(dir.path().to_path_buf());
        assert!(matches!(result, Err(DetectError::DebugDirNotEmpty(_))));
    }

    #[test]
    fn regions_helper_applies_filters() {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(40, 40), Rgb([200, 200, 43]));
        draw_filled_rect_mut(&mut img, Rect::at(120, 120).of_size(12, 12), Rgb([200, 200, 43]));

        let regions = StickerDetector::default().regions(&DynamicImage::ImageRgb8(img));

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox().x, 20);
    }
}
