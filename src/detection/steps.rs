use crate::config::{DetectorConfig, HueBand};
use crate::detection::color::{self, ColorParams};
use crate::detection::contours::{self, RegionFilter};
use crate::detection::{preprocessing, shapes};
use crate::error::Result;
use crate::pipeline::{BoundingBox, MetadataValue, PipelineContext, PipelineData, PipelineStep};
use image::GenericImageView;
use tracing::{debug, trace};

/// Build the binary marker-color mask of each image
pub struct ColorMaskStep {
    pub bands: Vec<HueBand>,
    pub median_kernel: u32,
}

impl PipelineStep for ColorMaskStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let rgb = item.image.to_rgb8();
            let mask = preprocessing::color_mask(&rgb, &self.bands);
            let mask = preprocessing::smooth_mask(&mask, self.median_kernel);
            result.push(PipelineData {
                image: image::DynamicImage::ImageLuma8(mask),
                ..item
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Color Mask"
    }
}

/// Find external contours in the mask - splits one image into many regions
pub struct RegionExtractionStep {
    pub filter: RegionFilter,
}

impl PipelineStep for RegionExtractionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = item.image.to_luma8();
            let (img_width, img_height) = item.original.as_ref().dimensions();
            let regions = contours::find_regions(&mask);
            let found = regions.len();
            let kept_before = result.len();

            for region in regions {
                if let Err(reason) = self.filter.check(&region, img_width, img_height) {
                    trace!("Dropping region {:?}: {:?}", region.bbox(), reason);
                    continue;
                }
                let Some(crop) = region.extract_roi(&item.original) else {
                    continue;
                };

                result.push(PipelineData::from_region(crop, item.original.clone(), region));
            }

            debug!("Kept {} of {} candidate regions", result.len() - kept_before, found);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Region Extraction"
    }
}

/// Label each region's shape and drop the ones that match no sticker shape
pub struct ShapeClassificationStep {
    pub epsilon_fraction: f64,
    pub circularity_threshold: f64,
}

impl PipelineStep for ShapeClassificationStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let Some(region) = item.region.as_deref() else {
                continue;
            };

            match shapes::classify_shape(&region.points, self.epsilon_fraction, self.circularity_threshold) {
                Some(shape) => result.push(item.with_metadata("shape", MetadataValue::Shape(shape))),
                None => trace!("Dropping region {:?}: unknown shape", item.bbox),
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Shape Classification"
    }
}

/// Name each region's dominant color and drop the ones outside the sticker palette
pub struct DominantColorStep {
    pub params: ColorParams,
}

impl PipelineStep for DominantColorStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let analysis = color::analyze_crop(&item.image, &self.params);
            let Some(sticker_color) = analysis.color else {
                trace!("Dropping region {:?}: hue {:?} is not a sticker color", item.bbox, analysis.dominant_hue);
                continue;
            };

            result.push(
                item.with_metadata("color", MetadataValue::Color(sticker_color))
                    .with_metadata("representative_rgb", MetadataValue::Rgb(analysis.representative_rgb)),
            );
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Dominant Color"
    }
}

/// Drop regions whose bounding box exactly matches a known false positive
pub struct ExclusionStep {
    pub excluded: Vec<BoundingBox>,
}

impl PipelineStep for ExclusionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .filter(|item| match item.bbox {
                Some(bbox) if self.excluded.contains(&bbox) => {
                    debug!("Excluding known false positive at {:?}", bbox);
                    false
                }
                _ => true,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Exclusion Filter"
    }
}

impl ColorMaskStep {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            bands: config.bands.clone(),
            median_kernel: config.median_kernel,
        }
    }
}

impl RegionExtractionStep {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            filter: RegionFilter::from_config(config),
        }
    }
}

impl ShapeClassificationStep {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            epsilon_fraction: config.polygon_epsilon,
            circularity_threshold: config.circularity_threshold,
        }
    }
}

impl DominantColorStep {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            params: ColorParams::from_config(config),
        }
    }
}

impl ExclusionStep {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            excluded: config.excluded_regions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Region, Shape, StickerColor};
    use image::{DynamicImage, Rgb, RgbImage};
    use imageproc::point::Point;
    use std::sync::Arc;

    fn context() -> PipelineContext {
        PipelineContext::default()
    }

    fn region_item(points: Vec<Point<i32>>, fill: Rgb<u8>) -> PipelineData {
        let region = Region::from_points(points).unwrap();
        let crop = DynamicImage::ImageRgb8(RgbImage::from_pixel(region.width(), region.height(), fill));
        let original = Arc::new(DynamicImage::ImageRgb8(RgbImage::new(200, 200)));
        PipelineData::from_region(crop, original, region)
    }

    fn square_points(x: i32, y: i32, size: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + size - 1, y),
            Point::new(x + size - 1, y + size - 1),
            Point::new(x, y + size - 1),
        ]
    }

    #[test]
    fn color_mask_step_replaces_image_with_mask() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([200, 200, 43])));
        let step = ColorMaskStep::from_config(&DetectorConfig::default());

        let out = step.process(vec![PipelineData::from_image(img)], &context()).unwrap();

        assert_eq!(out.len(), 1);
        let mask = out[0].image.to_luma8();
        assert_eq!(mask.dimensions(), (20, 10));
        assert!(mask.pixels().all(|p| p[0] == preprocessing::MASK_ON));
    }

    #[test]
    fn region_step_splits_every_input_mask() {
        let mut rgb = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
        imageproc::drawing::draw_filled_rect_mut(
            &mut rgb,
            imageproc::rect::Rect::at(10, 10).of_size(30, 30),
            Rgb([200, 200, 43]),
        );
        imageproc::drawing::draw_filled_rect_mut(
            &mut rgb,
            imageproc::rect::Rect::at(70, 60).of_size(35, 35),
            Rgb([43, 200, 43]),
        );
        let masks = ColorMaskStep::from_config(&DetectorConfig::default())
            .process(vec![PipelineData::from_image(DynamicImage::ImageRgb8(rgb))], &context())
            .unwrap();
        let step = RegionExtractionStep::from_config(&DetectorConfig::default());

        let out = step.process(vec![masks[0].clone(), masks[0].clone()], &context()).unwrap();

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|item| item.region.is_some()));
        assert_eq!(out[0].bbox, Some(BoundingBox { x: 10, y: 10, width: 30, height: 30 }));
        assert_eq!(out[1].image.width(), 35);
        assert_eq!(out[2].bbox, out[0].bbox);
    }

    #[test]
    fn shape_step_tags_and_filters() {
        let step = ShapeClassificationStep::from_config(&DetectorConfig::default());
        let pentagon = vec![
            Point::new(0, 0),
            Point::new(200, 0),
            Point::new(200, 50),
            Point::new(100, 80),
            Point::new(0, 50),
        ];
        let data = vec![
            region_item(square_points(10, 10, 40), Rgb([200, 200, 43])),
            region_item(pentagon, Rgb([200, 200, 43])),
        ];

        let out = step.process(data, &context()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_shape("shape"), Some(Shape::Square));
    }

    #[test]
    fn color_step_tags_and_filters() {
        let step = DominantColorStep::from_config(&DetectorConfig::default());
        let data = vec![
            region_item(square_points(0, 0, 30), Rgb([30, 60, 200])),
            region_item(square_points(0, 0, 30), Rgb([220, 20, 20])),
        ];

        let out = step.process(data, &context()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_color("color"), Some(StickerColor::Blue));
        assert_eq!(out[0].get_rgb("representative_rgb"), Some([30, 60, 200]));
    }

    #[test]
    fn exclusion_step_drops_exact_matches_only() {
        let step = ExclusionStep {
            excluded: vec![BoundingBox { x: 10, y: 10, width: 40, height: 40 }],
        };
        let data = vec![
            region_item(square_points(10, 10, 40), Rgb([200, 200, 43])),
            region_item(square_points(10, 10, 41), Rgb([200, 200, 43])),
        ];

        let out = step.process(data, &context()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox.map(|b| b.width), Some(41));
    }
}
