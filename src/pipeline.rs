use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{DetectError, Result};
use crate::models::{Region, Shape, StickerColor};

/// Bounding box in the original image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Data that flows through the pipeline
/// Each PipelineData is either the full image or one candidate sticker region
#[derive(Clone)]
pub struct PipelineData {
    /// Current image for this item (full mask, or the region crop)
    pub image: DynamicImage,

    /// Reference to the original image (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,

    /// Bounding box in the original image (None means full image)
    pub bbox: Option<BoundingBox>,

    /// Traced contour of the region this item was cut from
    pub region: Option<Arc<Region>>,

    /// Per-item classifications (e.g. "shape", "color")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Shape(Shape),
    Color(StickerColor),
    Rgb([u8; 3]),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            bbox: None,
            region: None,
            metadata: HashMap::new(),
        }
    }

    /// Create PipelineData for a region of an image
    pub fn from_region(image: DynamicImage, original: Arc<DynamicImage>, region: Region) -> Self {
        Self {
            image,
            original,
            bbox: Some(region.bbox()),
            region: Some(Arc::new(region)),
            metadata: HashMap::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_shape(&self, key: &str) -> Option<Shape> {
        match self.metadata.get(key) {
            Some(MetadataValue::Shape(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_color(&self, key: &str) -> Option<StickerColor> {
        match self.metadata.get(key) {
            Some(MetadataValue::Color(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_rgb(&self, key: &str) -> Option<[u8; 3]> {
        match self.metadata.get(key) {
            Some(MetadataValue::Rgb(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;
}

/// Binary masks hold 0/1; stretch them so the dump is viewable.
fn debug_view(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(gray) if gray.pixels().all(|p| p[0] <= 1) => {
            let stretched = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                image::Luma([gray.get_pixel(x, y)[0] * 255])
            });
            DynamicImage::ImageLuma8(stretched)
        }
        other => other.clone(),
    }
}

fn save_debug_image(image: &DynamicImage, path: &Path) -> Result<()> {
    debug_view(image)
        .save(path)
        .map_err(|source| DetectError::DebugImage {
            path: path.to_path_buf(),
            source,
        })
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let mut entries = std::fs::read_dir(&output_dir)?;
            if entries.next().is_some() {
                return Err(DetectError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn debug_dir(&self) -> Option<&Path> {
        self.context.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Run every step sequentially on an input image
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<Vec<PipelineData>> {
        if let Some(dir) = self.debug_dir() {
            let input_dir = dir.join("00_input");
            std::fs::create_dir_all(&input_dir)?;
            save_debug_image(&input, &input_dir.join("01.png"))?;
            debug!("Debug: saved 00_input/01.png");
        }

        // Start with a single PipelineData containing the full image
        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &self.context)?;

            if let Some(dir) = self.debug_dir() {
                let step_dir_name = format!(
                    "{:02}_{}",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                let step_dir = dir.join(&step_dir_name);
                std::fs::create_dir_all(&step_dir)?;

                for (idx, item) in data.iter().enumerate() {
                    save_debug_image(&item.image, &step_dir.join(format!("{:02}.png", idx + 1)))?;
                }
                debug!("Debug: saved {} images to {}/", data.len(), step_dir_name);
            }

            debug!("  → {} items", data.len());
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
