pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod summary;

use std::path::Path;

use image::{DynamicImage, ImageReader};

pub use classifier::{FillLevel, FillLevelClassifier, FillLevelModel, FillPrediction};
pub use config::{DetectorConfig, HueBand};
pub use detection::{StickerDetector, detect_stickers};
pub use error::{DetectError, Result};
pub use models::{Region, Shape, StickerColor, StickerDetection};
pub use pipeline::{BoundingBox, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use summary::{CountSummary, ShapeColorCount, summarize};

/// Open and decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let read_error = |source| DetectError::ImageRead {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| read_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| read_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(read_error)
}
