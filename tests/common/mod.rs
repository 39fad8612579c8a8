mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from stickers for tests
pub use stickers::{
    BoundingBox, CountSummary, DetectorConfig, Shape, StickerColor, StickerDetection, StickerDetector,
    detect_stickers, summarize,
};
