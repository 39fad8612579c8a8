use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{Shape, StickerColor, StickerDetection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeColorCount {
    pub shape: Shape,
    pub color: StickerColor,
    pub count: usize,
}

/// Sticker counts grouped by (shape, color), in the order each pair was first seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    pub total: usize,
    pub counts: Vec<ShapeColorCount>,
}

pub fn summarize(detections: &[StickerDetection]) -> CountSummary {
    let mut counts: IndexMap<(Shape, StickerColor), usize> = IndexMap::new();
    for detection in detections {
        *counts.entry((detection.shape, detection.color)).or_insert(0) += 1;
    }

    CountSummary {
        total: detections.len(),
        counts: counts
            .into_iter()
            .map(|((shape, color), count)| ShapeColorCount { shape, color, count })
            .collect(),
    }
}
