//! Bottle fill-level classification.
//!
//! The network itself is an opaque collaborator behind [`FillLevelModel`]; this
//! module owns the batch preparation and turns raw class scores into labelled
//! predictions.

use std::fmt;

use image::{DynamicImage, imageops};
use ndarray::{Array2, Array4, ArrayView1};
use serde::Serialize;
use tracing::debug;

use crate::error::{DetectError, Result};

/// Model input edge length in pixels
pub const INPUT_SIZE: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillLevel {
    Full,
    Medium,
    Empty,
}

impl FillLevel {
    /// Class order of the model's output scores
    pub const CLASSES: [FillLevel; 3] = [FillLevel::Full, FillLevel::Medium, FillLevel::Empty];

    pub fn as_str(&self) -> &'static str {
        match self {
            FillLevel::Full => "full",
            FillLevel::Medium => "medium",
            FillLevel::Empty => "empty",
        }
    }
}

impl fmt::Display for FillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillPrediction {
    pub label: FillLevel,
    /// Softmax probability of the winning class
    pub confidence: f32,
}

/// Trait for fill-level models
/// Allows swapping inference backends without touching the service
pub trait FillLevelModel: Send + Sync {
    /// Score a batch shaped [n, 150, 150, 3] (RGB, 0..255 floats)
    ///
    /// Returns raw class scores shaped [n, 3] in `FillLevel::CLASSES` order
    fn predict(&self, batch: &Array4<f32>) -> Result<Array2<f32>>;
}

/// Resize every image to the model input size and stack them NHWC
pub fn prepare_batch(images: &[DynamicImage]) -> Array4<f32> {
    let side = INPUT_SIZE as usize;
    let mut batch = Array4::<f32>::zeros((images.len(), side, side, 3));

    for (n, img) in images.iter().enumerate() {
        let resized = imageops::resize(&img.to_rgb8(), INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Nearest);
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                batch[[n, y as usize, x as usize, c]] = pixel[c] as f32;
            }
        }
    }

    batch
}

fn softmax(scores: ArrayView1<f32>) -> Vec<f32> {
    let max = scores.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Label each row by its highest score, with the softmax probability as confidence
pub fn predictions_from_scores(scores: &Array2<f32>) -> Result<Vec<FillPrediction>> {
    if scores.ncols() != FillLevel::CLASSES.len() {
        return Err(DetectError::Model(format!(
            "expected {} class scores per image, got {}",
            FillLevel::CLASSES.len(),
            scores.ncols()
        )));
    }

    Ok(scores
        .rows()
        .into_iter()
        .map(|row| {
            let probabilities = softmax(row);
            let mut best = 0;
            for (i, p) in probabilities.iter().enumerate() {
                if *p > probabilities[best] {
                    best = i;
                }
            }
            FillPrediction {
                label: FillLevel::CLASSES[best],
                confidence: probabilities[best],
            }
        })
        .collect())
}

/// Fill-level service: load the model once at startup and share it for the process lifetime
pub struct FillLevelClassifier<M: FillLevelModel> {
    model: M,
}

impl<M: FillLevelModel> FillLevelClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Classify a batch of images in a single model call
    pub fn classify_batch(&self, images: &[DynamicImage]) -> Result<Vec<FillPrediction>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let batch = prepare_batch(images);
        let scores = self.model.predict(&batch)?;
        if scores.nrows() != images.len() {
            return Err(DetectError::Model(format!(
                "model returned {} rows for {} images",
                scores.nrows(),
                images.len()
            )));
        }

        let predictions = predictions_from_scores(&scores)?;
        debug!("Classified {} bottle images", predictions.len());
        Ok(predictions)
    }
}
