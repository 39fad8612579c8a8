use image::{DynamicImage, Rgb};

use crate::config::{DetectorConfig, HueBand};
use crate::detection::preprocessing::{rgb_to_hsv, to_grayscale};
use crate::models::StickerColor;

const HUE_BINS: usize = 180;

/// Thresholds for naming the color of a sticker crop
#[derive(Debug, Clone)]
pub struct ColorParams {
    pub bands: Vec<HueBand>,
    pub background_threshold: u8,
    pub min_saturation: u8,
    pub min_value: u8,
}

impl ColorParams {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            bands: config.bands.clone(),
            background_threshold: config.background_threshold,
            min_saturation: config.hue_min_saturation,
            min_value: config.hue_min_value,
        }
    }
}

impl Default for ColorParams {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorAnalysis {
    /// Most frequent hue among saturated foreground pixels
    pub dominant_hue: Option<u8>,
    /// k=1 centroid of the foreground pixels, black when there are none
    pub representative_rgb: [u8; 3],
    pub color: Option<StickerColor>,
}

/// Pixels brighter than the background threshold in grayscale
pub fn foreground_pixels(crop: &DynamicImage, background_threshold: u8) -> Vec<Rgb<u8>> {
    let rgb = crop.to_rgb8();
    let gray = to_grayscale(crop);
    rgb.pixels()
        .zip(gray.pixels())
        .filter(|(_, g)| g[0] > background_threshold)
        .map(|(p, _)| *p)
        .collect()
}

/// Hue histogram of the pixels that are saturated and bright enough to carry a hue
pub fn hue_histogram(pixels: &[Rgb<u8>], min_saturation: u8, min_value: u8) -> [u32; HUE_BINS] {
    let mut histogram = [0u32; HUE_BINS];
    for pixel in pixels {
        let [h, s, v] = rgb_to_hsv(pixel);
        if s >= min_saturation && v >= min_value {
            histogram[h as usize % HUE_BINS] += 1;
        }
    }
    histogram
}

/// Lowest hue bin holding the maximum count; `None` for an empty histogram
pub fn dominant_hue(histogram: &[u32; HUE_BINS]) -> Option<u8> {
    let mut best: Option<(usize, u32)> = None;
    for (hue, &count) in histogram.iter().enumerate() {
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((hue, count));
        }
    }
    best.map(|(hue, _)| hue as u8)
}

/// K-means color clustering
pub fn cluster_centroids(pixels: &[Rgb<u8>], k: usize, iterations: usize) -> Vec<[f32; 3]> {
    if pixels.is_empty() || k == 0 {
        return vec![];
    }

    let k = k.min(pixels.len());
    let to_f32 = |p: &Rgb<u8>| p.0.map(f32::from);
    let dist2 = |p: &Rgb<u8>, c: &[f32; 3]| {
        let [r, g, b] = to_f32(p);
        (r - c[0]).powi(2) + (g - c[1]).powi(2) + (b - c[2]).powi(2)
    };
    let nearest = |p: &Rgb<u8>, centroids: &[[f32; 3]]| {
        let mut best = 0;
        for (i, c) in centroids.iter().enumerate() {
            if dist2(p, c) < dist2(p, &centroids[best]) {
                best = i;
            }
        }
        best
    };

    // Seed with the first pixel, then repeatedly the pixel farthest from all seeds
    let mut centroids = vec![to_f32(&pixels[0])];
    while centroids.len() < k {
        let farthest = pixels
            .iter()
            .max_by(|a, b| {
                let da = dist2(a, &centroids[nearest(a, &centroids)]);
                let db = dist2(b, &centroids[nearest(b, &centroids)]);
                da.total_cmp(&db)
            })
            .map(to_f32)
            .unwrap_or([0.0; 3]);
        centroids.push(farthest);
    }

    for _ in 0..iterations {
        let mut sums = vec![[0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for p in pixels {
            let i = nearest(p, &centroids);
            for (sum, &channel) in sums[i].iter_mut().zip(p.0.iter()) {
                *sum += channel as f64;
            }
            counts[i] += 1;
        }

        let mut moved = false;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            if count == 0 {
                continue;
            }
            let updated = sum.map(|s| (s / count as f64) as f32);
            moved |= updated != *centroid;
            *centroid = updated;
        }
        if !moved {
            break;
        }
    }

    centroids
}

/// Single-cluster centroid of the pixels; black when there are no pixels
pub fn representative_color(pixels: &[Rgb<u8>]) -> [u8; 3] {
    cluster_centroids(pixels, 1, 10)
        .first()
        .map(|c| c.map(|channel| channel as u8))
        .unwrap_or([0, 0, 0])
}

pub fn classify_hue(hue: u8, bands: &[HueBand]) -> Option<StickerColor> {
    bands.iter().find(|band| band.contains_hue(hue)).map(|band| band.color)
}

/// Name the color of a sticker crop
pub fn analyze_crop(crop: &DynamicImage, params: &ColorParams) -> ColorAnalysis {
    let pixels = foreground_pixels(crop, params.background_threshold);
    let histogram = hue_histogram(&pixels, params.min_saturation, params.min_value);
    let dominant_hue = dominant_hue(&histogram);

    ColorAnalysis {
        dominant_hue,
        representative_rgb: representative_color(&pixels),
        color: dominant_hue.and_then(|hue| classify_hue(hue, &params.bands)),
    }
}
