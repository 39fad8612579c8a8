use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::median_filter;

use crate::config::HueBand;

/// Mask value for pixels of interest
pub const MASK_ON: u8 = 1;

/// Convert image to grayscale with BT.601 weights (0.299 R + 0.587 G + 0.114 B), rounded
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0.map(u32::from);
        Luma([((299 * r + 587 * g + 114 * b + 500) / 1000) as u8])
    })
}

/// Convert an RGB pixel to 8-bit HSV: hue in 0..180 (degrees / 2), saturation and value in 0..=255
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let hue = (hue / 2.0).round() as u16 % 180;
    [hue as u8, saturation.round() as u8, max as u8]
}

/// Binary mask (0 / MASK_ON) of pixels falling into any of the hue bands
pub fn color_mask(img: &RgbImage, bands: &[HueBand]) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let hsv = rgb_to_hsv(img.get_pixel(x, y));
        if bands.iter().any(|band| band.contains(hsv)) {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Median-filter a mask to remove speckle noise. `kernel_size` is the full (odd) window width.
pub fn smooth_mask(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return mask.clone();
    }
    median_filter(mask, radius, radius)
}
