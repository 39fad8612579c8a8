#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tempfile::NamedTempFile;

/// Sticker colors rendered at saturation and value 200 (8-bit HSV)
pub const YELLOW: Rgb<u8> = Rgb([200, 200, 43]);
pub const GREEN: Rgb<u8> = Rgb([43, 200, 43]);
pub const BLUE: Rgb<u8> = Rgb([43, 43, 200]);
pub const RED: Rgb<u8> = Rgb([200, 43, 43]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// The two bounding boxes flagged as lighting artifacts in the reference photo
pub const REFERENCE_EXCLUSIONS: [BoxSpec; 2] = [(480, 135, 41, 44), (378, 660, 40, 29)];

pub type BoxSpec = (u32, u32, u32, u32);

pub fn canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

pub fn draw_rect(img: &mut RgbImage, (x, y, w, h): BoxSpec, color: Rgb<u8>) {
    draw_filled_rect_mut(img, Rect::at(x as i32, y as i32).of_size(w, h), color);
}

/// 200x200 white image holding one 40x40 sticker-yellow square
pub fn yellow_square_image() -> DynamicImage {
    let mut img = canvas(200, 200);
    draw_rect(&mut img, (60, 60, 40, 40), YELLOW);
    DynamicImage::ImageRgb8(img)
}

/// 800x800 white image with yellow blobs at exactly the reference exclusion boxes
pub fn reference_artifacts_image() -> DynamicImage {
    let mut img = canvas(800, 800);
    for bbox in REFERENCE_EXCLUSIONS {
        draw_rect(&mut img, bbox, YELLOW);
    }
    DynamicImage::ImageRgb8(img)
}

pub fn reference_exclusions() -> Vec<stickers::BoundingBox> {
    REFERENCE_EXCLUSIONS
        .iter()
        .map(|&(x, y, width, height)| stickers::BoundingBox { x, y, width, height })
        .collect()
}

/// Saves an image to a temp PNG file that is removed when dropped.
pub fn save_temp_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
