use std::fmt;

use image::DynamicImage;
use imageproc::geometry::arc_length;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::pipeline::BoundingBox;

/// Outer boundary of one connected mask component.
#[derive(Debug, Clone)]
pub struct Region {
    pub points: Vec<Point<i32>>,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Region {
    /// Build a region from traced contour points. Returns `None` for an empty contour.
    pub fn from_points(points: Vec<Point<i32>>) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            points,
            min_x: min_x.max(0) as u32,
            min_y: min_y.max(0) as u32,
            max_x: max_x.max(0) as u32,
            max_y: max_y.max(0) as u32,
        })
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            x: self.min_x,
            y: self.min_y,
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    /// Polygon area of the contour (shoelace formula).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Closed arc length of the contour.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        arc_length(&self.points, true)
    }

    /// Contour area relative to the bounding box area
    pub fn fill_ratio(&self) -> f64 {
        let rect_area = self.width() as f64 * self.height() as f64;
        self.area() / rect_area
    }

    /// Circularity = 4π × area / perimeter². Zero for a degenerate contour.
    pub fn circularity(&self) -> f64 {
        circularity(self.area(), self.perimeter())
    }

    /// Crop the bounding box out of the source image
    pub fn extract_roi(&self, img: &DynamicImage) -> Option<DynamicImage> {
        if self.max_x >= img.width() || self.max_y >= img.height() {
            return None;
        }
        Some(img.crop_imm(self.min_x, self.min_y, self.width(), self.height()))
    }
}

pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice_area as f64 / 2.0).abs()
}

pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter == 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Triangle,
    Square,
    Hexagon,
    Circle,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Triangle => "triangle",
            Shape::Square => "square",
            Shape::Hexagon => "hexagon",
            Shape::Circle => "circle",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerColor {
    Yellow,
    Green,
    Blue,
}

impl StickerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StickerColor::Yellow => "yellow",
            StickerColor::Green => "green",
            StickerColor::Blue => "blue",
        }
    }
}

impl fmt::Display for StickerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickerDetection {
    pub index: usize,
    pub shape: Shape,
    pub color: StickerColor,
    pub bbox: BoundingBox,
    /// k=1 centroid of the non-background pixels, informational only
    pub representative_rgb: [u8; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(0, 0),
            Point::new(size, 0),
            Point::new(size, size),
            Point::new(0, size),
        ]
    }

    #[test]
    fn region_bbox_uses_inclusive_extent() {
        let region = Region::from_points(square(39)).unwrap();
        assert_eq!(region.width(), 40);
        assert_eq!(region.height(), 40);
        assert_eq!(region.bbox(), BoundingBox { x: 0, y: 0, width: 40, height: 40 });
    }

    #[test]
    fn shoelace_area_ignores_orientation() {
        let mut points = square(10);
        assert_eq!(polygon_area(&points), 100.0);
        points.reverse();
        assert_eq!(polygon_area(&points), 100.0);
    }

    #[test]
    fn zero_perimeter_gives_zero_circularity() {
        let region = Region::from_points(vec![Point::new(3, 3)]).unwrap();
        assert_eq!(region.perimeter(), 0.0);
        assert_eq!(region.circularity(), 0.0);
    }

    #[test]
    fn empty_contour_has_no_region() {
        assert!(Region::from_points(Vec::new()).is_none());
    }

    #[test]
    fn labels_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Shape::Hexagon).unwrap(), "\"hexagon\"");
        assert_eq!(serde_json::to_string(&StickerColor::Blue).unwrap(), "\"blue\"");
    }
}
