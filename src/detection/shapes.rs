use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

use crate::models::{Shape, circularity, polygon_area};

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is split at the point farthest from its first point, both
/// halves are simplified as open curves, and the halves are joined without
/// repeating the split points.
pub fn approximate_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let points = match points {
        [first, rest @ .., last] if !rest.is_empty() && first == last => &points[..points.len() - 1],
        _ => points,
    };
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let start = points[0];
    let dist2 = |p: &Point<i32>| {
        let (dx, dy) = ((p.x - start.x) as i64, (p.y - start.y) as i64);
        dx * dx + dy * dy
    };
    let mut pivot = 0;
    for (i, p) in points.iter().enumerate() {
        if dist2(p) > dist2(&points[pivot]) {
            pivot = i;
        }
    }
    if pivot == 0 {
        return vec![start];
    }

    let mut closing = points[pivot..].to_vec();
    closing.push(start);

    let mut polygon = approximate_polygon_dp(&points[..=pivot], epsilon, false);
    let mut second_half = approximate_polygon_dp(&closing, epsilon, false);
    polygon.pop();
    second_half.pop();
    polygon.append(&mut second_half);
    polygon
}

/// Label a contour by the vertex count of its simplified polygon, falling
/// back to circularity. `None` means the shape is not a sticker shape.
pub fn classify_shape(points: &[Point<i32>], epsilon_fraction: f64, circularity_threshold: f64) -> Option<Shape> {
    if points.len() < 3 {
        return None;
    }
    let perimeter = arc_length(points, true);
    let approx = approximate_polygon(points, epsilon_fraction * perimeter);

    // Exact vertex counts win over the circularity test
    match approx.len() {
        3 => Some(Shape::Triangle),
        4 => Some(Shape::Square),
        6 => Some(Shape::Hexagon),
        _ if circularity(polygon_area(points), perimeter) > circularity_threshold => Some(Shape::Circle),
        _ => None,
    }
}
