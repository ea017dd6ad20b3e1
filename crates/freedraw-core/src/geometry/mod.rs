//! Stroke outlines, hit testing and path difference.

mod clip;

pub use clip::{difference, clip, ClipOptions, ClipOutcome};

use crate::path::InkPath;
use kurbo::{BezPath, Cap, Circle, Join, Point, Rect, Shape, Stroke, StrokeOpts};

/// Accuracy used when offsetting paths into outlines.
pub const STROKE_ACCURACY: f64 = 0.05;

/// Convert a zero-width path into a fillable outline of the given width.
///
/// Caps and joins are round. A path with no extent becomes a dot of the
/// stroke diameter; a non-positive width yields an empty outline.
pub fn stroke_to_area(path: &InkPath, width: f64) -> BezPath {
    if width <= 0.0 || !width.is_finite() {
        return BezPath::new();
    }
    if path.is_degenerate() {
        return Circle::new(path.first_point(), width / 2.0).to_path(STROKE_ACCURACY);
    }
    let style = Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round);
    kurbo::stroke(
        path.to_bez_path().iter(),
        &style,
        &StrokeOpts::default(),
        STROKE_ACCURACY,
    )
}

/// Whether a point lies inside a filled area (nonzero winding).
pub fn contains_point(area: &BezPath, point: Point) -> bool {
    area.contains(point)
}

/// Two-stage hit test of a stroked path.
///
/// The bounding box inflated by half the width is checked first; the exact
/// outline is only built when that passes.
pub fn hit_test(path: &InkPath, width: f64, point: Point) -> bool {
    let half = width / 2.0;
    if !rect_contains(path.bounds().inflate(half, half), point) {
        return false;
    }
    contains_point(&stroke_to_area(path, width), point)
}

/// Inclusive point-in-rectangle test.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether two rectangles intersect or touch.
///
/// Unlike an area test this accepts zero-height or zero-width rectangles,
/// which is what a straight horizontal or vertical stroke has.
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
