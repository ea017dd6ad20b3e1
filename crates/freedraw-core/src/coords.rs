//! Coordinate frames used during a gesture.
//!
//! - *device*: raw touch positions in the view the host attaches to.
//! - *overlay*: the temporary preview layer. Same scale as device, possibly
//!   offset from it.
//! - *page*: the document page's own coordinate system, where annotation
//!   geometry is built and stored. With `flip_y` page y grows upward.
//!
//! Every map is an invertible affine transform derived from the current zoom
//! scale and page origin, both supplied by the host.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Transform chain between device, overlay and page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpace {
    /// Overlay units per page unit.
    pub scale: f64,
    /// Where the page origin lands in overlay space.
    pub page_origin: Point,
    /// Position of the overlay layer's origin in device space.
    #[serde(default)]
    pub overlay_offset: Vec2,
    /// Whether page y points the opposite way to overlay y.
    #[serde(default)]
    pub flip_y: bool,
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self::identity()
    }
}

impl CoordinateSpace {
    /// All three frames coincide.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            page_origin: Point::ZERO,
            overlay_offset: Vec2::ZERO,
            flip_y: false,
        }
    }

    /// A page shown at `scale` with its origin at `page_origin` in overlay space.
    pub fn new(scale: f64, page_origin: Point) -> Self {
        Self {
            scale,
            page_origin,
            ..Self::identity()
        }
    }

    /// Set whether page y is flipped relative to overlay y.
    pub fn with_flip(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Set the overlay's origin in device space.
    pub fn with_overlay_offset(mut self, offset: Vec2) -> Self {
        self.overlay_offset = offset;
        self
    }

    /// Whether the transforms are invertible.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && self.page_origin.is_finite()
            && self.overlay_offset.is_finite()
    }

    /// Page space to overlay space.
    pub fn page_to_overlay_transform(&self) -> Affine {
        let sy = if self.flip_y { -self.scale } else { self.scale };
        Affine::translate(self.page_origin.to_vec2()) * Affine::scale_non_uniform(self.scale, sy)
    }

    /// Overlay space to page space.
    pub fn overlay_to_page_transform(&self) -> Affine {
        self.page_to_overlay_transform().inverse()
    }

    /// Device space to overlay space.
    pub fn device_to_overlay_transform(&self) -> Affine {
        Affine::translate(-self.overlay_offset)
    }

    /// Device space to page space.
    pub fn device_to_page_transform(&self) -> Affine {
        self.overlay_to_page_transform() * self.device_to_overlay_transform()
    }

    /// Annotation-local space (origin at the bounds' minimum corner) to overlay space.
    pub fn annotation_to_overlay_transform(&self, bounds: Rect) -> Affine {
        self.page_to_overlay_transform() * Affine::translate(bounds.origin().to_vec2())
    }

    pub fn device_to_page(&self, point: Point) -> Point {
        self.device_to_page_transform() * point
    }

    pub fn device_to_overlay(&self, point: Point) -> Point {
        self.device_to_overlay_transform() * point
    }

    pub fn page_to_overlay(&self, point: Point) -> Point {
        self.page_to_overlay_transform() * point
    }

    pub fn overlay_to_page(&self, point: Point) -> Point {
        self.overlay_to_page_transform() * point
    }

    /// Convert a length in overlay units to page units.
    pub fn overlay_length_to_page(&self, length: f64) -> f64 {
        length / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_identity() {
        let space = CoordinateSpace::identity();
        let p = Point::new(12.0, 34.0);
        assert_near(space.device_to_page(p), p);
        assert_near(space.page_to_overlay(p), p);
    }

    #[test]
    fn test_scale_and_origin() {
        let space = CoordinateSpace::new(2.0, Point::new(100.0, 50.0));
        assert_near(space.page_to_overlay(Point::new(10.0, 10.0)), Point::new(120.0, 70.0));
        assert_near(space.device_to_page(Point::new(120.0, 70.0)), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_flipped_page() {
        // Page bottom-left corner sits at overlay (0, 800); page y grows upward.
        let space = CoordinateSpace::new(1.5, Point::new(0.0, 800.0)).with_flip(true);
        assert_near(space.page_to_overlay(Point::new(0.0, 100.0)), Point::new(0.0, 650.0));
        assert_near(space.overlay_to_page(Point::new(0.0, 650.0)), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_overlay_offset() {
        let space = CoordinateSpace::identity().with_overlay_offset(Vec2::new(5.0, 7.0));
        assert_near(space.device_to_overlay(Point::new(5.0, 7.0)), Point::ZERO);
        assert_near(space.device_to_page(Point::new(5.0, 7.0)), Point::ZERO);
    }

    #[test]
    fn test_round_trip_all_frames() {
        let space = CoordinateSpace::new(0.75, Point::new(-20.0, 640.0))
            .with_flip(true)
            .with_overlay_offset(Vec2::new(3.0, -4.0));
        let device = Point::new(321.0, 123.0);
        let page = space.device_to_page(device);
        let back = space.device_to_page_transform().inverse() * page;
        assert_near(back, device);
        assert_near(space.page_to_overlay(page), space.device_to_overlay(device));
    }

    #[test]
    fn test_annotation_local_to_overlay() {
        let space = CoordinateSpace::new(2.0, Point::ZERO);
        let bounds = Rect::new(10.0, 20.0, 30.0, 40.0);
        let local = Point::new(1.0, 1.0);
        assert_near(
            space.annotation_to_overlay_transform(bounds) * local,
            Point::new(22.0, 42.0),
        );
    }

    #[test]
    fn test_validity() {
        assert!(CoordinateSpace::identity().is_valid());
        assert!(!CoordinateSpace::new(0.0, Point::ZERO).is_valid());
        assert!(!CoordinateSpace::new(f64::NAN, Point::ZERO).is_valid());
    }
}
