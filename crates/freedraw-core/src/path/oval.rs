//! Closed-curve detection and oval replacement.

use super::{InkPath, PathSegment};
use kurbo::{Ellipse, PathEl, Rect, Shape};

/// Tolerance used when approximating the oval with cubic arcs.
const OVAL_ACCURACY: f64 = 0.1;

impl InkPath {
    /// Whether a free-hand path looks like a closed loop.
    ///
    /// The start and end anchors must lie within `closure_tolerance` of each
    /// other and no two adjacent anchors may be more than `step_tolerance`
    /// apart.
    pub fn resembles_oval(&self, closure_tolerance: f64, step_tolerance: f64) -> bool {
        let points = self.points();
        if points.len() < 3 {
            return false;
        }
        if self.first_point().distance(self.last_point()) > closure_tolerance {
            return false;
        }
        points
            .windows(2)
            .all(|w| w[0].distance(w[1]) <= step_tolerance)
    }

    /// An oval inscribed in `rect`, built from cubic arcs and left open.
    pub fn open_oval_in(rect: Rect) -> Self {
        let mut path = InkPath::new(rect.center());
        let mut started = false;
        for el in Ellipse::from_rect(rect).path_elements(OVAL_ACCURACY) {
            match el {
                PathEl::MoveTo(p) => {
                    // Replace the placeholder start with the real one.
                    path.segments[0] = PathSegment::MoveTo(p);
                    started = true;
                }
                PathEl::CurveTo(c1, c2, p) if started => path.curve_to(c1, c2, p),
                _ => {}
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn circle_points(center: Point, radius: f64, steps: usize) -> Vec<Point> {
        (0..=steps)
            .map(|i| {
                let a = i as f64 / steps as f64 * std::f64::consts::TAU;
                Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_hand_drawn_loop_resembles_oval() {
        let mut points = circle_points(Point::new(50.0, 50.0), 40.0, 36);
        // Leave a small gap between start and end.
        points.pop();
        let path = InkPath::from_points(&points).unwrap();
        assert!(path.resembles_oval(10.0, 20.0));
    }

    #[test]
    fn test_open_stroke_does_not_resemble_oval() {
        let path = InkPath::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        ])
        .unwrap();
        assert!(!path.resembles_oval(10.0, 20.0));
    }

    #[test]
    fn test_sparse_loop_does_not_resemble_oval() {
        // Closed, but the samples jump far apart.
        let points = circle_points(Point::new(0.0, 0.0), 100.0, 8);
        let path = InkPath::from_points(&points).unwrap();
        assert!(!path.resembles_oval(10.0, 20.0));
    }

    #[test]
    fn test_open_oval_is_open_cubic_path() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let oval = InkPath::open_oval_in(rect);
        assert!(!oval.is_closed());
        assert!(oval.len() >= 5);
        assert!(
            oval.segments()[1..]
                .iter()
                .all(|s| matches!(s, PathSegment::CubicTo { .. }))
        );
        let bounds = oval.bounds();
        assert!((bounds.x0 - rect.x0).abs() < 0.5);
        assert!((bounds.x1 - rect.x1).abs() < 0.5);
        assert!((bounds.y0 - rect.y0).abs() < 0.5);
        assert!((bounds.y1 - rect.y1).abs() < 0.5);
        // The arcs come back around to the start.
        assert!(oval.first_point().distance(oval.last_point()) < 1e-6);
    }
}
