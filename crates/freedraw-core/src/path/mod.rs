//! Vector path model for ink strokes.
//!
//! An [`InkPath`] is an ordered list of [`PathSegment`]s that always starts
//! with a `MoveTo`. Closing is tracked as a flag rather than a segment so the
//! segment count reflects only drawable geometry.

mod codec;
mod oval;

pub use codec::{decode, encode, CodecError};

use kurbo::{
    Affine, BezPath, CubicBez, Line, ParamCurveExtrema, PathEl, PathSeg, Point, QuadBez, Rect,
    Vec2,
};
use serde::{Deserialize, Serialize};

/// A single path segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Start a new subpath at a point.
    MoveTo(Point),
    /// Straight line to a point.
    LineTo(Point),
    /// Quadratic Bezier to a point.
    QuadTo { control: Point, to: Point },
    /// Cubic Bezier to a point.
    CubicTo {
        control1: Point,
        control2: Point,
        to: Point,
    },
}

impl PathSegment {
    /// The anchor point this segment ends on.
    pub fn end_point(&self) -> Point {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => p,
            PathSegment::QuadTo { to, .. } | PathSegment::CubicTo { to, .. } => to,
        }
    }

    /// Apply an affine transform to the anchor and every control point.
    pub fn transformed(&self, affine: Affine) -> Self {
        match *self {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(affine * p),
            PathSegment::LineTo(p) => PathSegment::LineTo(affine * p),
            PathSegment::QuadTo { control, to } => PathSegment::QuadTo {
                control: affine * control,
                to: affine * to,
            },
            PathSegment::CubicTo {
                control1,
                control2,
                to,
            } => PathSegment::CubicTo {
                control1: affine * control1,
                control2: affine * control2,
                to: affine * to,
            },
        }
    }

    /// Build the kurbo segment that starts at `from`. `MoveTo` has no segment.
    pub(crate) fn to_path_seg(self, from: Point) -> Option<PathSeg> {
        match self {
            PathSegment::MoveTo(_) => None,
            PathSegment::LineTo(p) => Some(PathSeg::Line(Line::new(from, p))),
            PathSegment::QuadTo { control, to } => {
                Some(PathSeg::Quad(QuadBez::new(from, control, to)))
            }
            PathSegment::CubicTo {
                control1,
                control2,
                to,
            } => Some(PathSeg::Cubic(CubicBez::new(from, control1, control2, to))),
        }
    }
}

/// An ink path: a sequence of segments starting with `MoveTo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInkPath")]
pub struct InkPath {
    segments: Vec<PathSegment>,
    /// Whether each subpath is tied back to its starting point.
    #[serde(default)]
    closed: bool,
}

/// Unchecked serialized form of [`InkPath`].
#[derive(Deserialize)]
struct RawInkPath {
    segments: Vec<PathSegment>,
    #[serde(default)]
    closed: bool,
}

impl TryFrom<RawInkPath> for InkPath {
    type Error = CodecError;

    fn try_from(raw: RawInkPath) -> Result<Self, Self::Error> {
        match raw.segments.first() {
            None => Err(CodecError::Empty),
            Some(PathSegment::MoveTo(_)) => Ok(Self {
                segments: raw.segments,
                closed: raw.closed,
            }),
            Some(PathSegment::LineTo(_)) => Err(CodecError::MissingMove("LineTo")),
            Some(PathSegment::QuadTo { .. }) => Err(CodecError::MissingMove("QuadTo")),
            Some(PathSegment::CubicTo { .. }) => Err(CodecError::MissingMove("CubicTo")),
        }
    }
}

impl InkPath {
    /// Create a path starting at the given point.
    pub fn new(start: Point) -> Self {
        Self {
            segments: vec![PathSegment::MoveTo(start)],
            closed: false,
        }
    }

    /// Create an open polyline through the given points.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut path = Self::new(*first);
        for p in rest {
            path.line_to(*p);
        }
        Some(path)
    }

    /// Create a path from raw segments.
    ///
    /// Returns `None` if the list is empty or does not start with `MoveTo`.
    pub fn from_segments(segments: Vec<PathSegment>, closed: bool) -> Option<Self> {
        match segments.first() {
            Some(PathSegment::MoveTo(_)) => Some(Self { segments, closed }),
            _ => None,
        }
    }

    /// Start a new subpath.
    pub fn move_to(&mut self, point: Point) {
        self.segments.push(PathSegment::MoveTo(point));
    }

    pub fn line_to(&mut self, point: Point) {
        self.segments.push(PathSegment::LineTo(point));
    }

    pub fn quad_to(&mut self, control: Point, to: Point) {
        self.segments.push(PathSegment::QuadTo { control, to });
    }

    pub fn curve_to(&mut self, control1: Point, control2: Point, to: Point) {
        self.segments.push(PathSegment::CubicTo {
            control1,
            control2,
            to,
        });
    }

    /// Mark the path as closed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// The segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether the path is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of segments, including the leading `MoveTo`.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A path always holds its leading `MoveTo`, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The point of the leading `MoveTo`.
    pub fn first_point(&self) -> Point {
        self.segments[0].end_point()
    }

    /// The last anchor point.
    pub fn last_point(&self) -> Point {
        self.segments[self.segments.len() - 1].end_point()
    }

    /// Whether the path has no drawable extent (only moves or zero-length segments).
    pub fn is_degenerate(&self) -> bool {
        self.subpaths().iter().flatten().all(|seg| {
            let b = seg.bounding_box();
            b.width() <= f64::EPSILON && b.height() <= f64::EPSILON
        })
    }

    /// Apply an affine transform to every point and control point.
    pub fn apply_affine(&self, affine: Affine) -> Self {
        Self {
            segments: self.segments.iter().map(|s| s.transformed(affine)).collect(),
            closed: self.closed,
        }
    }

    /// Transform the path in place.
    pub fn transform(&mut self, affine: Affine) {
        for segment in &mut self.segments {
            *segment = segment.transformed(affine);
        }
    }

    /// Anchor points only, control points excluded.
    ///
    /// Closing is not a segment, so a closed path does not repeat its start.
    pub fn points(&self) -> Vec<Point> {
        self.segments.iter().map(PathSegment::end_point).collect()
    }

    /// Tight bounding box, including curve extrema.
    pub fn bounds(&self) -> Rect {
        let start = self.first_point();
        let mut rect = Rect::from_points(start, start);
        for segment in &self.segments {
            if let PathSegment::MoveTo(p) = segment {
                rect = rect.union_pt(*p);
            }
        }
        for seg in self.subpaths().iter().flatten() {
            rect = rect.union(seg.bounding_box());
        }
        rect
    }

    /// Shift the path so the center of its bounding box lands on `target`.
    pub fn translate_center_to(&self, target: Point) -> Self {
        let delta: Vec2 = target - self.bounds().center();
        self.apply_affine(Affine::translate(delta))
    }

    /// Split into kurbo segments per subpath.
    ///
    /// Closed paths get an explicit closing line when the last anchor does
    /// not already sit on the subpath start.
    pub(crate) fn subpaths(&self) -> Vec<Vec<PathSeg>> {
        let mut result = Vec::new();
        let mut current: Vec<PathSeg> = Vec::new();
        let mut start = self.first_point();
        let mut last = start;

        for segment in &self.segments {
            match segment {
                PathSegment::MoveTo(p) => {
                    if !current.is_empty() {
                        self.finish_subpath(&mut current, start, last);
                        result.push(std::mem::take(&mut current));
                    }
                    start = *p;
                    last = *p;
                }
                other => {
                    if let Some(seg) = other.to_path_seg(last) {
                        current.push(seg);
                    }
                    last = other.end_point();
                }
            }
        }
        if !current.is_empty() {
            self.finish_subpath(&mut current, start, last);
            result.push(current);
        }
        result
    }

    fn finish_subpath(&self, segs: &mut Vec<PathSeg>, start: Point, last: Point) {
        if self.closed && last != start {
            segs.push(PathSeg::Line(Line::new(last, start)));
        }
    }

    /// Append a kurbo segment, assuming it continues from the current end point.
    pub(crate) fn push_seg(&mut self, seg: PathSeg) {
        match seg {
            PathSeg::Line(l) => self.line_to(l.p1),
            PathSeg::Quad(q) => self.quad_to(q.p1, q.p2),
            PathSeg::Cubic(c) => self.curve_to(c.p1, c.p2, c.p3),
        }
    }

    /// Convert to a kurbo path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut subpath_open = false;
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    if subpath_open && self.closed {
                        path.close_path();
                    }
                    path.move_to(p);
                    subpath_open = true;
                }
                PathSegment::LineTo(p) => path.line_to(p),
                PathSegment::QuadTo { control, to } => path.quad_to(control, to),
                PathSegment::CubicTo {
                    control1,
                    control2,
                    to,
                } => path.curve_to(control1, control2, to),
            }
        }
        if subpath_open && self.closed {
            path.close_path();
        }
        path
    }

    /// Convert from a kurbo path.
    ///
    /// The result is closed only when every subpath ends in `ClosePath`.
    /// Returns `None` if the path is empty or does not start with `MoveTo`.
    pub fn from_bez_path(path: &BezPath) -> Option<Self> {
        let mut segments = Vec::new();
        let mut subpaths = 0usize;
        let mut closes = 0usize;
        let mut pending_close = false;

        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    subpaths += 1;
                    pending_close = false;
                    segments.push(PathSegment::MoveTo(p));
                }
                PathEl::LineTo(p) => segments.push(PathSegment::LineTo(p)),
                PathEl::QuadTo(control, to) => segments.push(PathSegment::QuadTo { control, to }),
                PathEl::CurveTo(control1, control2, to) => segments.push(PathSegment::CubicTo {
                    control1,
                    control2,
                    to,
                }),
                PathEl::ClosePath => {
                    if !pending_close {
                        closes += 1;
                        pending_close = true;
                    }
                }
            }
        }

        let closed = subpaths > 0 && closes == subpaths;
        Self::from_segments(segments, closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_path() -> InkPath {
        let mut path = InkPath::new(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        path.quad_to(Point::new(15.0, 5.0), Point::new(10.0, 10.0));
        path.curve_to(
            Point::new(8.0, 12.0),
            Point::new(2.0, 12.0),
            Point::new(0.0, 10.0),
        );
        path
    }

    fn all_points(segment: &PathSegment) -> Vec<Point> {
        match *segment {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
            PathSegment::QuadTo { control, to } => vec![control, to],
            PathSegment::CubicTo {
                control1,
                control2,
                to,
            } => vec![control1, control2, to],
        }
    }

    fn assert_paths_close(a: &InkPath, b: &InkPath, tol: f64) {
        assert_eq!(a.len(), b.len());
        assert_eq!(a.is_closed(), b.is_closed());
        for (sa, sb) in a.segments().iter().zip(b.segments()) {
            assert_eq!(
                std::mem::discriminant(sa),
                std::mem::discriminant(sb),
                "segment kinds differ"
            );
            for (pa, pb) in all_points(sa).into_iter().zip(all_points(sb)) {
                assert!((pa - pb).hypot() < tol, "{sa:?} vs {sb:?}");
            }
        }
    }

    #[test]
    fn test_new_path_starts_with_move() {
        let path = InkPath::new(Point::new(3.0, 4.0));
        assert_eq!(path.segments(), &[PathSegment::MoveTo(Point::new(3.0, 4.0))]);
        assert!(path.is_degenerate());
    }

    #[test]
    fn test_from_segments_requires_move() {
        assert!(InkPath::from_segments(vec![PathSegment::LineTo(Point::ZERO)], false).is_none());
        assert!(InkPath::from_segments(Vec::new(), false).is_none());
    }

    #[test]
    fn test_points_exclude_controls() {
        let points = sample_path().points();
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_closed_points_do_not_repeat_start() {
        let mut path = InkPath::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ])
        .unwrap();
        path.close();
        assert_eq!(path.points().len(), 3);
        // The closing edge still takes part in geometry.
        assert_eq!(path.subpaths()[0].len(), 3);
    }

    #[test]
    fn test_bounds_include_curve_extrema() {
        let bounds = sample_path().bounds();
        assert!(bounds.x1 > 10.0, "quad bulges past its anchors");
        assert!(bounds.y1 > 10.0, "cubic bulges past its anchors");
        assert!((bounds.x0).abs() < 1e-9);
        assert!((bounds.y0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_center_to() {
        let path = InkPath::from_points(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]).unwrap();
        let moved = path.translate_center_to(Point::new(0.0, 0.0));
        assert_eq!(moved.first_point(), Point::new(-50.0, 0.0));
        assert_eq!(moved.last_point(), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_bez_path_conversion_keeps_kinds() {
        let mut path = sample_path();
        path.close();
        let bez = path.to_bez_path();
        assert!(matches!(bez.elements().last(), Some(PathEl::ClosePath)));
        let back = InkPath::from_bez_path(&bez).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_from_bez_path_mixed_close_is_open() {
        let mut bez = BezPath::new();
        bez.move_to((0.0, 0.0));
        bez.line_to((1.0, 0.0));
        bez.close_path();
        bez.move_to((5.0, 5.0));
        bez.line_to((6.0, 5.0));
        let path = InkPath::from_bez_path(&bez).unwrap();
        assert!(!path.is_closed());
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_degenerate_detection() {
        let path =
            InkPath::from_points(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)]).unwrap();
        assert!(path.is_degenerate());
        assert!(!sample_path().is_degenerate());
    }

    #[test]
    fn test_deserialize_rejects_path_without_leading_move() {
        let empty = serde_json::from_str::<InkPath>(r#"{"segments":[]}"#);
        assert!(empty.is_err());

        let line_first =
            serde_json::from_str::<InkPath>(r#"{"segments":[{"LineTo":{"x":1.0,"y":2.0}}]}"#);
        assert!(line_first.is_err());

        let json = serde_json::to_string(&sample_path()).unwrap();
        assert_eq!(serde_json::from_str::<InkPath>(&json).unwrap(), sample_path());
    }

    proptest! {
        #[test]
        fn affine_round_trip(
            sx in 0.1f64..10.0,
            sy in 0.1f64..10.0,
            flip in any::<bool>(),
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
            angle in -3.0f64..3.0,
        ) {
            let sy = if flip { -sy } else { sy };
            let affine = Affine::translate((tx, ty))
                * Affine::rotate(angle)
                * Affine::scale_non_uniform(sx, sy);
            let path = sample_path();
            let back = path.apply_affine(affine).apply_affine(affine.inverse());
            assert_paths_close(&path, &back, 1e-6);
        }
    }
}
