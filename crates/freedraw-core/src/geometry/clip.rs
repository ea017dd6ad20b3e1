//! Boolean difference of a path and a filled area.
//!
//! The subject is cut at every crossing with the area's boundary. Each piece
//! between two cuts is kept as an exact Bezier subsegment when its midpoint
//! lies outside the area, and surviving neighbours are stitched back into
//! paths. The area boundary is flattened for the crossing search; the
//! subject never is.

use super::rects_touch;
use crate::path::InkPath;
use kurbo::{
    BezPath, Line, ParamCurve, ParamCurveArclen, ParamCurveExtrema, PathEl, PathSeg, Point, Rect,
};
use serde::{Deserialize, Serialize};

/// Parameter distance under which two cuts are merged.
const T_EPSILON: f64 = 1e-9;

/// Accuracy for measuring surviving pieces.
const ARCLEN_ACCURACY: f64 = 1e-3;

/// Numeric policy of the clipper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipOptions {
    /// Maximum deviation when flattening the area boundary.
    pub flatten_tolerance: f64,
    /// Points this close to the area boundary count as covered. Must be
    /// larger than `flatten_tolerance` for `difference(a, a)` to be empty.
    pub boundary_tolerance: f64,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            flatten_tolerance: 0.05,
            boundary_tolerance: 0.1,
        }
    }
}

/// Result of clipping a path against an area.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// No part of the subject is covered.
    Untouched,
    /// What survives of the subject. Empty when fully covered.
    Pieces(Vec<InkPath>),
}

impl ClipOutcome {
    /// Whether the subject changed.
    pub fn is_untouched(&self) -> bool {
        matches!(self, ClipOutcome::Untouched)
    }

    /// The surviving paths, with an untouched subject returned whole.
    pub fn into_paths(self, subject: &InkPath) -> Vec<InkPath> {
        match self {
            ClipOutcome::Untouched => vec![subject.clone()],
            ClipOutcome::Pieces(pieces) => pieces,
        }
    }
}

/// Subtract `area` from `subject`, returning the surviving disjoint paths.
///
/// A degenerate subject yields no paths. An area that does not reach the
/// subject returns the subject unchanged.
pub fn difference(subject: &InkPath, area: &BezPath, options: &ClipOptions) -> Vec<InkPath> {
    clip(subject, area, options).into_paths(subject)
}

/// Like [`difference`], but tells an untouched subject apart from a cut one.
pub fn clip(subject: &InkPath, area: &BezPath, options: &ClipOptions) -> ClipOutcome {
    if subject.is_degenerate() {
        return ClipOutcome::Pieces(Vec::new());
    }

    let boundary = Boundary::new(area, options.flatten_tolerance);
    if boundary.edges.is_empty() {
        return ClipOutcome::Untouched;
    }
    let tol = options.boundary_tolerance;
    if !rects_touch(subject.bounds().inflate(tol, tol), boundary.bounds) {
        return ClipOutcome::Untouched;
    }

    let mut any_covered = false;
    let mut result = Vec::new();

    for segs in subject.subpaths() {
        let pieces: Vec<Piece> = segs
            .iter()
            .flat_map(|seg| boundary.split(*seg, tol))
            .collect();
        if pieces.is_empty() {
            continue;
        }

        let mut runs: Vec<Vec<PathSeg>> = Vec::new();
        let mut current: Vec<PathSeg> = Vec::new();
        let mut subpath_covered = false;
        for piece in &pieces {
            if piece.covered {
                subpath_covered = true;
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            } else {
                current.push(piece.seg);
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }

        // A closed loop cut somewhere in the middle wraps around its start.
        let wraps = subject.is_closed()
            && subpath_covered
            && runs.len() >= 2
            && pieces.first().is_some_and(|p| !p.covered)
            && pieces.last().is_some_and(|p| !p.covered);
        if wraps {
            let mut last = runs.pop().unwrap_or_default();
            last.extend(runs.remove(0));
            runs.push(last);
        }

        if !subpath_covered {
            // Keep the loop intact; it is only split if another subpath was cut.
            result.push(subpath_to_path(&segs, subject.is_closed()));
            continue;
        }
        any_covered = true;
        result.extend(
            runs.iter()
                .filter(|run| run_length(run) >= tol)
                .map(|run| run_to_path(run)),
        );
    }

    if any_covered {
        ClipOutcome::Pieces(result)
    } else {
        ClipOutcome::Untouched
    }
}

/// A piece of a subject segment between two boundary crossings.
#[derive(Debug, Clone, Copy)]
struct Piece {
    seg: PathSeg,
    covered: bool,
}

/// Flattened boundary of a filled area.
struct Boundary {
    edges: Vec<Line>,
    bounds: Rect,
}

impl Boundary {
    fn new(area: &BezPath, tolerance: f64) -> Self {
        let mut edges = Vec::new();
        let mut start: Option<Point> = None;
        let mut last: Option<Point> = None;

        kurbo::flatten(area.iter(), tolerance, |el| match el {
            PathEl::MoveTo(p) => {
                close_ring(&mut edges, start, last);
                start = Some(p);
                last = Some(p);
            }
            PathEl::LineTo(p) => {
                if let Some(from) = last {
                    if from != p {
                        edges.push(Line::new(from, p));
                    }
                }
                last = Some(p);
            }
            PathEl::ClosePath => {
                close_ring(&mut edges, start, last);
                last = start;
            }
            // Flattening only emits moves, lines and closes.
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        close_ring(&mut edges, start, last);

        let bounds = edges
            .iter()
            .map(|e| Rect::from_points(e.p0, e.p1))
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        Self { edges, bounds }
    }

    /// Nonzero winding number of the flattened area around a point.
    fn winding(&self, p: Point) -> i32 {
        let mut winding = 0;
        for edge in &self.edges {
            let (a, b) = (edge.p0, edge.p1);
            let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
            if a.y <= p.y {
                if b.y > p.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }

    fn near_edge(&self, p: Point, tolerance: f64) -> bool {
        self.edges
            .iter()
            .any(|e| point_to_segment_dist(p, e.p0, e.p1) <= tolerance)
    }

    fn covers(&self, p: Point, tolerance: f64) -> bool {
        self.winding(p) != 0 || self.near_edge(p, tolerance)
    }

    /// Cut a segment at its boundary crossings and classify each piece.
    fn split(&self, seg: PathSeg, tolerance: f64) -> Vec<Piece> {
        let seg_bounds = seg.bounding_box().inflate(tolerance, tolerance);
        let mut cuts = vec![0.0, 1.0];

        if rects_touch(seg_bounds, self.bounds) {
            for edge in &self.edges {
                if !rects_touch(seg_bounds, Rect::from_points(edge.p0, edge.p1)) {
                    continue;
                }
                for hit in seg.intersect_line(*edge) {
                    if hit.segment_t > 0.0 && hit.segment_t < 1.0 {
                        cuts.push(hit.segment_t);
                    }
                }
            }
        }

        cuts.sort_by(|a, b| a.total_cmp(b));
        cuts.dedup_by(|a, b| (*a - *b).abs() < T_EPSILON);
        if let Some(last) = cuts.last_mut() {
            *last = 1.0;
        }

        cuts.windows(2)
            .filter(|w| w[1] - w[0] >= T_EPSILON)
            .map(|w| {
                let mid = seg.eval((w[0] + w[1]) / 2.0);
                Piece {
                    seg: seg.subsegment(w[0]..w[1]),
                    covered: self.covers(mid, tolerance),
                }
            })
            .collect()
    }
}

fn close_ring(edges: &mut Vec<Line>, start: Option<Point>, last: Option<Point>) {
    if let (Some(start), Some(last)) = (start, last) {
        if start != last {
            edges.push(Line::new(last, start));
        }
    }
}

/// Distance from a point to the segment a-b.
fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

fn run_length(run: &[PathSeg]) -> f64 {
    run.iter().map(|seg| seg.arclen(ARCLEN_ACCURACY)).sum()
}

fn run_to_path(run: &[PathSeg]) -> InkPath {
    let start = run.first().map(|seg| seg.start()).unwrap_or(Point::ZERO);
    let mut path = InkPath::new(start);
    for seg in run {
        path.push_seg(*seg);
    }
    path
}

fn subpath_to_path(segs: &[PathSeg], closed: bool) -> InkPath {
    let mut path = run_to_path(segs);
    if closed {
        path.close();
    }
    path
}
