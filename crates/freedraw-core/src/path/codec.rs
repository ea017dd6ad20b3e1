//! Path serialization for the annotation metadata slot.
//!
//! The format is a JSON array of records, one per segment:
//!
//! ```json
//! [
//!   {"type": "move", "point": {"x": 0.0, "y": 0.0}},
//!   {"type": "addLine", "point": {"x": 10.0, "y": 0.0}},
//!   {"type": "addQuadCurve", "point": {...}, "controlPoint": {...}},
//!   {"type": "addCurve", "point": {...}, "controlPoint1": {...}, "controlPoint2": {...}}
//! ]
//! ```
//!
//! Closed paths end with a `{"type": "close"}` record.

use super::{InkPath, PathSegment};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed path data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Path data holds no records")]
    Empty,
    #[error("Path data must start with a move record, found {0}")]
    MissingMove(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Record {
    #[serde(rename = "move")]
    Move { point: Point },
    #[serde(rename = "addLine")]
    AddLine { point: Point },
    #[serde(rename = "addQuadCurve")]
    AddQuadCurve {
        point: Point,
        #[serde(rename = "controlPoint")]
        control_point: Point,
    },
    #[serde(rename = "addCurve")]
    AddCurve {
        point: Point,
        #[serde(rename = "controlPoint1")]
        control_point1: Point,
        #[serde(rename = "controlPoint2")]
        control_point2: Point,
    },
    #[serde(rename = "close")]
    Close,
}

impl Record {
    fn name(&self) -> &'static str {
        match self {
            Record::Move { .. } => "move",
            Record::AddLine { .. } => "addLine",
            Record::AddQuadCurve { .. } => "addQuadCurve",
            Record::AddCurve { .. } => "addCurve",
            Record::Close => "close",
        }
    }
}

impl From<&PathSegment> for Record {
    fn from(segment: &PathSegment) -> Self {
        match *segment {
            PathSegment::MoveTo(point) => Record::Move { point },
            PathSegment::LineTo(point) => Record::AddLine { point },
            PathSegment::QuadTo { control, to } => Record::AddQuadCurve {
                point: to,
                control_point: control,
            },
            PathSegment::CubicTo {
                control1,
                control2,
                to,
            } => Record::AddCurve {
                point: to,
                control_point1: control1,
                control_point2: control2,
            },
        }
    }
}

/// Serialize a path to bytes, preserving segment order and kind.
pub fn encode(path: &InkPath) -> Result<Vec<u8>, CodecError> {
    let mut records: Vec<Record> = path.segments().iter().map(Record::from).collect();
    if path.is_closed() {
        records.push(Record::Close);
    }
    Ok(serde_json::to_vec(&records)?)
}

/// Deserialize a path previously produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<InkPath, CodecError> {
    let records: Vec<Record> = serde_json::from_slice(bytes)?;
    let first = records.first().ok_or(CodecError::Empty)?;
    if !matches!(first, Record::Move { .. }) {
        return Err(CodecError::MissingMove(first.name()));
    }

    let mut segments = Vec::with_capacity(records.len());
    let mut closed = false;
    for record in records {
        let segment = match record {
            Record::Move { point } => PathSegment::MoveTo(point),
            Record::AddLine { point } => PathSegment::LineTo(point),
            Record::AddQuadCurve {
                point,
                control_point,
            } => PathSegment::QuadTo {
                control: control_point,
                to: point,
            },
            Record::AddCurve {
                point,
                control_point1,
                control_point2,
            } => PathSegment::CubicTo {
                control1: control_point1,
                control2: control_point2,
                to: point,
            },
            Record::Close => {
                closed = true;
                continue;
            }
        };
        segments.push(segment);
    }

    InkPath::from_segments(segments, closed).ok_or(CodecError::Empty)
}

impl InkPath {
    /// Encode as the string stored in an annotation's metadata slot.
    pub fn to_metadata(&self) -> Result<String, CodecError> {
        let bytes = encode(self)?;
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode from an annotation's metadata slot.
    pub fn from_metadata(metadata: &str) -> Result<Self, CodecError> {
        decode(metadata.as_bytes())
    }
}
