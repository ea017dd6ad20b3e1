//! Annotation records attached to document pages.
//!
//! The host document owns annotation identity and lifetime; the core builds
//! records, asks the host to add or remove them, and keeps copies in undo
//! history so they can be put back with the same id.

use crate::path::InkPath;
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for annotations.
pub type AnnotationId = Uuid;

/// Zero-based page number within the host document.
pub type PageIndex = usize;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }

    pub fn blue() -> Self {
        Self::new(0, 0, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// The same color with its alpha replaced (0.0 to 1.0).
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::red()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Drawing behavior of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

/// Style attributes of an ink stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkStyle {
    /// Line width in page units.
    pub width: f64,
    /// Stroke color, alpha already applied.
    pub color: SerializableColor,
    /// Ink kind the stroke was drawn with.
    pub ink: InkKind,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            color: SerializableColor::default(),
            ink: InkKind::Pen,
        }
    }
}

/// A path together with its style.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Path local to the annotation bounds.
    pub path: InkPath,
    pub style: InkStyle,
}

/// What kind of annotation a record is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Free-hand ink; can be split by the eraser.
    Ink,
    /// Any other host annotation type; only ever removed whole.
    Other(String),
}

/// An annotation on a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub(crate) id: AnnotationId,
    /// Page the annotation lives on.
    pub page: PageIndex,
    /// Bounding rectangle in page space.
    pub bounds: Rect,
    pub kind: AnnotationKind,
    pub style: InkStyle,
    /// Natively stored path, local to `bounds`. Hosts may fail to reload it.
    pub path: Option<InkPath>,
    /// Free-form metadata slot holding the encoded path.
    pub metadata: Option<String>,
}

impl Annotation {
    /// Build an ink annotation from a page-space path.
    ///
    /// The bounds are the path's bounds inflated by half the line width.
    pub fn ink(page: PageIndex, page_path: &InkPath, style: InkStyle) -> Self {
        let half = style.width / 2.0;
        let bounds = page_path.bounds().inflate(half, half);
        Self::ink_in(page, bounds, page_path, style)
    }

    /// Build an ink annotation with explicit bounds.
    ///
    /// The path is stored local to `bounds` and centered on it; the encoded
    /// copy goes into the metadata slot.
    pub fn ink_in(page: PageIndex, bounds: Rect, page_path: &InkPath, style: InkStyle) -> Self {
        let local_center = Point::new(bounds.width() / 2.0, bounds.height() / 2.0);
        let local = page_path.translate_center_to(local_center);
        let metadata = match local.to_metadata() {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                log::warn!("Failed to encode annotation path: {}", e);
                None
            }
        };
        Self {
            id: Uuid::new_v4(),
            page,
            bounds,
            kind: AnnotationKind::Ink,
            style,
            path: Some(local),
            metadata,
        }
    }

    /// A non-ink annotation created by the host.
    pub fn other(page: PageIndex, bounds: Rect, subtype: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            bounds,
            kind: AnnotationKind::Other(subtype.into()),
            style: InkStyle::default(),
            path: None,
            metadata: None,
        }
    }

    /// Replace the identifier (for host-owned ids).
    pub fn with_id(mut self, id: AnnotationId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn is_ink(&self) -> bool {
        self.kind == AnnotationKind::Ink
    }

    /// The local path, preferring the encoded copy in metadata.
    ///
    /// Undecodable metadata falls back to the native path. `None` means the
    /// annotation has no usable geometry.
    pub fn resolved_path(&self) -> Option<InkPath> {
        if let Some(metadata) = &self.metadata {
            match InkPath::from_metadata(metadata) {
                Ok(path) => return Some(path),
                Err(e) => log::warn!("Annotation {} has unreadable path metadata: {}", self.id, e),
            }
        }
        self.path.clone()
    }

    /// The resolved path moved into page space.
    pub fn page_path(&self) -> Option<InkPath> {
        self.resolved_path()
            .map(|p| p.apply_affine(Affine::translate(self.bounds.origin().to_vec2())))
    }

    /// Path and style together.
    pub fn stroke(&self) -> Option<Stroke> {
        self.resolved_path().map(|path| Stroke {
            path,
            style: self.style.clone(),
        })
    }

    /// A new ink annotation on the same page with this one's style.
    pub fn replacement(&self, page_path: &InkPath) -> Self {
        Self::ink(self.page, page_path, self.style.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(width: f64) -> InkStyle {
        InkStyle {
            width,
            color: SerializableColor::blue(),
            ink: InkKind::Pen,
        }
    }

    fn line() -> InkPath {
        InkPath::from_points(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]).unwrap()
    }

    #[test]
    fn test_ink_bounds_inflated_by_half_width() {
        let annotation = Annotation::ink(0, &line(), pen(3.0));
        assert_eq!(annotation.bounds, Rect::new(-1.5, -1.5, 101.5, 1.5));
        assert!(annotation.is_ink());
    }

    #[test]
    fn test_path_stored_local_and_centered() {
        let annotation = Annotation::ink(0, &line(), pen(3.0));
        let local = annotation.path.clone().unwrap();
        assert_eq!(local.bounds().center(), Point::new(51.5, 1.5));
        let page = annotation.page_path().unwrap();
        assert!((page.first_point() - Point::new(0.0, 0.0)).hypot() < 1e-9);
        assert!((page.last_point() - Point::new(100.0, 0.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_metadata_preferred_over_native_path() {
        let mut annotation = Annotation::ink(0, &line(), pen(2.0));
        annotation.path = None;
        assert!(annotation.resolved_path().is_some());
    }

    #[test]
    fn test_bad_metadata_falls_back_to_native_path() {
        let mut annotation = Annotation::ink(0, &line(), pen(2.0));
        let native = annotation.path.clone();
        annotation.metadata = Some("{broken".to_string());
        assert_eq!(annotation.resolved_path(), native);
    }

    #[test]
    fn test_no_geometry_resolves_to_none() {
        let mut annotation = Annotation::ink(0, &line(), pen(2.0));
        annotation.metadata = Some("[]".to_string());
        annotation.path = None;
        assert!(annotation.resolved_path().is_none());
        assert!(annotation.stroke().is_none());
    }

    #[test]
    fn test_replacement_keeps_style_and_page() {
        let original = Annotation::ink(4, &line(), pen(5.0));
        let piece = InkPath::from_points(&[Point::new(0.0, 0.0), Point::new(40.0, 0.0)]).unwrap();
        let replacement = original.replacement(&piece);
        assert_ne!(replacement.id(), original.id());
        assert_eq!(replacement.page, 4);
        assert_eq!(replacement.style, original.style);
        assert_eq!(replacement.bounds, Rect::new(-2.5, -2.5, 42.5, 2.5));
    }

    #[test]
    fn test_color_alpha_and_peniko_conversion() {
        let color = SerializableColor::red().with_alpha(0.3);
        assert_eq!(color.a, 77);
        let round: SerializableColor = Color::from(color).into();
        assert_eq!(round, color);
    }
}
