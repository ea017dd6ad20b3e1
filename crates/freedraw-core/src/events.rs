//! Notifications queued for the host.
//!
//! The session never calls back into the host. It queues value events which
//! the host drains after each gesture callback and applies to its own views.

use crate::annotation::{AnnotationId, SerializableColor};
use crate::path::InkPath;
use kurbo::BezPath;

/// Live preview of the stroke in progress, in overlay space.
///
/// Every `PreviewUpdated` replaces the previous preview entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// Zero-width paths being drawn or the surviving part of an erased stroke.
    pub paths: Vec<InkPath>,
    /// Filled outline of `paths` at `width`.
    pub outline: BezPath,
    pub color: SerializableColor,
    /// Line width in overlay units.
    pub width: f64,
}

/// Events emitted by a stroke session.
#[derive(Debug, Clone, PartialEq)]
pub enum FreedrawEvent {
    /// A gesture started or stopped counting as drawing.
    DrawingStateChanged { is_drawing: bool },
    /// Undo or redo availability flipped for the current page.
    UndoRedoAvailabilityChanged { can_undo: bool, can_redo: bool },
    PreviewUpdated(Preview),
    PreviewCleared,
    /// The host should hide this annotation while it is being erased.
    AnnotationHidden { id: AnnotationId },
    /// The host should show this annotation again with its original color.
    AnnotationRevealed {
        id: AnnotationId,
        color: SerializableColor,
    },
}
