//! Freedraw Core Library
//!
//! Free-hand ink annotation of paged documents: drawing pen and highlighter
//! strokes, erasing and splitting existing strokes, and per-page undo/redo.
//! Rendering and touch dispatch belong to the host, which talks to a
//! [`StrokeSession`] and implements [`AnnotationStore`].

pub mod annotation;
pub mod config;
pub mod coords;
mod eraser;
pub mod events;
pub mod geometry;
pub mod history;
pub mod path;
pub mod session;
pub mod store;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, InkKind, InkStyle, PageIndex, SerializableColor,
    Stroke,
};
pub use config::{ConfigError, FreedrawConfig, SplitPolicy};
pub use coords::CoordinateSpace;
pub use eraser::PendingSplit;
pub use events::{FreedrawEvent, Preview};
pub use geometry::{ClipOptions, ClipOutcome};
pub use history::{Availability, UndoEntry, UndoHistory};
pub use path::{CodecError, InkPath, PathSegment};
pub use session::{GestureContext, SessionPhase, StrokeSession};
pub use store::{AnnotationStore, MemoryStore};

use thiserror::Error;

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for fallible host-facing calls.
pub type Result<T> = std::result::Result<T, Error>;
