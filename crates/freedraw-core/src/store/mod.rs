//! Host document abstraction.

mod memory;

pub use memory::MemoryStore;

use crate::annotation::{Annotation, AnnotationId, PageIndex};

/// The page collection the core adds annotations to and removes them from.
///
/// The host owns the records. Calls arrive serially from a single gesture
/// session; hosts that share a store between threads must serialize access
/// per page themselves.
pub trait AnnotationStore {
    /// Annotations on a page, back to front.
    fn annotations(&self, page: PageIndex) -> Vec<Annotation>;

    /// Add an annotation to its page.
    fn add(&mut self, annotation: Annotation);

    /// Remove an annotation, returning it if it was present.
    fn remove(&mut self, page: PageIndex, id: AnnotationId) -> Option<Annotation>;

    /// Look up a single annotation.
    fn get(&self, page: PageIndex, id: AnnotationId) -> Option<Annotation> {
        self.annotations(page).into_iter().find(|a| a.id() == id)
    }
}
