//! Erasing and splitting annotations under an eraser gesture.
//!
//! Each step recomputes the difference between the targeted annotation's
//! full original path and the eraser stroke so far, so the result depends
//! only on the eraser prefix. The store is not touched until the split is
//! finalized, either because another annotation is hit or the gesture ends.

use crate::annotation::{Annotation, AnnotationId, PageIndex, SerializableColor};
use crate::config::{FreedrawConfig, SplitPolicy};
use crate::coords::CoordinateSpace;
use crate::events::{FreedrawEvent, Preview};
use crate::geometry::{self, ClipOutcome};
use crate::history::{UndoEntry, UndoHistory};
use crate::path::InkPath;
use crate::store::AnnotationStore;
use kurbo::{BezPath, Point};

/// An ink annotation being split by the current eraser gesture.
#[derive(Debug, Clone)]
pub struct PendingSplit {
    /// Annotation being erased.
    pub target: AnnotationId,
    /// Color to show the annotation with again if it survives untouched.
    pub original_color: SerializableColor,
    original: Annotation,
    /// The original path in overlay space.
    original_overlay: InkPath,
    /// Latest difference, in overlay space.
    outcome: ClipOutcome,
}

impl PendingSplit {
    pub fn original(&self) -> &Annotation {
        &self.original
    }

    pub fn outcome(&self) -> &ClipOutcome {
        &self.outcome
    }

    /// Paths that would replace the original, in overlay space.
    fn surviving(&self, policy: SplitPolicy) -> Vec<InkPath> {
        let paths = self.outcome.clone().into_paths(&self.original_overlay);
        match policy {
            SplitPolicy::FirstPiece => paths.into_iter().take(1).collect(),
            SplitPolicy::AllPieces => paths,
        }
    }
}

/// Everything an erase step reads or mutates outside the gesture itself.
pub(crate) struct EraseContext<'a> {
    pub page: PageIndex,
    pub space: CoordinateSpace,
    pub config: &'a FreedrawConfig,
    pub history: &'a mut UndoHistory,
    pub events: &'a mut Vec<FreedrawEvent>,
    pub store: &'a mut dyn AnnotationStore,
}

/// Eraser state for one gesture.
#[derive(Debug, Default)]
pub(crate) struct Eraser {
    pending: Option<PendingSplit>,
}

impl Eraser {
    pub fn pending(&self) -> Option<&PendingSplit> {
        self.pending.as_ref()
    }

    /// Run one erase step.
    ///
    /// `page_path` and `overlay_path` are the eraser stroke so far; the last
    /// point of `page_path` is the current touch position.
    pub fn step(&mut self, cx: &mut EraseContext<'_>, page_path: &InkPath, overlay_path: &InkPath) {
        let eraser_area = geometry::stroke_to_area(overlay_path, cx.config.eraser_width);
        // Far enough to catch both the eraser outline and the widened hit test.
        let reach = cx.space.overlay_length_to_page(cx.config.eraser_width / 2.0)
            + cx.config.hit_tolerance / 2.0;
        let sweep = page_path.bounds().inflate(reach, reach);
        let touch = page_path.last_point();

        if let Some(pending) = self.pending.as_mut() {
            pending.outcome =
                geometry::clip(&pending.original_overlay, &eraser_area, &cx.config.clip);
            let preview = preview_for(pending, cx);
            cx.events.push(FreedrawEvent::PreviewUpdated(preview));
        }

        let mut store_changed = false;
        for annotation in cx.store.annotations(cx.page) {
            if !geometry::rects_touch(annotation.bounds, sweep) {
                continue;
            }
            if self.pending.as_ref().is_some_and(|p| p.target == annotation.id()) {
                continue;
            }
            // Entries of the listing may have been removed earlier in this step.
            if store_changed && cx.store.get(cx.page, annotation.id()).is_none() {
                continue;
            }
            let page_geometry = annotation.page_path();
            if !is_hit(&annotation, page_geometry.as_ref(), touch, cx.config) {
                continue;
            }

            if !annotation.is_ink() || !cx.config.split_ink_on_erase {
                remove_whole(cx, annotation);
                store_changed = true;
                continue;
            }

            // Hitting a new ink annotation commits the one in progress.
            store_changed |= self.pending.is_some();
            self.finalize(cx);

            let Some(page_geometry) = page_geometry else {
                continue;
            };
            let original_overlay = page_geometry.apply_affine(cx.space.page_to_overlay_transform());
            let outcome = geometry::clip(&original_overlay, &eraser_area, &cx.config.clip);
            log::debug!("Started splitting annotation {}", annotation.id());
            cx.events.push(FreedrawEvent::AnnotationHidden { id: annotation.id() });
            let pending = PendingSplit {
                target: annotation.id(),
                original_color: annotation.style.color,
                original: annotation,
                original_overlay,
                outcome,
            };
            let preview = preview_for(&pending, cx);
            cx.events.push(FreedrawEvent::PreviewUpdated(preview));
            self.pending = Some(pending);
        }
    }

    /// Commit the pending split, if any.
    ///
    /// The original is replaced by the surviving pieces (none if it was
    /// fully erased) in one undo entry. An annotation the eraser never
    /// actually cut is just shown again.
    pub fn finalize(&mut self, cx: &mut EraseContext<'_>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        cx.events.push(FreedrawEvent::PreviewCleared);

        if pending.outcome.is_untouched() {
            log::debug!("Annotation {} was not cut, leaving it in place", pending.target);
            cx.events.push(FreedrawEvent::AnnotationRevealed {
                id: pending.target,
                color: pending.original_color,
            });
            return;
        }

        let Some(original) = cx.store.remove(cx.page, pending.target) else {
            log::warn!(
                "Annotation {} disappeared from page {} while being erased",
                pending.target,
                cx.page
            );
            return;
        };

        let to_page = cx.space.overlay_to_page_transform();
        let replacements: Vec<Annotation> = pending
            .surviving(cx.config.split_policy)
            .iter()
            .map(|piece| original.replacement(&piece.apply_affine(to_page)))
            .collect();
        for replacement in &replacements {
            cx.store.add(replacement.clone());
        }
        log::debug!(
            "Split annotation {} into {} replacement(s)",
            original.id(),
            replacements.len()
        );
        cx.history.push(UndoEntry::Erased {
            original,
            replacements,
        });
    }

    /// Drop the pending split without touching the store.
    pub fn cancel(&mut self, events: &mut Vec<FreedrawEvent>) {
        if let Some(pending) = self.pending.take() {
            events.push(FreedrawEvent::PreviewCleared);
            events.push(FreedrawEvent::AnnotationRevealed {
                id: pending.target,
                color: pending.original_color,
            });
        }
    }
}

/// Exact hit test at the touch point.
///
/// Annotations with geometry are tested against their outline widened by the
/// hit tolerance. Non-ink annotations without geometry fall back to their
/// bounds; ink without a usable path cannot be hit.
fn is_hit(
    annotation: &Annotation,
    page_geometry: Option<&InkPath>,
    touch: Point,
    config: &FreedrawConfig,
) -> bool {
    match page_geometry {
        Some(path) => {
            geometry::hit_test(path, annotation.style.width + config.hit_tolerance, touch)
        }
        None if !annotation.is_ink() => geometry::rect_contains(annotation.bounds, touch),
        None => {
            log::debug!("Skipping annotation {} with no usable path", annotation.id());
            false
        }
    }
}

fn remove_whole(cx: &mut EraseContext<'_>, annotation: Annotation) {
    if let Some(original) = cx.store.remove(cx.page, annotation.id()) {
        log::debug!("Erased annotation {} whole", original.id());
        cx.history.push(UndoEntry::Erased {
            original,
            replacements: Vec::new(),
        });
    }
}

fn preview_for(pending: &PendingSplit, cx: &EraseContext<'_>) -> Preview {
    let width = pending.original.style.width * cx.space.scale;
    let paths = pending.surviving(cx.config.split_policy);
    let mut outline = BezPath::new();
    for path in &paths {
        for el in geometry::stroke_to_area(path, width).elements() {
            outline.push(*el);
        }
    }
    Preview {
        paths,
        outline,
        color: pending.original_color,
        width,
    }
}
