//! The gesture state machine.
//!
//! A session lives as long as the drawing surface. The host forwards every
//! gesture callback in order (`begin`, any number of `update`, then `end` or
//! `cancel`), passes its annotation store to the calls that may mutate it,
//! and drains the queued events afterwards.

use crate::annotation::{Annotation, InkKind, InkStyle, PageIndex};
use crate::config::{ConfigError, FreedrawConfig};
use crate::coords::CoordinateSpace;
use crate::eraser::{EraseContext, Eraser, PendingSplit};
use crate::events::{FreedrawEvent, Preview};
use crate::geometry;
use crate::history::{UndoEntry, UndoHistory};
use crate::path::InkPath;
use crate::store::AnnotationStore;
use crate::Error;
use kurbo::Point;

/// Externally visible phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    /// Tracking a gesture.
    Active,
    /// Turning a finished gesture into store mutations.
    Committing,
}

/// Host state a gesture starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    /// Page under the touch.
    pub page: PageIndex,
    /// Current zoom and page placement.
    pub space: CoordinateSpace,
    /// Number of touches currently down.
    pub touch_count: usize,
    /// Whether the host has a page and view ready to draw on.
    pub host_ready: bool,
}

impl GestureContext {
    /// A single-touch gesture on a ready page.
    pub fn new(page: PageIndex, space: CoordinateSpace) -> Self {
        Self {
            page,
            space,
            touch_count: 1,
            host_ready: true,
        }
    }

    pub fn with_touch_count(mut self, touch_count: usize) -> Self {
        self.touch_count = touch_count;
        self
    }

    pub fn with_host_ready(mut self, host_ready: bool) -> Self {
        self.host_ready = host_ready;
        self
    }
}

/// One continuous gesture.
#[derive(Debug)]
struct Gesture {
    page: PageIndex,
    space: CoordinateSpace,
    style: InkStyle,
    last_device: Point,
    /// Device-space distance covered so far.
    travelled: f64,
    /// Whether the gesture has travelled far enough to count as drawing.
    confirmed: bool,
    page_path: InkPath,
    /// Same stroke in overlay space, for previews and the eraser outline.
    overlay_path: InkPath,
    eraser: Eraser,
}

impl Gesture {
    fn new(page: PageIndex, space: CoordinateSpace, style: InkStyle, start: Point) -> Self {
        Self {
            page,
            space,
            style,
            last_device: start,
            travelled: 0.0,
            confirmed: false,
            page_path: InkPath::new(space.device_to_page(start)),
            overlay_path: InkPath::new(space.device_to_overlay(start)),
            eraser: Eraser::default(),
        }
    }

    fn is_eraser(&self) -> bool {
        self.style.ink == InkKind::Eraser
    }

    /// Record a new position. Returns false while the gesture is still
    /// shorter than `threshold`; such positions are dropped.
    fn advance(&mut self, point: Point, threshold: f64) -> bool {
        self.travelled += self.last_device.distance(point);
        self.last_device = point;
        if !self.confirmed && self.travelled < threshold {
            return false;
        }
        self.confirmed = true;

        let page_point = self.space.device_to_page(point);
        if page_point != self.page_path.last_point() {
            self.page_path.line_to(page_point);
            self.overlay_path.line_to(self.space.device_to_overlay(point));
        }
        true
    }

    fn preview(&self) -> Preview {
        let width = self.style.width * self.space.scale;
        Preview {
            paths: vec![self.overlay_path.clone()],
            outline: geometry::stroke_to_area(&self.overlay_path, width),
            color: self.style.color,
            width,
        }
    }
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Idle,
    Active(Gesture),
    Committing,
}

/// Free-hand drawing and erasing on top of a paged document.
#[derive(Debug)]
pub struct StrokeSession {
    config: FreedrawConfig,
    history: UndoHistory,
    state: SessionState,
    events: Vec<FreedrawEvent>,
    /// Last drawing state reported to the host.
    drawing: bool,
}

impl Default for StrokeSession {
    fn default() -> Self {
        let config = FreedrawConfig::default();
        Self {
            history: UndoHistory::new(config.max_undo_entries),
            config,
            state: SessionState::Idle,
            events: Vec::new(),
            drawing: false,
        }
    }
}

impl StrokeSession {
    /// Create a session with a validated configuration.
    pub fn new(config: FreedrawConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            history: UndoHistory::new(config.max_undo_entries),
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &FreedrawConfig {
        &self.config
    }

    /// Replace the configuration. A gesture in progress keeps the style it
    /// started with.
    pub fn set_config(&mut self, config: FreedrawConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.history.set_max_entries(config.max_undo_entries);
        self.config = config;
        Ok(())
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Committing => SessionPhase::Committing,
        }
    }

    /// Whether the current gesture has been confirmed as drawing.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// The ink annotation currently being split, if any.
    pub fn pending_split(&self) -> Option<&PendingSplit> {
        match &self.state {
            SessionState::Active(gesture) => gesture.eraser.pending(),
            _ => None,
        }
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<FreedrawEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a gesture at a device-space position.
    ///
    /// Returns false, leaving the session idle, when more than one touch is
    /// down, the host is not ready, the coordinate space is unusable, or a
    /// gesture is already in progress.
    pub fn begin(&mut self, cx: &GestureContext, point: Point) -> bool {
        if !matches!(self.state, SessionState::Idle) {
            log::warn!("Gesture already in progress, ignoring new start");
            return false;
        }
        if cx.touch_count != 1 {
            log::warn!("Rejected gesture start with {} touches", cx.touch_count);
            return false;
        }
        if !cx.host_ready {
            log::warn!("No page ready for drawing, ignoring gesture");
            return false;
        }
        if !cx.space.is_valid() {
            log::warn!("Unusable coordinate space {:?}, ignoring gesture", cx.space);
            return false;
        }

        let style = self.config.stroke_style();
        log::debug!("Gesture started on page {} with {:?}", cx.page, style.ink);
        self.state = SessionState::Active(Gesture::new(cx.page, cx.space, style, point));
        true
    }

    /// Feed the next device-space position of the gesture.
    pub fn update(&mut self, store: &mut dyn AnnotationStore, point: Point) {
        let SessionState::Active(gesture) = &mut self.state else {
            return;
        };
        if !gesture.advance(point, self.config.min_gesture_distance) {
            return;
        }
        if !self.drawing {
            self.drawing = true;
            self.events
                .push(FreedrawEvent::DrawingStateChanged { is_drawing: true });
        }

        let page = gesture.page;
        if gesture.is_eraser() {
            let mut cx = EraseContext {
                page,
                space: gesture.space,
                config: &self.config,
                history: &mut self.history,
                events: &mut self.events,
                store,
            };
            gesture
                .eraser
                .step(&mut cx, &gesture.page_path, &gesture.overlay_path);
        } else {
            self.events
                .push(FreedrawEvent::PreviewUpdated(gesture.preview()));
        }
        self.emit_availability(page);
    }

    /// Finish the gesture at a device-space position and commit it.
    pub fn end(&mut self, store: &mut dyn AnnotationStore, point: Point) {
        let mut gesture = match std::mem::replace(&mut self.state, SessionState::Committing) {
            SessionState::Active(gesture) => gesture,
            other => {
                self.state = other;
                return;
            }
        };

        gesture.advance(point, self.config.min_gesture_distance);
        if !gesture.confirmed {
            log::debug!("Gesture too short, discarding");
            self.state = SessionState::Idle;
            return;
        }
        if !self.drawing {
            self.drawing = true;
            self.events
                .push(FreedrawEvent::DrawingStateChanged { is_drawing: true });
        }

        let page = gesture.page;
        if gesture.is_eraser() {
            let mut cx = EraseContext {
                page,
                space: gesture.space,
                config: &self.config,
                history: &mut self.history,
                events: &mut self.events,
                store,
            };
            gesture
                .eraser
                .step(&mut cx, &gesture.page_path, &gesture.overlay_path);
            gesture.eraser.finalize(&mut cx);
        } else {
            self.commit_stroke(store, gesture);
            self.events.push(FreedrawEvent::PreviewCleared);
        }

        self.drawing = false;
        self.events
            .push(FreedrawEvent::DrawingStateChanged { is_drawing: false });
        self.emit_availability(page);
        self.state = SessionState::Idle;
    }

    /// Abandon the gesture. Nothing is committed; mutations already made by
    /// earlier erase steps stay in the store and in history.
    pub fn cancel(&mut self) {
        let mut gesture = match std::mem::take(&mut self.state) {
            SessionState::Active(gesture) => gesture,
            other => {
                self.state = other;
                return;
            }
        };
        if gesture.is_eraser() {
            gesture.eraser.cancel(&mut self.events);
        } else if gesture.confirmed {
            self.events.push(FreedrawEvent::PreviewCleared);
        }
        log::debug!("Gesture on page {} cancelled", gesture.page);
        self.drawing = false;
        self.events
            .push(FreedrawEvent::DrawingStateChanged { is_drawing: false });
    }

    /// Undo the last mutation on a page. No-op while a gesture is active.
    pub fn undo(&mut self, page: PageIndex, store: &mut dyn AnnotationStore) -> bool {
        if !matches!(self.state, SessionState::Idle) {
            log::warn!("Ignoring undo during a gesture");
            return false;
        }
        let undone = self.history.undo(page, store);
        self.emit_availability(page);
        undone
    }

    /// Redo the last undone mutation on a page. No-op while a gesture is active.
    pub fn redo(&mut self, page: PageIndex, store: &mut dyn AnnotationStore) -> bool {
        if !matches!(self.state, SessionState::Idle) {
            log::warn!("Ignoring redo during a gesture");
            return false;
        }
        let redone = self.history.redo(page, store);
        self.emit_availability(page);
        redone
    }

    /// Re-evaluate undo/redo availability, e.g. after the host switched pages.
    pub fn refresh_availability(&mut self, page: PageIndex) {
        self.emit_availability(page);
    }

    fn emit_availability(&mut self, page: PageIndex) {
        if let Some(availability) = self.history.availability_change(page) {
            self.events.push(FreedrawEvent::UndoRedoAvailabilityChanged {
                can_undo: availability.can_undo,
                can_redo: availability.can_redo,
            });
        }
    }

    fn commit_stroke(&mut self, store: &mut dyn AnnotationStore, gesture: Gesture) {
        let half = gesture.style.width / 2.0;
        let bounds = gesture.page_path.bounds().inflate(half, half);
        let path = if self.config.convert_closed_curves_to_ovals
            && gesture.page_path.resembles_oval(
                self.config.oval_closure_tolerance,
                self.config.oval_step_tolerance,
            ) {
            log::debug!("Closed stroke replaced with an oval");
            InkPath::open_oval_in(bounds)
        } else {
            gesture.page_path
        };

        let annotation = Annotation::ink_in(gesture.page, bounds, &path, gesture.style);
        log::debug!(
            "Added annotation {} on page {}",
            annotation.id(),
            annotation.page
        );
        store.add(annotation.clone());
        self.history.push(UndoEntry::Added(annotation));
    }
}
