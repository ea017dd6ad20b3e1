//! Gesture scripts and their replay against an in-memory store.
//!
//! A script is a JSON document:
//! ```json
//! {
//!   "config": { "width": 3.0 },
//!   "strokes": [ { "page": 0, "points": [{ "x": 0, "y": 0 }, { "x": 100, "y": 0 }] } ],
//!   "steps": [
//!     { "type": "ink", "ink": "eraser" },
//!     { "type": "begin", "page": 0, "x": 50, "y": -30 },
//!     { "type": "move", "x": 50, "y": 0 },
//!     { "type": "end", "x": 50, "y": 30 },
//!     { "type": "undo", "page": 0 }
//!   ]
//! }
//! ```

use freedraw_core::{
    Annotation, AnnotationStore, CoordinateSpace, FreedrawConfig, FreedrawEvent, GestureContext,
    InkKind, InkPath, InkStyle, MemoryStore, PageIndex, StrokeSession,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] freedraw_core::Error),
    #[error("Seed stroke {0} has neither points nor an encoded path")]
    EmptySeed(usize),
}

/// An annotation present on the page before the script runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedStroke {
    #[serde(default)]
    pub page: PageIndex,
    #[serde(default)]
    pub style: InkStyle,
    /// Page-space sample points.
    #[serde(default)]
    pub points: Vec<Point>,
    /// Page-space path in the metadata encoding, used instead of `points`.
    #[serde(default)]
    pub path: Option<String>,
}

/// One host callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Begin {
        #[serde(default)]
        page: PageIndex,
        x: f64,
        y: f64,
        #[serde(default)]
        space: CoordinateSpace,
        #[serde(default = "one")]
        touches: usize,
    },
    Move { x: f64, y: f64 },
    End { x: f64, y: f64 },
    Cancel,
    Undo { page: PageIndex },
    Redo { page: PageIndex },
    /// Switch the ink kind, keeping the rest of the configuration.
    Ink { ink: InkKind },
    /// Replace the whole configuration.
    Configure { config: FreedrawConfig },
    /// Tell the session the host moved to another page.
    ShowPage { page: PageIndex },
}

fn one() -> usize {
    1
}

/// A complete replay script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: FreedrawConfig,
    #[serde(default)]
    pub strokes: Vec<SeedStroke>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ScriptError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Events emitted by one step.
#[derive(Debug)]
pub struct StepLog {
    pub index: usize,
    pub step: Step,
    pub events: Vec<FreedrawEvent>,
}

/// Outcome of running a script.
#[derive(Debug)]
pub struct Replay {
    pub store: MemoryStore,
    pub log: Vec<StepLog>,
}

/// Run a script from a fresh session and store.
pub fn run(script: &Script) -> Result<Replay, ScriptError> {
    let mut store = MemoryStore::new();
    for (index, seed) in script.strokes.iter().enumerate() {
        store.add(seed_annotation(index, seed)?);
    }
    log::info!("Seeded {} annotation(s)", store.len());

    let mut session = StrokeSession::new(script.config.clone())?;
    let mut log = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        apply(&mut session, &mut store, step)?;
        log.push(StepLog {
            index,
            step: step.clone(),
            events: session.drain_events(),
        });
    }
    Ok(Replay { store, log })
}

fn seed_annotation(index: usize, seed: &SeedStroke) -> Result<Annotation, ScriptError> {
    let path = match &seed.path {
        Some(encoded) => InkPath::from_metadata(encoded).map_err(freedraw_core::Error::from)?,
        None => InkPath::from_points(&seed.points).ok_or(ScriptError::EmptySeed(index))?,
    };
    Ok(Annotation::ink(seed.page, &path, seed.style.clone()))
}

fn apply(
    session: &mut StrokeSession,
    store: &mut MemoryStore,
    step: &Step,
) -> Result<(), ScriptError> {
    match step {
        Step::Begin {
            page,
            x,
            y,
            space,
            touches,
        } => {
            let cx = GestureContext::new(*page, *space).with_touch_count(*touches);
            if !session.begin(&cx, Point::new(*x, *y)) {
                log::info!("Gesture start on page {} was rejected", page);
            }
        }
        Step::Move { x, y } => session.update(store, Point::new(*x, *y)),
        Step::End { x, y } => session.end(store, Point::new(*x, *y)),
        Step::Cancel => session.cancel(),
        Step::Undo { page } => {
            session.undo(*page, store);
        }
        Step::Redo { page } => {
            session.redo(*page, store);
        }
        Step::Ink { ink } => {
            let config = FreedrawConfig {
                ink: *ink,
                ..session.config().clone()
            };
            session.set_config(config).map_err(freedraw_core::Error::from)?;
        }
        Step::Configure { config } => {
            session
                .set_config(config.clone())
                .map_err(freedraw_core::Error::from)?;
        }
        Step::ShowPage { page } => session.refresh_availability(*page),
    }
    Ok(())
}

/// One-line description of an event.
pub fn describe(event: &FreedrawEvent) -> String {
    match event {
        FreedrawEvent::DrawingStateChanged { is_drawing } => {
            format!("drawing: {}", is_drawing)
        }
        FreedrawEvent::UndoRedoAvailabilityChanged { can_undo, can_redo } => {
            format!("undo: {}, redo: {}", can_undo, can_redo)
        }
        FreedrawEvent::PreviewUpdated(preview) => format!(
            "preview: {} path(s), width {:.2}",
            preview.paths.len(),
            preview.width
        ),
        FreedrawEvent::PreviewCleared => "preview cleared".to_string(),
        FreedrawEvent::AnnotationHidden { id } => format!("hide {}", id),
        FreedrawEvent::AnnotationRevealed { id, .. } => format!("reveal {}", id),
    }
}

/// Annotations on a page, for printing.
pub fn summarize(store: &MemoryStore, page: PageIndex) -> Vec<String> {
    store
        .annotations(page)
        .iter()
        .map(|a| {
            format!(
                "{} {:?} bounds=({:.1}, {:.1}, {:.1}, {:.1})",
                a.id(),
                a.style.ink,
                a.bounds.x0,
                a.bounds.y0,
                a.bounds.x1,
                a.bounds.y1
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAW_THEN_SPLIT: &str = r#"{
        "config": { "width": 3.0 },
        "steps": [
            { "type": "begin", "page": 0, "x": 0, "y": 0 },
            { "type": "move", "x": 50, "y": 0 },
            { "type": "end", "x": 100, "y": 0 },
            { "type": "ink", "ink": "eraser" },
            { "type": "begin", "page": 0, "x": 50, "y": -30 },
            { "type": "move", "x": 50, "y": -20 },
            { "type": "move", "x": 50, "y": 0 },
            { "type": "end", "x": 50, "y": 30 }
        ]
    }"#;

    #[test]
    fn test_draw_then_split() {
        let script = Script::from_json(DRAW_THEN_SPLIT).unwrap();
        let replay = run(&script).unwrap();

        assert_eq!(replay.store.len(), 1);
        let piece = &replay.store.page(0)[0];
        assert!((piece.bounds.x1 - 31.5).abs() < 0.2);
        assert_eq!(replay.log.len(), 8);
        assert!(replay.log[2].events.iter().any(|e| matches!(
            e,
            FreedrawEvent::UndoRedoAvailabilityChanged { can_undo: true, .. }
        )));
    }

    #[test]
    fn test_seeded_strokes_and_undo() {
        let encoded = InkPath::from_points(&[Point::new(0.0, 10.0), Point::new(80.0, 10.0)])
            .unwrap()
            .to_metadata()
            .unwrap();
        let script = Script {
            strokes: vec![
                SeedStroke {
                    page: 1,
                    style: InkStyle::default(),
                    points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
                    path: None,
                },
                SeedStroke {
                    page: 1,
                    style: InkStyle::default(),
                    points: Vec::new(),
                    path: Some(encoded),
                },
            ],
            steps: vec![
                Step::Undo { page: 1 },
                Step::ShowPage { page: 1 },
            ],
            ..Script::default()
        };
        let replay = run(&script).unwrap();

        // Seeded annotations are not in the history.
        assert_eq!(replay.store.page(1).len(), 2);
        assert!(replay.log.iter().all(|s| s.events.is_empty()));
    }

    #[test]
    fn test_rejected_multi_touch_is_logged_not_failed() {
        let script = Script::from_json(
            r#"{ "steps": [
                { "type": "begin", "x": 0, "y": 0, "touches": 2 },
                { "type": "end", "x": 100, "y": 0 }
            ] }"#,
        )
        .unwrap();
        let replay = run(&script).unwrap();
        assert!(replay.store.is_empty());
    }

    #[test]
    fn test_bad_seed_reported() {
        let script = Script {
            strokes: vec![SeedStroke {
                page: 0,
                style: InkStyle::default(),
                points: Vec::new(),
                path: None,
            }],
            ..Script::default()
        };
        assert!(matches!(run(&script), Err(ScriptError::EmptySeed(0))));

        let script = Script {
            strokes: vec![SeedStroke {
                page: 0,
                style: InkStyle::default(),
                points: Vec::new(),
                path: Some("[]".to_string()),
            }],
            ..Script::default()
        };
        assert!(matches!(run(&script), Err(ScriptError::Core(_))));
    }

    #[test]
    fn test_invalid_config_step_fails() {
        let script = Script::from_json(
            r#"{ "steps": [ { "type": "configure", "config": { "eraser_width": 0 } } ] }"#,
        )
        .unwrap();
        assert!(matches!(run(&script), Err(ScriptError::Core(_))));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&FreedrawEvent::UndoRedoAvailabilityChanged {
                can_undo: true,
                can_redo: false
            }),
            "undo: true, redo: false"
        );
    }
}
