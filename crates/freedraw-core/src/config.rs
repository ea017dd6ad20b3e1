//! Per-session drawing configuration.

use crate::annotation::{InkKind, InkStyle, SerializableColor};
use crate::geometry::ClipOptions;
use crate::history::DEFAULT_MAX_UNDO_ENTRIES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("highlighter_alpha must be between 0 and 1, got {0}")]
    AlphaOutOfRange(f64),
}

/// What to do when erasing splits an ink stroke into several pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Keep only the first surviving piece.
    #[default]
    FirstPiece,
    /// Keep every piece as its own annotation.
    AllPieces,
}

/// Drawing configuration, held by value by each session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreedrawConfig {
    /// Stroke color for pen and highlighter.
    pub color: SerializableColor,
    /// Stroke width in page units.
    pub width: f64,
    /// Current ink kind.
    pub ink: InkKind,
    /// Alpha applied to highlighter strokes.
    pub highlighter_alpha: f64,
    /// Undo entries kept per page (0 = unbounded).
    pub max_undo_entries: usize,
    /// Replace closed free-hand loops with an oval.
    pub convert_closed_curves_to_ovals: bool,
    /// Split ink annotations instead of removing them whole.
    pub split_ink_on_erase: bool,
    /// Eraser stroke width in overlay units.
    pub eraser_width: f64,
    /// Extra width added to an annotation's outline when hit testing.
    pub hit_tolerance: f64,
    /// Distance a gesture must travel before it counts as drawing.
    pub min_gesture_distance: f64,
    /// Max start-to-end distance for a stroke to count as a closed loop.
    pub oval_closure_tolerance: f64,
    /// Max distance between adjacent samples of a closed loop.
    pub oval_step_tolerance: f64,
    pub split_policy: SplitPolicy,
    pub clip: ClipOptions,
}

impl Default for FreedrawConfig {
    fn default() -> Self {
        Self {
            color: SerializableColor::red(),
            width: 3.0,
            ink: InkKind::Pen,
            highlighter_alpha: 0.3,
            max_undo_entries: DEFAULT_MAX_UNDO_ENTRIES,
            convert_closed_curves_to_ovals: false,
            split_ink_on_erase: true,
            eraser_width: 40.0,
            hit_tolerance: 10.0,
            min_gesture_distance: 10.0,
            oval_closure_tolerance: 10.0,
            oval_step_tolerance: 20.0,
            split_policy: SplitPolicy::FirstPiece,
            clip: ClipOptions::default(),
        }
    }
}

impl FreedrawConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("eraser_width", self.eraser_width)?;
        if !(0.0..=1.0).contains(&self.highlighter_alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.highlighter_alpha));
        }
        non_negative("hit_tolerance", self.hit_tolerance)?;
        non_negative("min_gesture_distance", self.min_gesture_distance)?;
        non_negative("oval_closure_tolerance", self.oval_closure_tolerance)?;
        non_negative("oval_step_tolerance", self.oval_step_tolerance)?;
        positive("clip.flatten_tolerance", self.clip.flatten_tolerance)?;
        non_negative("clip.boundary_tolerance", self.clip.boundary_tolerance)?;
        Ok(())
    }

    /// Style for a new stroke drawn with the current settings.
    pub fn stroke_style(&self) -> InkStyle {
        let color = match self.ink {
            InkKind::Highlighter => self.color.with_alpha(self.highlighter_alpha),
            _ => self.color,
        };
        InkStyle {
            width: self.width,
            color,
            ink: self.ink,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FreedrawConfig::default();
        assert_eq!(config.color, SerializableColor::red());
        assert_eq!(config.width, 3.0);
        assert_eq!(config.max_undo_entries, 10);
        assert_eq!(config.split_policy, SplitPolicy::FirstPiece);
        assert!(config.split_ink_on_erase);
        assert!(!config.convert_closed_curves_to_ovals);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FreedrawConfig::from_json(
            r#"{"width": 5.0, "ink": "highlighter", "split_policy": "all_pieces"}"#,
        )
        .unwrap();
        assert_eq!(config.width, 5.0);
        assert_eq!(config.ink, InkKind::Highlighter);
        assert_eq!(config.split_policy, SplitPolicy::AllPieces);
        assert_eq!(config.eraser_width, 40.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = FreedrawConfig {
            max_undo_entries: 0,
            convert_closed_curves_to_ovals: true,
            ..FreedrawConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(FreedrawConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            FreedrawConfig::from_json(r#"{"width": 0}"#),
            Err(ConfigError::NonPositive { field: "width", .. })
        ));
        assert!(matches!(
            FreedrawConfig::from_json(r#"{"highlighter_alpha": 1.5}"#),
            Err(ConfigError::AlphaOutOfRange(_))
        ));
        assert!(matches!(
            FreedrawConfig::from_json(r#"{"min_gesture_distance": -1}"#),
            Err(ConfigError::Negative { .. })
        ));
        assert!(matches!(
            FreedrawConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_highlighter_style_applies_alpha() {
        let config = FreedrawConfig {
            ink: InkKind::Highlighter,
            color: SerializableColor::blue(),
            ..FreedrawConfig::default()
        };
        let style = config.stroke_style();
        assert_eq!(style.color.a, 77);
        assert_eq!(style.ink, InkKind::Highlighter);

        let pen = FreedrawConfig::default().stroke_style();
        assert_eq!(pen.color.a, 255);
    }
}
