//! Note domain model.
//!
//! # Invariants
//! - `id` is assigned at creation and never reused for another note.
//! - Geometry fields are finite; store operations reject NaN/infinity.

use crate::geometry::{rect_centre, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every note on the board.
pub type NoteId = Uuid;

/// Width assigned to freshly created notes.
pub const DEFAULT_NOTE_WIDTH: f64 = 300.0;
/// Height assigned to freshly created notes.
pub const DEFAULT_NOTE_HEIGHT: f64 = 80.0;

/// A positioned, resizable text container on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Free text; empty for new notes.
    pub content: String,
}

impl Note {
    /// Creates an empty note of default size at `(x, y)` with a fresh id.
    pub fn new(x: f64, y: f64) -> Self {
        Self::with_id(Uuid::new_v4(), x, y)
    }

    /// Creates an empty note of default size with a caller-provided id.
    pub fn with_id(id: NoteId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            content: String::new(),
        }
    }

    /// Copies this note under a new id at a new position.
    pub fn cloned_at(&self, id: NoteId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            ..self.clone()
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn centre(&self) -> Point {
        rect_centre(&self.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH};
    use crate::geometry::Point;
    use uuid::Uuid;

    #[test]
    fn new_note_uses_default_size_and_empty_content() {
        let note = Note::new(12.0, 34.0);
        assert_eq!(note.width, DEFAULT_NOTE_WIDTH);
        assert_eq!(note.height, DEFAULT_NOTE_HEIGHT);
        assert!(note.content.is_empty());
        assert_ne!(note.id, Note::new(12.0, 34.0).id);
    }

    #[test]
    fn cloned_at_keeps_size_and_content() {
        let mut source = Note::new(0.0, 0.0);
        source.width = 120.0;
        source.content = "hello".to_string();
        let id = Uuid::new_v4();

        let clone = source.cloned_at(id, 5.0, 6.0);
        assert_eq!(clone.id, id);
        assert_eq!((clone.x, clone.y), (5.0, 6.0));
        assert_eq!(clone.width, 120.0);
        assert_eq!(clone.content, "hello");
    }

    #[test]
    fn centre_is_rect_midpoint() {
        let note = Note::new(0.0, 0.0);
        assert_eq!(note.centre(), Point::new(150.0, 40.0));
    }

    #[test]
    fn serializes_with_flat_field_names() {
        let note = Note::new(1.0, 2.0);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], note.id.to_string());
        assert_eq!(json["x"], 1.0);
        assert_eq!(json["width"], 300.0);
        assert_eq!(json["content"], "");
    }
}
