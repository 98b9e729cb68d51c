//! Pure geometry helpers for selection and connection hit-testing.
//!
//! # Responsibility
//! - Define the rectangle, point and line shapes shared by the board model.
//! - Provide stateless collision/containment tests.
//!
//! # Invariants
//! - Every function here is pure; no board state is read or written.
//! - Rectangles use `(x, y)` as the top-left corner with y growing downward.

pub mod rect;

pub use rect::{
    fix_negative_rectangle, line_rect_collision, rect_centre, rect_collision, rect_inside, Line,
    Point, Rect,
};
