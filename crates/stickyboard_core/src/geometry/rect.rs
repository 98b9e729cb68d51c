//! Rectangle, point and segment primitives.
//!
//! # Invariants
//! - `rect_collision` treats both axes as open intervals: touching edges do
//!   not collide.
//! - `rect_inside` is half-open: the far edges are outside.

use serde::{Deserialize, Serialize};

/// A position on the board surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
///
/// Width and height may be negative while a selection box is being dragged
/// backward; see [`fix_negative_rectangle`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the normalized rectangle spanned by two opposite corners.
    ///
    /// Used for rubber-band selection between a drag start and the current
    /// pointer position, in either direction.
    pub fn from_corners(start: Point, end: Point) -> Self {
        fix_negative_rectangle(Self::new(start.x, start.y, end.x - start.x, end.y - start.y))
    }
}

/// Line segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    pub fn new(from: Point, to: Point) -> Self {
        Self {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
        }
    }

    /// Smallest axis-aligned rectangle containing the segment.
    pub fn bounding_rect(&self) -> Rect {
        let x = self.x1.min(self.x2);
        let y = self.y1.min(self.y2);
        Rect {
            x,
            y,
            width: self.x1.max(self.x2) - x,
            height: self.y1.max(self.y2) - y,
        }
    }
}

/// Returns whether two rectangles overlap with a non-empty interior.
pub fn rect_collision(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Returns whether `point` lies in `[x, x+width) × [y, y+height)`.
pub fn rect_inside(point: Point, rect: &Rect) -> bool {
    point.x >= rect.x
        && point.x < rect.x + rect.width
        && point.y >= rect.y
        && point.y < rect.y + rect.height
}

pub fn rect_centre(rect: &Rect) -> Point {
    Point {
        x: rect.x + rect.width / 2.0,
        y: rect.y + rect.height / 2.0,
    }
}

/// Normalizes negative width/height into an equivalent rectangle covering
/// the same area with a non-negative extent.
pub fn fix_negative_rectangle(rect: Rect) -> Rect {
    let (x, width) = if rect.width < 0.0 {
        (rect.x + rect.width, -rect.width)
    } else {
        (rect.x, rect.width)
    };
    let (y, height) = if rect.height < 0.0 {
        (rect.y + rect.height, -rect.height)
    } else {
        (rect.y, rect.height)
    };
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Returns whether the segment `line` intersects `rect`.
///
/// The segment's bounding box must overlap the rectangle first; after that
/// the segment crosses the rectangle unless all four corners lie strictly on
/// the same side of the infinite line through it.
pub fn line_rect_collision(line: &Line, rect: &Rect) -> bool {
    if !rect_collision(&line.bounding_rect(), rect) {
        return false;
    }

    let Line { x1, y1, x2, y2 } = *line;
    let side = |x: f64, y: f64| (y2 - y1) * x + (x1 - x2) * y + (x2 * y1 - x1 * y2);
    let corners = [
        side(rect.x, rect.y),
        side(rect.x + rect.width, rect.y),
        side(rect.x, rect.y + rect.height),
        side(rect.x + rect.width, rect.y + rect.height),
    ];

    let all_above = corners.iter().all(|value| *value > 0.0);
    let all_below = corners.iter().all(|value| *value < 0.0);
    !(all_above || all_below)
}

#[cfg(test)]
mod tests {
    use super::{
        fix_negative_rectangle, line_rect_collision, rect_centre, rect_collision, rect_inside,
        Line, Point, Rect,
    };

    #[test]
    fn edge_touching_rectangles_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!rect_collision(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(rect_collision(&a, &Rect::new(9.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn contained_rectangle_collides() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 5.0, 5.0);
        assert!(rect_collision(&outer, &inner));
        assert!(rect_collision(&inner, &outer));
    }

    #[test]
    fn rect_inside_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_inside(Point::new(0.0, 0.0), &rect));
        assert!(rect_inside(Point::new(9.999, 5.0), &rect));
        assert!(!rect_inside(Point::new(10.0, 5.0), &rect));
        assert!(!rect_inside(Point::new(5.0, 10.0), &rect));
        assert!(!rect_inside(Point::new(-0.1, 5.0), &rect));
    }

    #[test]
    fn rect_centre_is_midpoint() {
        let centre = rect_centre(&Rect::new(10.0, 20.0, 300.0, 80.0));
        assert_eq!(centre, Point::new(160.0, 60.0));
    }

    #[test]
    fn fix_negative_rectangle_flips_origin() {
        let fixed = fix_negative_rectangle(Rect::new(50.0, 60.0, -20.0, -30.0));
        assert_eq!(fixed, Rect::new(30.0, 30.0, 20.0, 30.0));

        let untouched = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(fix_negative_rectangle(untouched), untouched);

        let width_only = fix_negative_rectangle(Rect::new(10.0, 10.0, -5.0, 5.0));
        assert_eq!(width_only, Rect::new(5.0, 10.0, 5.0, 5.0));
    }

    #[test]
    fn from_corners_normalizes_backward_drag() {
        let rect = Rect::from_corners(Point::new(100.0, 100.0), Point::new(40.0, 70.0));
        assert_eq!(rect, Rect::new(40.0, 70.0, 60.0, 30.0));
    }

    #[test]
    fn segment_outside_bounding_box_misses() {
        let line = Line {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
        };
        assert!(!line_rect_collision(
            &line,
            &Rect::new(20.0, 20.0, 5.0, 5.0)
        ));
    }

    #[test]
    fn diagonal_segment_crossing_rectangle_hits() {
        let line = Line {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
        };
        assert!(line_rect_collision(&line, &Rect::new(4.0, 4.0, 2.0, 2.0)));
    }

    #[test]
    fn rectangle_beside_segment_inside_its_box_misses() {
        let line = Line {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
        };
        // Overlaps the segment's bounding box but sits wholly above the line.
        assert!(!line_rect_collision(&line, &Rect::new(6.0, 0.0, 3.0, 2.0)));
    }

    #[test]
    fn bounding_rect_is_normalized() {
        let line = Line {
            x1: 10.0,
            y1: 0.0,
            x2: 0.0,
            y2: 5.0,
        };
        assert_eq!(line.bounding_rect(), Rect::new(0.0, 0.0, 10.0, 5.0));
    }
}
