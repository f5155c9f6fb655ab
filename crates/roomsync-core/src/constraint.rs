//! Spatial constraint solving for component placement.
//!
//! Pure geometry, no document dependency. The mutation engine deliberately
//! does not clamp positions itself; drag/drop callers run these functions
//! first and hand the engine an already-valid position.

use kurbo::{Point, Rect};

use crate::model::Position;

/// Grid size for snapping (8px grid).
pub const GRID_SIZE: f64 = 8.0;

/// Clamp a proposed position so the component stays inside the canvas.
///
/// `x` is clamped to `[0, canvas_width - width]` and `y` to
/// `[0, canvas_height - height]`, independently. A component larger than
/// the canvas clamps to 0 rather than a negative origin; it may overflow
/// visually but never reports a negative position.
pub fn constrain(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    canvas_width: f64,
    canvas_height: f64,
) -> Position {
    Position {
        x: x.min(canvas_width - width).max(0.0),
        y: y.min(canvas_height - height).max(0.0),
    }
}

/// Snap a single coordinate to the nearest grid line.
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    (value / grid_size).round() * grid_size
}

/// Snap a proposed position to the grid, then constrain it.
///
/// Snapping runs before clamping so a snap can never push a component
/// back out of bounds.
pub fn snap_and_constrain(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    canvas_width: f64,
    canvas_height: f64,
) -> Position {
    constrain(
        snap_to_grid(x, GRID_SIZE),
        snap_to_grid(y, GRID_SIZE),
        width,
        height,
        canvas_width,
        canvas_height,
    )
}

/// Compute the canvas-relative drop position for a pointer release,
/// constrained to the canvas bounds.
pub fn drop_position(pointer: Point, canvas_rect: Rect, item_width: f64, item_height: f64) -> Position {
    let x = pointer.x - canvas_rect.x0;
    let y = pointer.y - canvas_rect.y0;
    constrain(
        x,
        y,
        item_width,
        item_height,
        canvas_rect.width(),
        canvas_rect.height(),
    )
}

/// Whether a component at `position` fits entirely inside the canvas.
pub fn is_within_bounds(
    position: Position,
    width: f64,
    height: f64,
    canvas_width: f64,
    canvas_height: f64,
) -> bool {
    position.x >= 0.0
        && position.y >= 0.0
        && position.x + width <= canvas_width
        && position.y + height <= canvas_height
}

/// Position that centers a component on the canvas, floored at the origin
/// for components larger than the canvas.
pub fn center_position(
    canvas_width: f64,
    canvas_height: f64,
    component_width: f64,
    component_height: f64,
) -> Position {
    Position {
        x: ((canvas_width - component_width) / 2.0).max(0.0),
        y: ((canvas_height - component_height) / 2.0).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_inside_is_identity() {
        let pos = constrain(50.0, 60.0, 100.0, 50.0, 375.0, 667.0);
        assert_eq!(pos, Position::new(50.0, 60.0));
    }

    #[test]
    fn constrain_clamps_to_canvas_edge() {
        // 375x667 canvas, 100x50 component dragged to (500, 500):
        // x clamps to 275, y stays at 500 (500 <= 667 - 50). Each axis
        // clamps independently.
        let pos = constrain(500.0, 500.0, 100.0, 50.0, 375.0, 667.0);
        assert_eq!(pos, Position::new(275.0, 500.0));

        let pos = constrain(500.0, 700.0, 100.0, 50.0, 375.0, 667.0);
        assert_eq!(pos, Position::new(275.0, 617.0));
    }

    #[test]
    fn constrain_floors_negative_at_zero() {
        let pos = constrain(-40.0, -5.0, 100.0, 50.0, 375.0, 667.0);
        assert_eq!(pos, Position::new(0.0, 0.0));
    }

    #[test]
    fn constrain_oversized_component_clamps_to_origin() {
        // Component wider than the canvas never yields a negative x.
        let pos = constrain(10.0, 10.0, 500.0, 800.0, 375.0, 667.0);
        assert_eq!(pos, Position::new(0.0, 0.0));
    }

    #[test]
    fn constrain_result_stays_in_range() {
        let cases = [
            (0.0, 0.0),
            (187.5, 333.5),
            (375.0, 667.0),
            (1e6, 1e6),
            (-1e6, -1e6),
        ];
        for (x, y) in cases {
            let pos = constrain(x, y, 100.0, 50.0, 375.0, 667.0);
            assert!(pos.x >= 0.0 && pos.x <= 275.0, "x out of range: {}", pos.x);
            assert!(pos.y >= 0.0 && pos.y <= 617.0, "y out of range: {}", pos.y);
        }
    }

    #[test]
    fn snap_rounds_to_nearest_grid_line() {
        assert_eq!(snap_to_grid(3.0, GRID_SIZE), 0.0);
        assert_eq!(snap_to_grid(4.0, GRID_SIZE), 8.0);
        assert_eq!(snap_to_grid(13.0, GRID_SIZE), 16.0);
        assert_eq!(snap_to_grid(16.0, GRID_SIZE), 16.0);
    }

    #[test]
    fn snap_then_constrain_never_leaves_bounds() {
        // Snapping near the far edge must not push the component back out.
        let pos = snap_and_constrain(371.0, 663.0, 100.0, 50.0, 375.0, 667.0);
        assert!(pos.x <= 275.0);
        assert!(pos.y <= 617.0);
    }

    #[test]
    fn drop_position_is_canvas_relative() {
        let canvas = Rect::new(100.0, 200.0, 475.0, 867.0); // 375x667 at (100, 200)
        let pos = drop_position(Point::new(150.0, 260.0), canvas, 100.0, 50.0);
        assert_eq!(pos, Position::new(50.0, 60.0));
    }

    #[test]
    fn drop_position_outside_canvas_is_constrained() {
        let canvas = Rect::new(0.0, 0.0, 375.0, 667.0);
        let pos = drop_position(Point::new(600.0, 700.0), canvas, 100.0, 50.0);
        assert_eq!(pos, Position::new(275.0, 617.0));
    }

    #[test]
    fn within_bounds_checks_full_extent() {
        assert!(is_within_bounds(Position::new(0.0, 0.0), 100.0, 50.0, 375.0, 667.0));
        assert!(is_within_bounds(Position::new(275.0, 617.0), 100.0, 50.0, 375.0, 667.0));
        assert!(!is_within_bounds(Position::new(276.0, 0.0), 100.0, 50.0, 375.0, 667.0));
        assert!(!is_within_bounds(Position::new(-1.0, 0.0), 100.0, 50.0, 375.0, 667.0));
    }

    #[test]
    fn center_position_centers_and_floors() {
        let pos = center_position(375.0, 667.0, 100.0, 50.0);
        assert_eq!(pos, Position::new(137.5, 308.5));

        let oversized = center_position(375.0, 667.0, 500.0, 800.0);
        assert_eq!(oversized, Position::new(0.0, 0.0));
    }
}
