//! Coordinate math for converting between diagram space and screen space.
//!
//! Diagram space is the unscaled coordinate system shapes live in. Screen
//! space here is container-local: the origin is the top-left corner of the
//! viewport's container frame.

use crate::viewport::ViewportState;
use kurbo::{Point, Rect};

/// Scale `p` by `factor`, keeping `pivot` fixed.
///
/// Computed component-wise as `(p + pivot) * factor - pivot`, so the fixed
/// point is actually `-pivot`. Callers pass negated pivots accordingly.
pub fn dilate_around_point(p: Point, pivot: Point, factor: f64) -> Point {
    Point::new(
        (p.x + pivot.x) * factor - pivot.x,
        (p.y + pivot.y) * factor - pivot.y,
    )
}

/// Scale `p` by `factor` around the origin.
pub fn dilate(p: Point, factor: f64) -> Point {
    dilate_around_point(p, Point::ZERO, factor)
}

/// Pivot used when scaling around the container's visual center.
///
/// The view layer is anchored at the container's top-left corner, so only
/// the half extents matter; the container's page position drops out.
fn container_pivot(container: Rect) -> Point {
    Point::new(-container.width() / 2.0, -container.height() / 2.0)
}

/// Convert a diagram-space point to container-local screen coordinates.
///
/// Without container bounds (not laid out yet) the offset-adjusted point is
/// returned unscaled.
pub fn diagram_to_screen(point: Point, state: &ViewportState, container: Option<Rect>) -> Point {
    let adjusted = point - state.offset;
    match container {
        Some(container) => dilate_around_point(adjusted, container_pivot(container), state.scale),
        None => adjusted,
    }
}

/// Inverse of [`diagram_to_screen`] for the same state and container.
pub fn screen_to_diagram(point: Point, state: &ViewportState, container: Option<Rect>) -> Point {
    let unscaled = match container {
        Some(container) => {
            let pivot = container_pivot(container);
            Point::new(
                (point.x + pivot.x) / state.scale - pivot.x,
                (point.y + pivot.y) / state.scale - pivot.y,
            )
        }
        None => point,
    };
    unscaled + state.offset
}

/// Express a screen point relative to an element's top-left corner.
pub fn screen_to_element_local(point: Point, element: Rect) -> Point {
    (point - element.origin()).to_point()
}
