//! Per-shape pointer interaction: hover, body drag and edge resize.
//!
//! A [`ShapeController`] never mutates anything itself. Each handler returns
//! a [`ControllerResponse`] carrying the collection action to dispatch and
//! the drag-lock request for the viewport; the caller applies both.

use crate::components::{ComponentAction, Shape, ShapeId, ShapePatch};
use crate::input::PointerMotion;
use crate::viewport::ViewportSnapshot;
use kurbo::{Point, Rect, Size, Vec2};

bitflags::bitflags! {
    /// Edges a resize gesture is anchored to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResizeMask: u8 {
        const N = 0b0001;
        const E = 0b0010;
        const S = 0b0100;
        const W = 0b1000;
    }
}

impl ResizeMask {
    /// Cursor name for this edge set, e.g. `"nw-resize"`. `None` when empty.
    pub fn cursor_name(self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut name = String::new();
        for (flag, letter) in [(Self::N, 'n'), (Self::S, 's'), (Self::E, 'e'), (Self::W, 'w')] {
            if self.contains(flag) {
                name.push(letter);
            }
        }
        name.push_str("-resize");
        Some(name)
    }
}

/// Classify which edges of `bounds` the point lies near.
///
/// Outside the bounds yields an empty mask. Top wins over bottom and right
/// over left when a small shape would match both.
pub fn classify_edge(point: Point, bounds: Rect, threshold: f64) -> ResizeMask {
    if point.x < bounds.x0 || point.x > bounds.x1 || point.y < bounds.y0 || point.y > bounds.y1 {
        return ResizeMask::empty();
    }
    let local = point - bounds.origin();
    let mut mask = ResizeMask::empty();

    if local.y < threshold {
        mask |= ResizeMask::N;
    } else if local.y > bounds.height() - threshold {
        mask |= ResizeMask::S;
    }

    if local.x > bounds.width() - threshold {
        mask |= ResizeMask::E;
    } else if local.x < threshold {
        mask |= ResizeMask::W;
    }

    mask
}

/// Ephemeral per-controller gesture state. Reset on pointer release.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub dragging: bool,
    pub hovering: bool,
    pub resize: ResizeMask,
    /// Pointer offset from the shape's top-left at pointer-down, in screen pixels.
    pub anchor: Vec2,
}

/// What the presentation layer should show for a shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionHint {
    #[default]
    Idle,
    Hovering,
    Grabbing,
    Resizing(ResizeMask),
}

impl InteractionHint {
    /// CSS-style cursor name.
    pub fn cursor_name(self) -> String {
        match self {
            Self::Idle => "auto".to_string(),
            Self::Hovering => "grab".to_string(),
            Self::Grabbing => "grabbing".to_string(),
            Self::Resizing(mask) => mask.cursor_name().unwrap_or_else(|| "auto".to_string()),
        }
    }
}

/// Presentation payload for one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    /// Top-left corner within the view layer (diagram units).
    pub translate: Vec2,
    pub size: Size,
    pub rotation_degrees: f64,
    pub hint: InteractionHint,
}

/// Requested change to the viewport drag-lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockRequest {
    #[default]
    Unchanged,
    /// Disable viewport pan/zoom.
    Engage,
    /// Re-enable viewport pan/zoom.
    Release,
}

/// Output of a controller handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerResponse {
    pub action: Option<ComponentAction>,
    pub lock: LockRequest,
}

impl ControllerResponse {
    pub fn none() -> Self {
        Self::default()
    }

    fn lock(lock: LockRequest) -> Self {
        Self { action: None, lock }
    }

    fn action(action: ComponentAction) -> Self {
        Self { action: Some(action), lock: LockRequest::Unchanged }
    }
}

/// Pointer state machine bound to one shape.
#[derive(Debug, Clone)]
pub struct ShapeController {
    shape_id: ShapeId,
    state: DragState,
    edge_threshold: f64,
}

impl ShapeController {
    /// `edge_threshold` is the unscaled grab margin.
    pub fn new(shape_id: ShapeId, edge_threshold: f64) -> Self {
        Self {
            shape_id,
            state: DragState::default(),
            edge_threshold,
        }
    }

    pub fn shape_id(&self) -> ShapeId {
        self.shape_id
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn is_hovering(&self) -> bool {
        self.state.hovering
    }

    fn scaled_threshold(&self, scale: f64) -> f64 {
        self.edge_threshold * scale
    }

    pub fn pointer_enter(&mut self) {
        self.state.hovering = true;
    }

    pub fn pointer_leave(&mut self) {
        self.state.hovering = false;
    }

    /// Start a drag or resize. `screen_bounds` are the shape's page bounds.
    pub fn pointer_down(
        &mut self,
        pointer: Point,
        screen_bounds: Rect,
        snapshot: &ViewportSnapshot,
    ) -> ControllerResponse {
        let resize = classify_edge(
            pointer,
            screen_bounds,
            self.scaled_threshold(snapshot.state.scale),
        );
        self.state = DragState {
            dragging: true,
            hovering: self.state.hovering,
            resize,
            anchor: pointer - screen_bounds.origin(),
        };
        log::debug!(
            "shape {} drag start (resize: {:?})",
            self.shape_id,
            resize
        );
        ControllerResponse::lock(LockRequest::Engage)
    }

    /// Translate an active gesture into a collection action.
    ///
    /// Does nothing when idle or while the view layer is not attached.
    pub fn pointer_move(
        &self,
        motion: &PointerMotion,
        shape: &Shape,
        snapshot: &ViewportSnapshot,
    ) -> ControllerResponse {
        if !self.state.dragging {
            return ControllerResponse::none();
        }
        let Some(view_origin) = snapshot.view_origin() else {
            return ControllerResponse::none();
        };
        let scale = snapshot.state.scale;

        if self.state.resize.is_empty() {
            let top_left = (motion.position - view_origin - self.state.anchor) / scale;
            return ControllerResponse::action(ComponentAction::move_to(
                self.shape_id,
                top_left.to_point(),
            ));
        }

        let resize = self.state.resize;
        let movement = motion.movement;

        let mut d_width = if resize.intersects(ResizeMask::E | ResizeMask::W) {
            movement.x
        } else {
            0.0
        };
        if resize.contains(ResizeMask::W) {
            d_width = -d_width;
        }

        let mut d_height = if resize.intersects(ResizeMask::N | ResizeMask::S) {
            movement.y
        } else {
            0.0
        };
        if resize.contains(ResizeMask::N) {
            d_height = -d_height;
        }

        // W and N keep the opposite edge fixed, also once the size hits zero.
        let width = (shape.width + d_width / scale).max(0.0);
        let height = (shape.height + d_height / scale).max(0.0);
        let x = if resize.contains(ResizeMask::W) {
            shape.position.x + shape.width - width
        } else {
            shape.position.x
        };
        let y = if resize.contains(ResizeMask::N) {
            shape.position.y + shape.height - height
        } else {
            shape.position.y
        };

        let patch = ShapePatch::new()
            .with_width(width)
            .with_height(height)
            .with_x(x)
            .with_y(y);

        ControllerResponse::action(ComponentAction::Modify {
            id: self.shape_id,
            patch,
        })
    }

    /// End any active gesture.
    pub fn pointer_up(&mut self) -> ControllerResponse {
        if !self.state.dragging {
            return ControllerResponse::none();
        }
        self.state.dragging = false;
        self.state.resize = ResizeMask::empty();
        log::debug!("shape {} drag end", self.shape_id);
        ControllerResponse::lock(LockRequest::Release)
    }

    /// Affordance for the pointer at `pointer` over a shape at `screen_bounds`.
    pub fn hint(&self, pointer: Point, screen_bounds: Option<Rect>, scale: f64) -> InteractionHint {
        if !self.state.resize.is_empty() {
            return InteractionHint::Resizing(self.state.resize);
        }
        if let Some(bounds) = screen_bounds {
            let edge = classify_edge(pointer, bounds, self.scaled_threshold(scale));
            if !edge.is_empty() {
                return InteractionHint::Resizing(edge);
            }
        }
        if self.state.dragging {
            InteractionHint::Grabbing
        } else if self.state.hovering {
            InteractionHint::Hovering
        } else {
            InteractionHint::Idle
        }
    }

    /// Presentation payload for `shape`.
    pub fn style(&self, shape: &Shape, hint: InteractionHint) -> ShapeStyle {
        ShapeStyle {
            translate: shape.position.to_vec2(),
            size: shape.size(),
            rotation_degrees: shape.rotation_degrees,
            hint,
        }
    }
}
