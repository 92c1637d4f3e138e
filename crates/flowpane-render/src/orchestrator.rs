//! The flowchart render orchestrator.
//!
//! [`FlowchartRender`] owns the viewport, the shape collection and one
//! [`ShapeController`] per shape. It routes pointer events to the
//! controllers, applies their responses, arbitrates the drag-lock and
//! builds a [`RenderContext`] for each frame.

use crate::renderer::{Connector, RenderContext, ShapeView};
use flowpane_core::{
    BoundsProvider, ComponentAction, ControllerResponse, InputState, InteractionHint, LockRequest,
    Modifiers, MouseButton, PointerEvent, Shape, ShapeCollection, ShapeController, ShapeId,
    ShapeStyle, ViewSurface, Viewport, ViewportConfig, ViewportSnapshot,
};
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use std::collections::HashMap;
use std::rc::Rc;

/// Tool-palette selection. Only `Pointer` allows viewport panning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SelectionState {
    #[default]
    Pointer,
    Box,
    Line,
}

impl SelectionState {
    pub fn name(self) -> &'static str {
        match self {
            SelectionState::Pointer => "Pointer",
            SelectionState::Box => "Box",
            SelectionState::Line => "Line",
        }
    }
}

/// Composes viewport, collection and controllers into one interactive surface.
#[derive(Debug)]
pub struct FlowchartRender {
    viewport: Viewport,
    shapes: ShapeCollection,
    controllers: HashMap<ShapeId, ShapeController>,
    input: InputState,
    selection: SelectionState,
    /// Topmost shape under the pointer.
    hovered: Option<ShapeId>,
    /// A controller holds the drag-lock.
    shape_lock: bool,
    background_color: Color,
    connector_color: Color,
}

impl Default for FlowchartRender {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl FlowchartRender {
    /// Create an empty surface with the given viewport settings.
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            viewport: Viewport::new(config),
            shapes: ShapeCollection::new(),
            controllers: HashMap::new(),
            input: InputState::new(),
            selection: SelectionState::default(),
            hovered: None,
            shape_lock: false,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            connector_color: Color::from_rgba8(0, 0, 0, 255),
        }
    }

    /// Create a surface seeded with shapes.
    pub fn with_shapes(config: ViewportConfig, shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut render = Self::new(config);
        for shape in shapes {
            render.dispatch(ComponentAction::Add(shape));
        }
        render
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Direct viewport access, for explicit `SetPosition`/`Scale` requests.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn shapes(&self) -> &ShapeCollection {
        &self.shapes
    }

    pub fn controller(&self, id: ShapeId) -> Option<&ShapeController> {
        self.controllers.get(&id)
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    /// Bind the container surface.
    pub fn attach_container(&mut self, container: Rc<dyn BoundsProvider>) {
        self.viewport.attach_container(container);
    }

    /// Bind the view surface.
    pub fn attach_view(&mut self, view: Rc<dyn ViewSurface>) {
        self.viewport.attach_view(view);
    }

    /// Set the palette selection and regate panning.
    pub fn set_selection(&mut self, selection: SelectionState) {
        if self.selection != selection {
            log::debug!("Selection changed to {}", selection.name());
        }
        self.selection = selection;
        self.sync_draggable();
    }

    /// Apply a collection action and keep controllers in step with the shape set.
    pub fn dispatch(&mut self, action: ComponentAction) {
        self.shapes.dispatch(action);
        self.sync_controllers();
    }

    fn sync_controllers(&mut self) {
        let shapes = &self.shapes;
        let mut released = false;
        self.controllers.retain(|id, controller| {
            let keep = shapes.contains(*id);
            if !keep && controller.is_dragging() {
                released = true;
            }
            keep
        });

        let threshold = self.viewport.config().edge_threshold;
        for id in self.shapes.ids() {
            self.controllers
                .entry(id)
                .or_insert_with(|| ShapeController::new(id, threshold));
        }

        if self.hovered.is_some_and(|id| !self.shapes.contains(id)) {
            self.hovered = None;
        }
        if released {
            log::debug!("Shape removed mid-drag, releasing drag-lock");
            self.shape_lock = false;
            self.sync_draggable();
        }
    }

    fn sync_draggable(&mut self) {
        let draggable = self.selection == SelectionState::Pointer && !self.shape_lock;
        self.viewport.set_draggable(draggable);
    }

    fn apply_response(&mut self, response: ControllerResponse) {
        if let Some(action) = response.action {
            self.dispatch(action);
        }
        match response.lock {
            LockRequest::Unchanged => return,
            LockRequest::Engage => self.shape_lock = true,
            LockRequest::Release => self.shape_lock = false,
        }
        self.sync_draggable();
    }

    /// Page bounds of a shape, `None` until the view layer is attached.
    pub fn shape_screen_bounds(&self, shape: &Shape, snapshot: &ViewportSnapshot) -> Option<Rect> {
        snapshot.layer_rect_to_page(shape.bounds())
    }

    /// Topmost shape whose axis-aligned page bounds contain `point`.
    ///
    /// Bounds are closed, matching edge classification, so the right and
    /// bottom edges still hover.
    pub fn hit_test(&self, point: Point, snapshot: &ViewportSnapshot) -> Option<ShapeId> {
        self.shapes
            .as_slice()
            .iter()
            .rev()
            .find(|shape| {
                self.shape_screen_bounds(shape, snapshot)
                    .is_some_and(|bounds| {
                        point.x >= bounds.x0
                            && point.x <= bounds.x1
                            && point.y >= bounds.y0
                            && point.y <= bounds.y1
                    })
            })
            .map(Shape::id)
    }

    fn update_hover(&mut self, point: Point, snapshot: &ViewportSnapshot) {
        let hit = self.hit_test(point, snapshot);
        if hit == self.hovered {
            return;
        }
        if let Some(controller) = self.hovered.and_then(|id| self.controllers.get_mut(&id)) {
            controller.pointer_leave();
        }
        if let Some(controller) = hit.and_then(|id| self.controllers.get_mut(&id)) {
            controller.pointer_enter();
        }
        self.hovered = hit;
    }

    /// Update held modifier keys. Ctrl pans without a pressed button.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    /// Route one pointer event through controllers and the viewport.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        self.input.handle_pointer_event(event);
        let snapshot = self.viewport.snapshot();

        match *event {
            PointerEvent::Down { position, button } => {
                self.update_hover(position, &snapshot);
                if button != MouseButton::Left {
                    return;
                }
                let Some(id) = self.hovered else {
                    return;
                };
                let bounds = self
                    .shapes
                    .get(id)
                    .and_then(|shape| snapshot.layer_rect_to_page(shape.bounds()));
                let response = match (bounds, self.controllers.get_mut(&id)) {
                    (Some(bounds), Some(controller)) => {
                        controller.pointer_down(position, bounds, &snapshot)
                    }
                    _ => return,
                };
                self.apply_response(response);
            }
            PointerEvent::Move { position } => {
                self.update_hover(position, &snapshot);
                let motion = self.input.motion();
                let responses: Vec<ControllerResponse> = self
                    .controllers
                    .values()
                    .filter(|controller| controller.is_dragging())
                    .filter_map(|controller| {
                        self.shapes
                            .get(controller.shape_id())
                            .map(|shape| controller.pointer_move(&motion, shape, &snapshot))
                    })
                    .collect();
                for response in responses {
                    self.apply_response(response);
                }
                self.viewport.handle_pointer_move(&motion);
            }
            PointerEvent::Up { position, .. } => {
                let responses: Vec<ControllerResponse> = self
                    .controllers
                    .values_mut()
                    .map(ShapeController::pointer_up)
                    .collect();
                for response in responses {
                    self.apply_response(response);
                }
                let snapshot = self.viewport.snapshot();
                self.update_hover(position, &snapshot);
            }
            PointerEvent::Scroll { delta, .. } => {
                self.viewport.handle_wheel(delta);
            }
        }
    }

    /// Affordance for the shape being manipulated, else the hovered one.
    pub fn interaction_hint(&self) -> InteractionHint {
        let snapshot = self.viewport.snapshot();
        let active = self
            .controllers
            .values()
            .find(|controller| controller.is_dragging())
            .or_else(|| self.hovered.and_then(|id| self.controllers.get(&id)));
        let Some(controller) = active else {
            return InteractionHint::Idle;
        };
        let bounds = self
            .shapes
            .get(controller.shape_id())
            .and_then(|shape| self.shape_screen_bounds(shape, &snapshot));
        controller.hint(self.input.pointer_position, bounds, snapshot.state.scale)
    }

    fn layer_transform(snapshot: &ViewportSnapshot) -> Affine {
        match snapshot.container {
            Some(container) => {
                Affine::translate(container.origin().to_vec2())
                    * snapshot.state.view_transform(container).affine()
            }
            None => Affine::IDENTITY,
        }
    }

    fn shape_view(&self, shape: &Shape, snapshot: &ViewportSnapshot, layer: Affine) -> ShapeView {
        let screen_bounds = self.shape_screen_bounds(shape, snapshot);
        let active = self
            .controllers
            .get(&shape.id())
            .filter(|controller| controller.is_dragging() || controller.is_hovering());
        let style = match active {
            Some(controller) => {
                let hint = controller.hint(self.input.pointer_position, screen_bounds, snapshot.state.scale);
                controller.style(shape, hint)
            }
            None => ShapeStyle {
                translate: shape.position.to_vec2(),
                size: shape.size(),
                rotation_degrees: shape.rotation_degrees,
                hint: InteractionHint::Idle,
            },
        };
        let center = Point::new(style.size.width / 2.0, style.size.height / 2.0);
        let local = Affine::translate(style.translate)
            * Affine::rotate_about(style.rotation_degrees.to_radians(), center);
        ShapeView {
            id: shape.id(),
            kind: shape.kind(),
            style,
            screen_bounds,
            transform: layer * local,
        }
    }

    /// Describe the current frame.
    pub fn frame(&self) -> RenderContext {
        let snapshot = self.viewport.snapshot();
        let layer = Self::layer_transform(&snapshot);

        let shapes = self
            .shapes
            .iter()
            .map(|shape| self.shape_view(shape, &snapshot, layer))
            .collect();

        let connectors = self
            .shapes
            .adjacent_pairs()
            .map(|(from, to)| Connector {
                from_shape: from.id(),
                to_shape: to.id(),
                from: snapshot.diagram_to_screen(from.bounds().center()),
                to: snapshot.diagram_to_screen(to.bounds().center()),
            })
            .collect();

        RenderContext::new(snapshot)
            .with_shapes(shapes)
            .with_connectors(connectors)
            .with_background(self.background_color)
            .with_connector_stroke(self.connector_color, 1.0)
            .with_hint(self.interaction_hint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpane_core::{ResizeMask, ShapePatch, ViewLayer};
    use kurbo::{Size, Vec2};

    const CONTAINER: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    /// A surface at the origin with `offset` reset so diagram and page coincide.
    fn surface(shapes: Vec<Shape>) -> FlowchartRender {
        let mut render = FlowchartRender::with_shapes(ViewportConfig::default(), shapes);
        render.attach_container(Rc::new(CONTAINER));
        render.attach_view(Rc::new(ViewLayer::new(CONTAINER.origin(), CONTAINER.size())));
        render.viewport_mut().dispatch(flowpane_core::ViewportAction::SetPosition { x: 0.0, y: 0.0 });
        render
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y), button: MouseButton::Left }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up { position: Point::new(x, y), button: MouseButton::Left }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    #[test]
    fn test_controllers_follow_collection() {
        let shape = Shape::default();
        let id = shape.id();
        let mut render = FlowchartRender::default();
        render.dispatch(ComponentAction::Add(shape));
        assert!(render.controller(id).is_some());
        render.dispatch(ComponentAction::Remove(id));
        assert!(render.controller(id).is_none());
    }

    #[test]
    fn test_hover_tracks_topmost_shape() {
        let below = Shape::rectangle(Point::new(100.0, 100.0), 100.0, 100.0);
        let above = Shape::rectangle(Point::new(150.0, 150.0), 100.0, 100.0);
        let (below_id, above_id) = (below.id(), above.id());
        let mut render = surface(vec![below, above]);

        render.handle_pointer_event(&moved(175.0, 175.0));
        assert_eq!(render.hovered(), Some(above_id));
        assert!(render.controller(above_id).unwrap().is_hovering());
        assert!(!render.controller(below_id).unwrap().is_hovering());

        render.handle_pointer_event(&moved(120.0, 120.0));
        assert_eq!(render.hovered(), Some(below_id));
        assert!(!render.controller(above_id).unwrap().is_hovering());

        render.handle_pointer_event(&moved(10.0, 10.0));
        assert_eq!(render.hovered(), None);
    }

    #[test]
    fn test_body_drag_moves_shape() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);

        render.handle_pointer_event(&moved(125.0, 125.0));
        render.handle_pointer_event(&down(125.0, 125.0));
        assert!(!render.viewport().is_draggable());
        render.handle_pointer_event(&moved(165.0, 135.0));

        assert_eq!(render.shapes().get(id).unwrap().position, Point::new(140.0, 110.0));
        assert_eq!(render.viewport().current_state().offset, Vec2::ZERO);

        render.handle_pointer_event(&up(165.0, 135.0));
        assert!(render.viewport().is_draggable());
    }

    #[test]
    fn test_edge_drag_resizes_shape() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);

        render.handle_pointer_event(&moved(148.0, 125.0));
        render.handle_pointer_event(&down(148.0, 125.0));
        assert_eq!(render.interaction_hint(), InteractionHint::Resizing(ResizeMask::E));
        render.handle_pointer_event(&moved(158.0, 125.0));

        let shape = render.shapes().get(id).unwrap();
        assert_eq!(shape.size(), Size::new(60.0, 50.0));
        assert_eq!(shape.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_right_edge_hovers_and_resizes() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);

        render.handle_pointer_event(&moved(150.0, 150.0));
        assert_eq!(render.hovered(), Some(id));
        assert_eq!(render.interaction_hint(), InteractionHint::Resizing(ResizeMask::S | ResizeMask::E));

        render.handle_pointer_event(&down(150.0, 125.0));
        render.handle_pointer_event(&moved(160.0, 125.0));
        assert_eq!(render.shapes().get(id).unwrap().size(), Size::new(60.0, 50.0));
        assert_eq!(render.hit_test(Point::new(160.1, 125.0), &render.viewport().snapshot()), None);
    }

    #[test]
    fn test_hover_alone_keeps_viewport_gestures() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);

        render.handle_pointer_event(&moved(125.0, 125.0));
        assert_eq!(render.hovered(), Some(id));
        assert!(render.viewport().is_draggable());

        render.set_modifiers(Modifiers { ctrl: true, ..Modifiers::default() });
        render.handle_pointer_event(&moved(135.0, 125.0));
        assert_eq!(render.viewport().current_state().offset, Vec2::new(-10.0, 0.0));
        assert_eq!(render.shapes().get(id).unwrap().position, Point::new(100.0, 100.0));

        render.handle_pointer_event(&PointerEvent::Scroll {
            position: Point::new(135.0, 125.0),
            delta: Vec2::new(0.0, 600.0),
        });
        assert!((render.viewport().current_state().scale - 2.0).abs() < f64::EPSILON);
        assert!(render.viewport().is_draggable());
    }

    #[test]
    fn test_selection_gates_panning() {
        let mut render = surface(Vec::new());
        render.set_selection(SelectionState::Box);
        assert!(!render.viewport().is_draggable());
        render.handle_pointer_event(&down(10.0, 10.0));
        render.handle_pointer_event(&moved(30.0, 10.0));
        assert_eq!(render.viewport().current_state().offset, Vec2::ZERO);

        render.set_selection(SelectionState::Pointer);
        render.handle_pointer_event(&moved(50.0, 10.0));
        assert_eq!(render.viewport().current_state().offset, Vec2::new(-20.0, 0.0));
    }

    #[test]
    fn test_release_keeps_palette_gate() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let mut render = surface(vec![shape]);
        render.handle_pointer_event(&down(125.0, 125.0));
        render.set_selection(SelectionState::Line);
        render.handle_pointer_event(&up(125.0, 125.0));
        assert!(!render.viewport().is_draggable());
    }

    #[test]
    fn test_removing_dragged_shape_releases_lock() {
        let shape = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);
        render.handle_pointer_event(&down(125.0, 125.0));
        assert!(!render.viewport().is_draggable());

        render.dispatch(ComponentAction::Remove(id));
        assert!(render.viewport().is_draggable());
        assert_eq!(render.hovered(), None);
        // Further moves are harmless.
        render.handle_pointer_event(&moved(130.0, 130.0));
    }

    #[test]
    fn test_wheel_zooms() {
        let mut render = surface(Vec::new());
        render.handle_pointer_event(&PointerEvent::Scroll {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, 600.0),
        });
        assert!((render.viewport().current_state().scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_frame_lists_shapes_and_connectors() {
        let a = Shape::rectangle(Point::new(0.0, 0.0), 20.0, 20.0);
        let b = Shape::circle(Point::new(100.0, 0.0), 20.0, 20.0);
        let c = Shape::rectangle(Point::new(100.0, 100.0), 20.0, 40.0);
        let ids = [a.id(), b.id(), c.id()];
        let render = surface(vec![a, b, c]);

        let frame = render.frame();
        assert_eq!(frame.shapes.iter().map(|view| view.id).collect::<Vec<_>>(), ids.to_vec());
        assert_eq!(frame.connectors.len(), 2);
        assert_eq!(frame.connectors[0].from, Point::new(10.0, 10.0));
        assert_eq!(frame.connectors[0].to, Point::new(110.0, 10.0));
        assert_eq!(frame.connectors[1].to, Point::new(110.0, 120.0));
        assert_eq!(frame.viewport_size, CONTAINER.size());
    }

    #[test]
    fn test_frame_transform_matches_screen_bounds() {
        let shape = Shape::rectangle(Point::new(40.0, 30.0), 20.0, 10.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);
        render.viewport_mut().dispatch(flowpane_core::ViewportAction::Scale { delta: 1.0 });

        let frame = render.frame();
        let view = frame.shape(id).unwrap();
        let bounds = view.screen_bounds.unwrap();
        let mapped = view.transform.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, view.style.size));
        assert!((mapped.x0 - bounds.x0).abs() < 1e-9);
        assert!((mapped.y0 - bounds.y0).abs() < 1e-9);
        assert!((mapped.width() - bounds.width()).abs() < 1e-9);
        assert!((mapped.height() - bounds.height()).abs() < 1e-9);
    }

    #[test]
    fn test_frame_reflects_rotation() {
        let shape = Shape::rectangle(Point::new(0.0, 0.0), 20.0, 20.0);
        let id = shape.id();
        let mut render = surface(vec![shape]);
        render.dispatch(ComponentAction::Modify {
            id,
            patch: ShapePatch::new().with_rotation(90.0),
        });
        let frame = render.frame();
        let view = frame.shape(id).unwrap();
        assert!((view.style.rotation_degrees - 90.0).abs() < f64::EPSILON);
        // Rotation is about the center, so the center stays put.
        let center = view.transform * Point::new(10.0, 10.0);
        assert!((center.x - 10.0).abs() < 1e-9);
        assert!((center.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_without_surfaces() {
        let render = FlowchartRender::with_shapes(ViewportConfig::default(), [Shape::default()]);
        let frame = render.frame();
        assert_eq!(frame.shapes.len(), 1);
        assert!(frame.shapes[0].screen_bounds.is_none());
        assert_eq!(frame.hint, InteractionHint::Idle);
    }
}
