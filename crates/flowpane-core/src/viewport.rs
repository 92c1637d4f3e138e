//! Viewport transform model for pan/zoom.
//!
//! The viewport owns a [`ViewportState`] and two late-bound geometry surfaces:
//! the container (outer fixed frame) and the view (inner transformed layer).
//! All state changes go through [`Viewport::dispatch`]; after each one the
//! view layer's transform is reapplied and the listener receives a copy of
//! the new state.

use crate::config::ViewportConfig;
use crate::geometry;
use crate::input::PointerMotion;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.5;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 5.0;

/// Pan offset and zoom scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Pan offset in diagram units. The point `offset + container_size / 2`
    /// sits under the container's center and is the fixed point of zooming.
    pub offset: Vec2,
    /// Zoom scale, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewportState {
    /// Apply one action and return the resulting state.
    ///
    /// Surface attachments don't touch the state. Non-finite payloads are
    /// ignored.
    pub fn reduce(self, action: &ViewportAction) -> Self {
        let mut next = self;
        match *action {
            ViewportAction::SetPosition { x, y } => {
                if x.is_finite() && y.is_finite() {
                    next.offset = Vec2::new(x, y);
                }
            }
            ViewportAction::Move { dx, dy } => {
                if dx.is_finite() && dy.is_finite() {
                    next.offset += Vec2::new(dx, dy);
                }
            }
            ViewportAction::Scale { delta } => {
                if delta.is_finite() {
                    next.scale = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
                }
            }
            ViewportAction::AttachContainer(_) | ViewportAction::AttachView(_) => {}
        }
        next
    }

    /// The view layer transform for a container of the given bounds.
    pub fn view_transform(&self, container: Rect) -> ViewTransform {
        let half = Vec2::new(container.width() / 2.0, container.height() / 2.0);
        ViewTransform {
            translate: -self.offset,
            scale: self.scale,
            origin: (self.offset + half).to_point(),
        }
    }
}

/// Visual transform of the view layer: translate, then scale about `origin`.
///
/// `origin` is expressed in the layer's own untransformed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f64,
    pub origin: Point,
}

impl ViewTransform {
    /// The transform as an affine map on layer-local points.
    pub fn affine(&self) -> Affine {
        let origin = self.origin.to_vec2();
        Affine::translate(origin)
            * Affine::translate(self.translate)
            * Affine::scale(self.scale)
            * Affine::translate(-origin)
    }
}

/// A surface whose on-screen bounds can be read.
pub trait BoundsProvider: fmt::Debug {
    /// Current bounds in page coordinates.
    fn bounding_rect(&self) -> Rect;
}

/// A surface that also accepts the viewport's visual transform.
pub trait ViewSurface: BoundsProvider {
    fn apply_transform(&self, transform: ViewTransform);
}

impl BoundsProvider for Rect {
    fn bounding_rect(&self) -> Rect {
        *self
    }
}

impl BoundsProvider for Cell<Rect> {
    fn bounding_rect(&self) -> Rect {
        self.get()
    }
}

/// A geometry reference that becomes available only after layout.
#[derive(Debug)]
pub enum SurfaceRef<T: ?Sized> {
    Uninitialized,
    Attached(Rc<T>),
}

impl<T: ?Sized> Default for SurfaceRef<T> {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl<T: ?Sized> Clone for SurfaceRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            Self::Attached(surface) => Self::Attached(Rc::clone(surface)),
        }
    }
}

impl<T: ?Sized> SurfaceRef<T> {
    /// The attached surface, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Uninitialized => None,
            Self::Attached(surface) => Some(&**surface),
        }
    }
}

/// The inner layer that carries the viewport transform.
///
/// Anchored at the container's top-left corner; its bounding rect follows the
/// last applied transform.
#[derive(Debug, Default)]
pub struct ViewLayer {
    anchor: Cell<Point>,
    size: Cell<Size>,
    transform: Cell<Option<ViewTransform>>,
}

impl ViewLayer {
    /// Create a layer at `anchor` with an untransformed `size`.
    pub fn new(anchor: Point, size: Size) -> Self {
        Self {
            anchor: Cell::new(anchor),
            size: Cell::new(size),
            transform: Cell::new(None),
        }
    }

    pub fn set_anchor(&self, anchor: Point) {
        self.anchor.set(anchor);
    }

    pub fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    /// The last transform applied by the viewport.
    pub fn transform(&self) -> Option<ViewTransform> {
        self.transform.get()
    }
}

impl BoundsProvider for ViewLayer {
    fn bounding_rect(&self) -> Rect {
        let local = Rect::from_origin_size(Point::ZERO, self.size.get());
        let layer = self
            .transform
            .get()
            .map(|t| t.affine())
            .unwrap_or(Affine::IDENTITY);
        (Affine::translate(self.anchor.get().to_vec2()) * layer).transform_rect_bbox(local)
    }
}

impl ViewSurface for ViewLayer {
    fn apply_transform(&self, transform: ViewTransform) {
        self.transform.set(Some(transform));
    }
}

/// Actions accepted by [`Viewport::dispatch`].
#[derive(Debug, Clone)]
pub enum ViewportAction {
    /// Set the offset absolutely.
    SetPosition { x: f64, y: f64 },
    /// Add to the offset.
    Move { dx: f64, dy: f64 },
    /// Add to the scale, clamped.
    Scale { delta: f64 },
    /// Bind the container surface.
    AttachContainer(Rc<dyn BoundsProvider>),
    /// Bind the view surface.
    AttachView(Rc<dyn ViewSurface>),
}

/// Read-only copy of the viewport for one event or frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub state: ViewportState,
    /// Container bounds, `None` until attached.
    pub container: Option<Rect>,
    /// View layer bounds, `None` until attached.
    pub view: Option<Rect>,
}

impl ViewportSnapshot {
    /// Page position of the view layer's top-left corner.
    pub fn view_origin(&self) -> Option<Point> {
        self.view.map(|rect| rect.origin())
    }

    /// Container-local screen position of a diagram point.
    pub fn diagram_to_screen(&self, point: Point) -> Point {
        geometry::diagram_to_screen(point, &self.state, self.container)
    }

    /// Diagram position of a container-local screen point.
    pub fn screen_to_diagram(&self, point: Point) -> Point {
        geometry::screen_to_diagram(point, &self.state, self.container)
    }

    /// Page bounds of a diagram-space rectangle placed in the view layer.
    pub fn layer_rect_to_page(&self, rect: Rect) -> Option<Rect> {
        let origin = self.view_origin()?;
        let scale = self.state.scale;
        Some(Rect::from_origin_size(
            origin + rect.origin().to_vec2() * scale,
            rect.size() * scale,
        ))
    }
}

/// Listener invoked with the new state after every dispatch.
pub type ViewportListener = Box<dyn FnMut(ViewportState)>;

/// The viewport transform model.
pub struct Viewport {
    state: ViewportState,
    container: SurfaceRef<dyn BoundsProvider>,
    view: SurfaceRef<dyn ViewSurface>,
    /// Whether pan/zoom gestures are honored (the drag-lock).
    draggable: bool,
    config: ViewportConfig,
    listener: Option<ViewportListener>,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("state", &self.state)
            .field("container", &self.container)
            .field("view", &self.view)
            .field("draggable", &self.draggable)
            .field("config", &self.config)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    /// Create an unattached viewport at the origin with scale 1.
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            state: ViewportState::default(),
            container: SurfaceRef::Uninitialized,
            view: SurfaceRef::Uninitialized,
            draggable: true,
            config,
            listener: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Register the state listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: impl FnMut(ViewportState) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Bind the container surface.
    pub fn attach_container(&mut self, container: Rc<dyn BoundsProvider>) {
        self.dispatch(ViewportAction::AttachContainer(container));
    }

    /// Bind the view surface.
    pub fn attach_view(&mut self, view: Rc<dyn ViewSurface>) {
        self.dispatch(ViewportAction::AttachView(view));
    }

    /// Apply an action, reapply the view transform and notify the listener.
    pub fn dispatch(&mut self, action: ViewportAction) {
        log::trace!("viewport dispatch: {:?}", action);
        match action {
            ViewportAction::AttachContainer(container) => {
                let bounds = container.bounding_rect();
                self.container = SurfaceRef::Attached(container);
                if self.config.center_on_attach {
                    log::debug!(
                        "centering viewport on {}x{} container",
                        bounds.width(),
                        bounds.height()
                    );
                    self.state = self.state.reduce(&ViewportAction::SetPosition {
                        x: bounds.width() / 2.0,
                        y: bounds.height() / 2.0,
                    });
                }
            }
            ViewportAction::AttachView(view) => {
                self.view = SurfaceRef::Attached(view);
            }
            action => {
                self.state = self.state.reduce(&action);
            }
        }
        self.commit();
    }

    /// Reapply the view transform after a surface changed size.
    pub fn refresh(&mut self) {
        self.commit();
    }

    fn commit(&mut self) {
        if let (Some(container), Some(view)) = (self.container.get(), self.view.get()) {
            view.apply_transform(self.state.view_transform(container.bounding_rect()));
        }
        if let Some(listener) = self.listener.as_mut() {
            listener(self.state);
        }
    }

    /// Current state, by value.
    pub fn current_state(&self) -> ViewportState {
        self.state
    }

    /// Current state plus surface bounds, by value.
    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            state: self.state,
            container: self.container_bounds(),
            view: self.view.get().map(|view| view.bounding_rect()),
        }
    }

    /// Container bounds, if attached.
    pub fn container_bounds(&self) -> Option<Rect> {
        self.container.get().map(|container| container.bounding_rect())
    }

    /// Enable or disable pan/zoom gestures.
    pub fn set_draggable(&mut self, draggable: bool) {
        if self.draggable != draggable {
            log::debug!("viewport draggable: {}", draggable);
        }
        self.draggable = draggable;
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    /// Pan for a pointer move while the primary button or ctrl is held.
    ///
    /// Movement is divided by the scale so the diagram follows the pointer.
    /// Returns whether the viewport moved.
    pub fn handle_pointer_move(&mut self, motion: &PointerMotion) -> bool {
        if !self.draggable {
            return false;
        }
        if !motion.primary_pressed && !motion.modifiers.ctrl {
            return false;
        }
        self.dispatch(ViewportAction::Move {
            dx: -motion.movement.x / self.state.scale,
            dy: -motion.movement.y / self.state.scale,
        });
        true
    }

    /// Zoom for a wheel event. Returns whether the event was consumed.
    pub fn handle_wheel(&mut self, delta: Vec2) -> bool {
        if !self.draggable {
            return false;
        }
        self.dispatch(ViewportAction::Scale {
            delta: delta.y / self.config.scroll_divisor,
        });
        true
    }
}
