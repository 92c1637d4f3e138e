//! Flowpane Core Library
//!
//! Platform-agnostic model for the flowpane diagram surface: coordinate math,
//! the pan/zoom viewport, the shape collection and per-shape pointer
//! interaction.

pub mod components;
pub mod config;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod viewport;

pub use components::{ComponentAction, Shape, ShapeCollection, ShapeId, ShapeKind, ShapePatch};
pub use config::{ConfigError, ConfigResult, ViewportConfig};
pub use geometry::{diagram_to_screen, dilate, dilate_around_point, screen_to_diagram, screen_to_element_local};
pub use input::{InputState, Modifiers, MouseButton, PointerEvent, PointerMotion};
pub use interaction::{
    classify_edge, ControllerResponse, DragState, InteractionHint, LockRequest, ResizeMask,
    ShapeController, ShapeStyle,
};
pub use viewport::{
    BoundsProvider, SurfaceRef, ViewLayer, ViewSurface, ViewTransform, Viewport, ViewportAction,
    ViewportListener, ViewportSnapshot, ViewportState, MAX_SCALE, MIN_SCALE,
};
