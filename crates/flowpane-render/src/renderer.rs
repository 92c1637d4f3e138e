//! Renderer trait abstraction.

use flowpane_core::{InteractionHint, ShapeId, ShapeKind, ShapeStyle, ViewportSnapshot};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;

/// One shape as it should appear this frame.
#[derive(Debug, Clone, Copy)]
pub struct ShapeView {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Presentation payload (diagram-space placement plus hint).
    pub style: ShapeStyle,
    /// Page bounds, `None` until the view layer is attached.
    pub screen_bounds: Option<Rect>,
    /// Maps the shape's local box `(0, 0)..size` to page coordinates,
    /// rotation included.
    pub transform: Affine,
}

/// A straight connector line between two shapes.
#[derive(Debug, Clone, Copy)]
pub struct Connector {
    pub from_shape: ShapeId,
    pub to_shape: ShapeId,
    /// Start point, container-local screen coordinates.
    pub from: Point,
    /// End point, container-local screen coordinates.
    pub to: Point,
}

/// Context for a single render frame.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Viewport state and surface bounds this frame was built from.
    pub viewport: ViewportSnapshot,
    /// Container size, zero while unattached.
    pub viewport_size: Size,
    /// Shapes in z-order (back to front).
    pub shapes: Vec<ShapeView>,
    /// Connector overlay, drawn on top of the canvas background.
    pub connectors: Vec<Connector>,
    /// Background color.
    pub background_color: Color,
    /// Connector stroke color.
    pub connector_color: Color,
    /// Connector stroke width in pixels.
    pub connector_width: f64,
    /// Affordance for the shape under (or held by) the pointer.
    pub hint: InteractionHint,
}

impl RenderContext {
    /// Create an empty frame for a viewport snapshot.
    pub fn new(viewport: ViewportSnapshot) -> Self {
        Self {
            viewport,
            viewport_size: viewport.container.map(|rect| rect.size()).unwrap_or(Size::ZERO),
            shapes: Vec::new(),
            connectors: Vec::new(),
            background_color: Color::from_rgba8(250, 250, 250, 255),
            connector_color: Color::from_rgba8(0, 0, 0, 255),
            connector_width: 1.0,
            hint: InteractionHint::Idle,
        }
    }

    pub fn with_shapes(mut self, shapes: Vec<ShapeView>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn with_connectors(mut self, connectors: Vec<Connector>) -> Self {
        self.connectors = connectors;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the connector stroke.
    pub fn with_connector_stroke(mut self, color: Color, width: f64) -> Self {
        self.connector_color = color;
        self.connector_width = width;
        self
    }

    pub fn with_hint(mut self, hint: InteractionHint) -> Self {
        self.hint = hint;
        self
    }

    /// Look up a shape view by id.
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeView> {
        self.shapes.iter().find(|view| view.id == id)
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    ///
    /// Called once per frame; should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// A recorded drawing operation.
#[derive(Debug, Clone, Copy)]
pub enum DrawCommand {
    /// Clear the surface.
    Clear(Color),
    /// Fill and outline a shape's local box through `transform`.
    Shape {
        id: ShapeId,
        kind: ShapeKind,
        size: Size,
        transform: Affine,
    },
    /// Stroke a straight line.
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
}

/// Renderer that records the draw commands of the last frame.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
    frames: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the most recent frame.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of frames built so far.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn shape_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Shape { .. }))
    }

    pub fn line_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Line { .. }))
    }
}

impl Renderer for RecordingRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.commands.clear();
        self.frames += 1;
        self.commands.push(DrawCommand::Clear(self.background_color(ctx)));

        for view in &ctx.shapes {
            self.commands.push(DrawCommand::Shape {
                id: view.id,
                kind: view.kind,
                size: view.style.size,
                transform: view.transform,
            });
        }

        // Connectors sit on the canvas overlay above the shapes.
        for connector in &ctx.connectors {
            self.commands.push(DrawCommand::Line {
                from: connector.from,
                to: connector.to,
                color: ctx.connector_color,
                width: ctx.connector_width,
            });
        }
    }
}
