//! Core application state and lifecycle.

use flowpane_core::{
    ComponentAction, ConfigError, InteractionHint, Modifiers, MouseButton, PointerEvent, Shape,
    ViewLayer, ViewportConfig,
};
use flowpane_render::{FlowchartRender, RenderContext, Renderer};
use kurbo::{Point, Rect, Size, Vec2};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{CursorIcon, Window, WindowId};

use crate::shortcuts::ShortcutRegistry;

/// Environment variable naming a JSON viewport config file.
pub const CONFIG_ENV_VAR: &str = "FLOWPANE_CONFIG";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub viewport: ViewportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Flowpane".to_string(),
            width: 1280,
            height: 800,
            viewport: ViewportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, with the viewport section read from `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = Self::default();
        if let Some(path) = path {
            log::info!("Loading viewport config from {}", path.display());
            config.viewport = ViewportConfig::load(path)?;
        }
        Ok(config)
    }

    /// Like [`AppConfig::load`] with the path taken from `FLOWPANE_CONFIG`.
    pub fn from_env() -> Result<Self, AppError> {
        let path = std::env::var_os(CONFIG_ENV_VAR);
        Self::load(path.as_deref().map(Path::new))
    }
}

/// Renderer that logs a summary of each frame.
#[derive(Debug, Default)]
pub struct FrameLogger {
    frames: u64,
}

impl Renderer for FrameLogger {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.frames += 1;
        log::debug!(
            "frame {}: {} shapes, {} connectors, offset ({:.1}, {:.1}), scale {:.2}",
            self.frames,
            ctx.shapes.len(),
            ctx.connectors.len(),
            ctx.viewport.state.offset.x,
            ctx.viewport.state.offset.y,
            ctx.viewport.state.scale,
        );
        for view in &ctx.shapes {
            log::trace!("  {:?} {} at {:?}", view.kind, view.id, view.screen_bounds);
        }
    }
}

/// Cursor for an interaction hint.
pub fn cursor_icon(hint: InteractionHint) -> CursorIcon {
    match hint.cursor_name().as_str() {
        "grab" => CursorIcon::Grab,
        "grabbing" => CursorIcon::Grabbing,
        "n-resize" => CursorIcon::NResize,
        "s-resize" => CursorIcon::SResize,
        "e-resize" => CursorIcon::EResize,
        "w-resize" => CursorIcon::WResize,
        "ne-resize" => CursorIcon::NeResize,
        "nw-resize" => CursorIcon::NwResize,
        "se-resize" => CursorIcon::SeResize,
        "sw-resize" => CursorIcon::SwResize,
        _ => CursorIcon::Default,
    }
}

fn core_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Runtime state that exists once the window does.
struct AppState {
    window: Arc<Window>,
    container: Rc<Cell<Rect>>,
    view: Rc<ViewLayer>,
}

/// The native application.
pub struct App {
    config: AppConfig,
    flowchart: FlowchartRender,
    renderer: FrameLogger,
    state: Option<AppState>,
    seeded: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut flowchart = FlowchartRender::new(config.viewport.clone());
        flowchart.viewport_mut().set_listener(|state| {
            log::trace!(
                "viewport offset ({:.1}, {:.1}) scale {:.2}",
                state.offset.x,
                state.offset.y,
                state.scale
            );
        });
        Self {
            config,
            flowchart,
            renderer: FrameLogger::default(),
            state: None,
            seeded: false,
        }
    }

    /// Create the event loop and run until the window closes.
    pub fn run(config: AppConfig) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        let mut app = App::new(config);
        ShortcutRegistry::log_all();
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    /// Place the starter shapes around the container's center.
    fn seed_shapes(&mut self, size: Size) {
        if self.seeded {
            return;
        }
        self.seeded = true;
        let snapshot = self.flowchart.viewport().snapshot();
        let center = snapshot.screen_to_diagram(Point::new(size.width / 2.0, size.height / 2.0));
        self.flowchart.dispatch(ComponentAction::Add(Shape::rectangle(
            center + Vec2::new(-160.0, -50.0),
            120.0,
            80.0,
        )));
        self.flowchart.dispatch(ComponentAction::Add(Shape::circle(
            center + Vec2::new(60.0, -50.0),
            100.0,
            100.0,
        )));
    }

    fn redraw(&mut self) {
        let frame = self.flowchart.frame();
        self.renderer.build_scene(&frame);
        if let Some(state) = &self.state {
            state.window.set_cursor(cursor_icon(frame.hint));
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.flowchart.handle_pointer_event(&event);
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        log::info!("Creating window...");
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let size = if inner.width == 0 || inner.height == 0 {
            Size::new(self.config.width as f64, self.config.height as f64)
        } else {
            Size::new(inner.width as f64, inner.height as f64)
        };
        log::info!("Surface size: {}x{}", size.width, size.height);

        let container = Rc::new(Cell::new(Rect::from_origin_size(Point::ZERO, size)));
        let view = Rc::new(ViewLayer::new(Point::ZERO, size));
        self.flowchart.attach_container(container.clone());
        self.flowchart.attach_view(view.clone());
        self.seed_shapes(size);

        window.request_redraw();
        self.state = Some(AppState {
            window,
            container,
            view,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.state.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                let size = Size::new(size.width as f64, size.height as f64);
                if let Some(state) = &self.state {
                    state.container.set(Rect::from_origin_size(Point::ZERO, size));
                    state.view.set_size(size);
                    state.window.request_redraw();
                }
                self.flowchart.viewport_mut().refresh();
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer(PointerEvent::Move {
                    position: Point::new(position.x, position.y),
                });
            }

            WindowEvent::MouseInput { state: btn_state, button, .. } => {
                let Some(button) = core_button(button) else {
                    return;
                };
                let position = self.flowchart.input().pointer_position;
                let event = match btn_state {
                    ElementState::Pressed => PointerEvent::Down { position, button },
                    ElementState::Released => PointerEvent::Up { position, button },
                };
                self.pointer(event);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(x as f64 * 20.0, y as f64 * 20.0),
                    MouseScrollDelta::PixelDelta(pos) => Vec2::new(pos.x, pos.y),
                };
                let position = self.flowchart.input().pointer_position;
                // winit reports wheel-down as negative y; the zoom expects positive.
                self.pointer(PointerEvent::Scroll {
                    position,
                    delta: -scroll,
                });
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.flowchart.set_modifiers(Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key(),
                    alt: state.alt_key(),
                    meta: state.super_key(),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match &event.logical_key {
                    Key::Character(c) => {
                        if let Some(selection) = ShortcutRegistry::selection_for_key(c.as_str()) {
                            self.flowchart.set_selection(selection);
                        }
                    }
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    _ => {}
                }
            }

            _ => {}
        }
    }
}
