//! Flowpane Application
//!
//! The native shell: windowing, input translation and frame logging around
//! the flowchart orchestrator.

mod app;
mod shortcuts;

pub use app::{App, AppConfig, AppError, FrameLogger, CONFIG_ENV_VAR, cursor_icon};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};
