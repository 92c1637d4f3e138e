//! Flowpane Render Library
//!
//! Composes the core model into frames: the [`FlowchartRender`] orchestrator
//! routes pointer input and describes each frame as a [`RenderContext`] for
//! any [`Renderer`] backend.

mod orchestrator;
mod renderer;

pub use orchestrator::{FlowchartRender, SelectionState};
pub use renderer::{Connector, DrawCommand, RecordingRenderer, RenderContext, Renderer, ShapeView};
