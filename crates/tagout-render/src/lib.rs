//! Tagout Render Library
//!
//! Turns editor and plan state into backend-neutral draw commands.
//! Hosts replay the [`DisplayList`] onto whatever canvas they draw with.

mod renderer;
mod scene;

pub use renderer::{DisplayList, DrawCommand, Renderer, inspection_color, point_status_color, render};
pub use scene::{PendingDrawing, PlanOverlay, SceneState};
