//! Umbra viewer
//!
//! egui front end: a controls panel writing the shared input state and a
//! viewport panel showing the offscreen render.

pub mod app;
pub mod cli;
pub mod panels;
pub mod state;

pub use app::ViewerApp;
pub use cli::Args;
pub use state::{AppState, SharedAppState, SharedViewportState, ViewerError, ViewportState};
