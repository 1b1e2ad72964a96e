//! Frame orchestration
//!
//! - [`transforms`] - Pure per-frame matrix computation
//! - [`controller`] - Two-pass frame loop body and document ingestion

mod controller;
mod transforms;

pub use controller::{LayerRejection, LoadReport, SceneController};
pub use transforms::{RenderMode, RenderState};
