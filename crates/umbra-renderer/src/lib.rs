//! Umbra renderer
//!
//! Two-pass shadow-map rendering of layered geometry.
//!
//! # Architecture
//!
//! - [`backend::RenderBackend`] - The GPU seam; frame logic never touches wgpu directly
//! - [`wgpu_backend::WgpuBackend`] - wgpu implementation rendering to an offscreen texture
//! - [`program`] - The depth, shaded and present programs
//! - [`shadow_target::ShadowTarget`] - Light-space depth target with a scoped pass guard
//! - [`layer::LayerSet`] - Named layers, their meshes and the scene centroid
//! - [`scene::SceneController`] - Per-frame matrices and the two-pass frame
//! - [`loader::LayerLoader`] - Background document parsing
//! - [`config::SceneConfig`] - RON-serializable tunables
//!
//! # Module Structure
//!
//! ```text
//! umbra-renderer/
//! ├── backend.rs        # RenderBackend trait, handles, draw calls
//! ├── program.rs        # Program kinds and interfaces
//! ├── shadow_target.rs  # Depth target + RAII pass guard
//! ├── layer.rs          # LayerSet
//! ├── scene/            # RenderState, SceneController
//! ├── loader.rs         # Worker-thread document loading
//! ├── config.rs         # SceneConfig
//! ├── wgpu_backend/     # wgpu implementation
//! └── shaders/          # WGSL sources
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod layer;
pub mod loader;
pub mod program;
pub mod scene;
pub mod shadow_target;
pub mod vertex;
pub mod wgpu_backend;

#[cfg(test)]
mod recording;

pub use backend::{
    DepthUniforms, DrawCall, LayerUniforms, MeshHandle, ProgramHandle, RenderBackend, RenderError,
    ShadedUniforms, TargetHandle,
};
pub use config::{ConfigError, SceneConfig};
pub use layer::{Layer, LayerOptions, LayerSet, PassKind};
pub use loader::{LayerLoader, LoadedDocument};
pub use program::{ProgramKind, ProgramSet};
pub use scene::{LayerRejection, LoadReport, RenderMode, RenderState, SceneController};
pub use shadow_target::{ShadowPass, ShadowTarget};
pub use wgpu_backend::WgpuBackend;
