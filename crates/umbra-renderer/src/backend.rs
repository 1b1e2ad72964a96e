//! GPU abstraction used by the frame logic.
//!
//! Everything above this module speaks in handles and typed uniforms; the
//! [`crate::wgpu_backend::WgpuBackend`] turns those into buffers, pipelines
//! and render passes.

use glam::{Mat4, Vec3};
use umbra_core::VertexSet;

use crate::program::ProgramKind;

/// Errors raised by a render backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// A shading program failed to compile or link.
    #[error("Failed to compile {program} program: {reason}")]
    ProgramCompile {
        /// Which program failed.
        program: ProgramKind,
        /// Compiler log.
        reason: String,
    },

    /// A GPU buffer or texture could not be created.
    #[error("Failed to create {resource}: {reason}")]
    ResourceCreation {
        /// What was being created.
        resource: String,
        /// Underlying error.
        reason: String,
    },

    /// The shadow map cannot be zero-sized or exceed the device limit.
    #[error("Invalid shadow map size: {0}")]
    InvalidShadowMapSize(u32),

    /// No output surface to draw into.
    #[error("No output surface available")]
    SurfaceUnavailable,

    /// A handle that the backend never issued, or already released.
    #[error("Unknown {kind} handle {id}")]
    UnknownHandle {
        /// Handle type.
        kind: &'static str,
        /// Raw handle value.
        id: u64,
    },

    /// Uniforms do not match the program they are drawn with.
    #[error("Uniforms do not match the {0} program")]
    UniformMismatch(ProgramKind),

    /// A shaded draw without a shadow map to sample.
    #[error("Shaded draw issued without a shadow map")]
    MissingShadowMap,

    /// A frame call arrived outside `begin_frame` / `end_frame`.
    #[error("No frame in progress")]
    NoFrameInProgress,
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// Raw handle value.
            pub fn id(self) -> u64 {
                self.0
            }
        }
    };
}

handle!(
    /// A compiled shading program.
    ProgramHandle
);
handle!(
    /// An uploaded triangle mesh.
    MeshHandle
);
handle!(
    /// A depth-only render target.
    TargetHandle
);

/// Uniforms of the light-space depth program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthUniforms {
    /// Object transform.
    pub model: Mat4,
    /// Light view.
    pub view: Mat4,
    /// Light projection.
    pub projection: Mat4,
    /// Layer color.
    pub color: [f32; 4],
}

/// Uniforms of the eye-space shaded program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedUniforms {
    /// Object transform.
    pub model: Mat4,
    /// Eye view.
    pub view: Mat4,
    /// Eye projection.
    pub projection: Mat4,
    /// Light view, for the shadow lookup.
    pub light_view: Mat4,
    /// Light projection, for the shadow lookup.
    pub light_projection: Mat4,
    /// Unit vector pointing towards the light.
    pub light_direction: Vec3,
    /// Layer color.
    pub color: [f32; 4],
    /// Whether the mesh carries a real normal stream.
    pub has_normals: bool,
    /// Depth comparison bias for the shadow lookup.
    pub shadow_bias: f32,
}

/// Uniform block for one draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerUniforms {
    /// Light-space depth pass.
    Depth(DepthUniforms),
    /// Eye-space color pass.
    Shaded(ShadedUniforms),
}

impl LayerUniforms {
    /// Program kind these uniforms belong to.
    pub fn program_kind(&self) -> ProgramKind {
        match self {
            LayerUniforms::Depth(_) => ProgramKind::Depth,
            LayerUniforms::Shaded(_) => ProgramKind::Shaded,
        }
    }
}

/// One indexed triangle draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Program to draw with.
    pub program: ProgramHandle,
    /// Mesh to draw.
    pub mesh: MeshHandle,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Per-draw uniforms.
    pub uniforms: LayerUniforms,
    /// Use the rasterizer depth bias.
    pub depth_bias: bool,
    /// Depth target sampled for the shadow lookup.
    pub shadow_map: Option<TargetHandle>,
}

/// GPU seam of the renderer
///
/// Frame calls come in a fixed order:
/// `begin_frame`, any number of `begin_depth_pass` .. `end_depth_pass`
/// blocks, screen draws, then `end_frame`. Draws issued inside a depth pass
/// go to that target; all others go to the output surface.
pub trait RenderBackend {
    /// Compile one shading program.
    fn compile_program(&mut self, kind: ProgramKind) -> Result<ProgramHandle, RenderError>;

    /// Allocate a square depth target that can later be sampled.
    fn create_depth_target(&mut self, size: u32) -> Result<TargetHandle, RenderError>;

    /// Upload a vertex set.
    fn create_mesh(&mut self, label: &str, vertices: &VertexSet)
    -> Result<MeshHandle, RenderError>;

    /// Release a mesh. Unknown handles are ignored.
    fn destroy_mesh(&mut self, mesh: MeshHandle);

    /// Current output size in pixels, `(0, 0)` when there is none.
    fn surface_size(&self) -> (u32, u32);

    /// Start a frame that clears the output to `clear_color`.
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError>;

    /// Redirect draws into `target`, cleared to depth 1.0, viewport = target size.
    fn begin_depth_pass(&mut self, target: TargetHandle) -> Result<(), RenderError>;

    /// Restore the output surface as the draw destination.
    fn end_depth_pass(&mut self);

    /// Issue an indexed draw.
    fn draw_mesh(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    /// Draw the full-screen quad with `program`, sampling `texture`.
    fn draw_fullscreen(
        &mut self,
        program: ProgramHandle,
        texture: TargetHandle,
    ) -> Result<(), RenderError>;

    /// Submit the frame.
    fn end_frame(&mut self) -> Result<(), RenderError>;
}
