//! Shading programs and their named interfaces.

use std::fmt;

use crate::backend::{ProgramHandle, RenderBackend, RenderError};

/// The three programs of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Light-space depth pass.
    Depth,
    /// Eye-space color pass with the shadow lookup.
    Shaded,
    /// Full-screen display of the raw shadow map.
    Present,
}

/// Named inputs a program accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInterface {
    /// Per-vertex attribute streams.
    pub attributes: &'static [&'static str],
    /// Per-draw uniforms.
    pub uniforms: &'static [&'static str],
}

impl ProgramKind {
    /// All programs, in compile order.
    pub const ALL: [ProgramKind; 3] = [ProgramKind::Depth, ProgramKind::Shaded, ProgramKind::Present];

    /// Attribute and uniform names of this program.
    pub fn interface(&self) -> ProgramInterface {
        match self {
            ProgramKind::Depth => ProgramInterface {
                attributes: &["position"],
                uniforms: &["model", "view", "projection", "color"],
            },
            ProgramKind::Shaded => ProgramInterface {
                attributes: &["position", "normal"],
                uniforms: &[
                    "model",
                    "view",
                    "projection",
                    "light_view",
                    "light_projection",
                    "light_direction",
                    "color",
                    "has_normals",
                    "shadow_bias",
                    "shadow_map",
                ],
            },
            ProgramKind::Present => ProgramInterface {
                attributes: &["position"],
                uniforms: &["shadow_map"],
            },
        }
    }

    /// Whether the program samples a depth target.
    pub fn samples_shadow_map(&self) -> bool {
        self.interface().uniforms.contains(&"shadow_map")
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgramKind::Depth => "depth",
            ProgramKind::Shaded => "shaded",
            ProgramKind::Present => "present",
        };
        f.write_str(name)
    }
}

/// Handles of the compiled programs, shared by every layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSet {
    /// Light-space depth program.
    pub depth: ProgramHandle,
    /// Eye-space shaded program.
    pub shaded: ProgramHandle,
    /// Shadow-map display program.
    pub present: ProgramHandle,
}

impl ProgramSet {
    /// Compile all programs. The first failure aborts.
    pub fn compile<B: RenderBackend>(backend: &mut B) -> Result<Self, RenderError> {
        let depth = backend.compile_program(ProgramKind::Depth)?;
        let shaded = backend.compile_program(ProgramKind::Shaded)?;
        let present = backend.compile_program(ProgramKind::Present)?;
        tracing::info!("Compiled {} shading programs", ProgramKind::ALL.len());
        Ok(Self {
            depth,
            shaded,
            present,
        })
    }
}
