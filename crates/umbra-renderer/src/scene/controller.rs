//! Scene controller: owns the layers and runs one frame at a time.

use umbra_core::{GeometryError, InputState, LayerEntry};

use crate::backend::{RenderBackend, RenderError};
use crate::config::SceneConfig;
use crate::layer::{LayerOptions, LayerSet, PassKind};
use crate::program::ProgramSet;
use crate::shadow_target::ShadowTarget;

use super::transforms::{RenderMode, RenderState};

/// A layer that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRejection {
    /// Layer name.
    pub name: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Names of the layers that were uploaded.
    pub loaded: Vec<String>,
    /// Layers that were skipped.
    pub rejected: Vec<LayerRejection>,
}

impl LoadReport {
    /// Report for a document that failed as a whole.
    pub fn failed(source: &str, error: &GeometryError) -> Self {
        Self {
            loaded: Vec::new(),
            rejected: vec![LayerRejection {
                name: source.to_string(),
                reason: error.to_string(),
            }],
        }
    }
}

/// Owns every piece of per-scene state
pub struct SceneController {
    config: SceneConfig,
    layers: LayerSet,
    shadow_target: ShadowTarget,
    programs: ProgramSet,
    last_state: Option<RenderState>,
}

impl SceneController {
    /// Compile the programs and allocate the shadow target.
    ///
    /// Any failure here is fatal for the viewer.
    pub fn new<B: RenderBackend>(backend: &mut B, config: SceneConfig) -> Result<Self, RenderError> {
        let programs = ProgramSet::compile(backend)?;
        let shadow_target = ShadowTarget::new(backend, config.shadow.map_size)?;
        tracing::info!(
            "Scene ready: shadow map {}x{}",
            shadow_target.size(),
            shadow_target.size()
        );

        Ok(Self {
            config,
            layers: LayerSet::new(),
            shadow_target,
            programs,
            last_state: None,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Loaded layers.
    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// Shadow target.
    pub fn shadow_target(&self) -> &ShadowTarget {
        &self.shadow_target
    }

    /// Matrices used by the last successful frame.
    pub fn last_state(&self) -> Option<&RenderState> {
        self.last_state.as_ref()
    }

    /// Upload a layer, taking the depth-bias flag from the configuration when
    /// `depth_bias` is `None`.
    pub fn add_layer<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        vertices: umbra_core::VertexSet,
        depth_bias: Option<bool>,
    ) -> Result<(), RenderError> {
        let options = LayerOptions {
            depth_bias: self.config.layers.depth_bias_for(name, depth_bias),
        };
        self.layers.add_layer(backend, name, vertices, options)
    }

    /// Remove a layer by name. Missing names are ignored.
    pub fn remove_layer<B: RenderBackend>(&mut self, backend: &mut B, name: &str) -> bool {
        self.layers.remove_layer(backend, name)
    }

    /// Remove every layer.
    pub fn clear<B: RenderBackend>(&mut self, backend: &mut B) {
        self.layers.clear(backend);
    }

    /// Ingest a parsed document layer by layer.
    ///
    /// Invalid layers are reported and skipped; layers already loaded stay
    /// untouched by a rejection.
    pub fn apply_document<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        entries: Vec<LayerEntry>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for entry in entries {
            let outcome = entry
                .result
                .map_err(|e| e.to_string())
                .and_then(|source| {
                    self.add_layer(backend, &entry.name, source.vertices, source.depth_bias)
                        .map_err(|e| e.to_string())
                });

            match outcome {
                Ok(()) => report.loaded.push(entry.name),
                Err(reason) => {
                    tracing::warn!("Rejected layer '{}': {}", entry.name, reason);
                    report.rejected.push(LayerRejection {
                        name: entry.name,
                        reason,
                    });
                }
            }
        }

        report
    }

    /// Render one frame.
    ///
    /// The depth pass always runs; the screen pass shows either the shaded
    /// layers or the raw shadow map.
    pub fn frame<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        input: &InputState,
    ) -> Result<(), RenderError> {
        let (width, height) = backend.surface_size();
        if width == 0 || height == 0 {
            return Err(RenderError::SurfaceUnavailable);
        }
        let aspect = width as f32 / height as f32;

        let state = RenderState::compute(self.layers.centroid(), input, aspect, &self.config);
        let shadow_map = self.shadow_target.handle();
        let shadow_bias = self.config.shadow.bias;

        backend.begin_frame(self.config.viewport.clear_color)?;

        {
            let mut pass = self.shadow_target.start(backend)?;
            self.layers.draw(
                pass.backend(),
                &self.programs,
                &state,
                PassKind::Depth,
                shadow_map,
                shadow_bias,
            )?;
        }

        match state.mode {
            RenderMode::Normal => self.layers.draw(
                backend,
                &self.programs,
                &state,
                PassKind::Color,
                shadow_map,
                shadow_bias,
            )?,
            RenderMode::ShadowMap => backend.draw_fullscreen(self.programs.present, shadow_map)?,
        }

        backend.end_frame()?;
        tracing::trace!("Frame {}x{} with {} layers", width, height, self.layers.len());
        self.last_state = Some(state);
        Ok(())
    }
}
