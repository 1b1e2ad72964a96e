//! Viewer state

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use umbra_core::{InputState, SharedInput, create_shared_input};
use umbra_renderer::{
    LayerLoader, LoadReport, LoadedDocument, RenderError, SceneConfig, SceneController,
    WgpuBackend,
};

/// Errors that prevent the viewer from starting
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("The wgpu renderer is not available")]
    NoRenderState,

    #[error("Renderer initialization failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to start the loader thread: {0}")]
    Loader(#[from] std::io::Error),
}

/// Output texture as registered with egui
struct RegisteredTexture {
    id: egui::TextureId,
    width: u32,
    height: u32,
}

/// GPU side of the viewer: backend, scene and the egui texture
pub struct ViewportState {
    backend: WgpuBackend,
    scene: SceneController,
    texture: Option<RegisteredTexture>,
}

impl ViewportState {
    /// Compile the programs and allocate the shadow map.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        config: SceneConfig,
    ) -> Result<Self, RenderError> {
        let mut backend = WgpuBackend::new(device, queue, format, &config.shadow);
        let scene = SceneController::new(&mut backend, config)?;
        Ok(Self {
            backend,
            scene,
            texture: None,
        })
    }

    /// Scene controller.
    pub fn scene(&self) -> &SceneController {
        &self.scene
    }

    /// Ensure the output texture matches the requested size
    pub fn ensure_texture(
        &mut self,
        width: u32,
        height: u32,
        egui_renderer: &mut egui_wgpu::Renderer,
    ) -> Option<egui::TextureId> {
        let width = width.max(1);
        let height = height.max(1);

        let current = self
            .texture
            .as_ref()
            .filter(|t| t.width == width && t.height == height);
        if let Some(texture) = current {
            return Some(texture.id);
        }

        self.backend.resize(width, height);
        if let Some(old) = self.texture.take() {
            egui_renderer.free_texture(&old.id);
        }

        let view = self.backend.output_view()?;
        let id = egui_renderer.register_native_texture(
            self.backend.device(),
            view,
            wgpu::FilterMode::Linear,
        );
        self.texture = Some(RegisteredTexture { id, width, height });
        Some(id)
    }

    /// Render one frame into the output texture.
    pub fn render(&mut self, input: &InputState) {
        if let Err(e) = self.scene.frame(&mut self.backend, input) {
            tracing::error!("Frame failed: {}", e);
        }
    }

    /// Upload a parsed document.
    pub fn apply_document(&mut self, document: LoadedDocument) -> LoadReport {
        match document.result {
            Ok(entries) => {
                let report = self.scene.apply_document(&mut self.backend, entries);
                tracing::info!(
                    "Loaded {} layers from {} ({} rejected)",
                    report.loaded.len(),
                    document.source,
                    report.rejected.len()
                );
                report
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", document.source, e);
                LoadReport::failed(&document.source, &e)
            }
        }
    }

    /// Remove a layer by name.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        self.scene.remove_layer(&mut self.backend, name)
    }

    /// Remove every layer.
    pub fn clear_layers(&mut self) {
        self.scene.clear(&mut self.backend);
    }
}

/// Viewport state shared between panels
pub type SharedViewportState = Arc<Mutex<ViewportState>>;

/// CPU side of the viewer
pub struct AppState {
    /// Written by the controls and the viewport drag, read once per frame.
    pub input: SharedInput,
    /// Background document parser.
    pub loader: LayerLoader,
    /// Outcome of the last finished load.
    pub last_report: Option<LoadReport>,
}

impl AppState {
    /// Start the loader thread.
    pub fn new() -> Result<Self, ViewerError> {
        Ok(Self {
            input: create_shared_input(),
            loader: LayerLoader::spawn()?,
            last_report: None,
        })
    }

    /// Queue a geometry file.
    pub fn load_file(&mut self, path: PathBuf) {
        tracing::info!("Queued {}", path.display());
        self.loader.load_file(path);
    }

    /// Whether documents are still being parsed.
    pub fn is_loading(&self) -> bool {
        self.loader.pending() > 0
    }
}

/// Application state shared between panels
pub type SharedAppState = Arc<Mutex<AppState>>;

/// Create the shared application state.
pub fn create_shared_state() -> Result<SharedAppState, ViewerError> {
    Ok(Arc::new(Mutex::new(AppState::new()?)))
}
