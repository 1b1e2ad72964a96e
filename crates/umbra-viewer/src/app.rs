//! Main application module

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use umbra_renderer::SceneConfig;

use crate::panels::{ControlsPanel, Panel, ViewportPanel};
use crate::state::{
    SharedAppState, SharedViewportState, ViewerError, ViewportState, create_shared_state,
};

/// Main application
pub struct ViewerApp {
    app_state: SharedAppState,
    viewport_state: SharedViewportState,
    controls: ControlsPanel,
    viewport: ViewportPanel,
}

impl ViewerApp {
    /// Create the app, compiling programs and queuing the startup document.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: SceneConfig,
        geometry: Option<PathBuf>,
    ) -> Result<Self, ViewerError> {
        let render_state = cc
            .wgpu_render_state
            .as_ref()
            .ok_or(ViewerError::NoRenderState)?;

        let viewport_state = ViewportState::new(
            render_state.device.clone(),
            render_state.queue.clone(),
            render_state.target_format,
            config,
        )?;

        let app_state = create_shared_state()?;
        if let Some(path) = geometry {
            app_state.lock().load_file(path);
        }

        Ok(Self {
            app_state,
            viewport_state: Arc::new(Mutex::new(viewport_state)),
            controls: ControlsPanel::new(),
            viewport: ViewportPanel::new(render_state.clone()),
        })
    }

    /// Upload documents the loader has finished parsing
    fn process_loaded(&mut self) {
        let documents = self.app_state.lock().loader.drain();
        for document in documents {
            let report = self.viewport_state.lock().apply_document(document);
            self.app_state.lock().last_report = Some(report);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_loaded();

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.controls.ui(ui, &self.app_state, &self.viewport_state);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.viewport.ui(ui, &self.app_state, &self.viewport_state);
            });

        // Continuous frame loop
        ctx.request_repaint();
    }
}
