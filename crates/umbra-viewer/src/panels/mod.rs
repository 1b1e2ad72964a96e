//! UI panels

mod controls;
mod viewport;

pub use controls::{ControlValues, ControlsPanel};
pub use viewport::ViewportPanel;

use crate::state::{SharedAppState, SharedViewportState};

/// Panel trait for the viewer's UI regions
pub trait Panel {
    /// Panel name
    fn name(&self) -> &str;

    /// Draw the panel UI
    fn ui(
        &mut self,
        ui: &mut egui::Ui,
        app_state: &SharedAppState,
        viewport_state: &SharedViewportState,
    );
}
