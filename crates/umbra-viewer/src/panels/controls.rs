//! Controls panel: sliders, projection, debug toggle and the layer list

use egui::Ui;

use umbra_core::constants::{FULL_TURN_DEGREES, MAX_ZOOM_PERCENT};
use umbra_core::{InputEvent, InputState, ProjectionMode};

use crate::panels::Panel;
use crate::state::{SharedAppState, SharedViewportState};

/// Widget-facing copy of the input state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlValues {
    pub rotation: i32,
    pub light_rotation: i32,
    pub zoom: f32,
    pub projection: ProjectionMode,
    pub show_shadow_map: bool,
}

impl ControlValues {
    pub fn from_state(state: &InputState) -> Self {
        Self {
            rotation: state.rotation(),
            light_rotation: state.light_rotation(),
            zoom: state.zoom(),
            projection: state.projection(),
            show_shadow_map: state.show_shadow_map(),
        }
    }

    /// Events that turn `before` into `self`, one per edited control.
    pub fn changes_from(&self, before: &ControlValues) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if self.rotation != before.rotation {
            events.push(InputEvent::Rotate(self.rotation));
        }
        if self.light_rotation != before.light_rotation {
            events.push(InputEvent::LightRotate(self.light_rotation));
        }
        if self.zoom != before.zoom {
            events.push(InputEvent::Zoom(self.zoom));
        }
        if self.projection != before.projection {
            events.push(InputEvent::Projection(self.projection));
        }
        if self.show_shadow_map != before.show_shadow_map {
            events.push(InputEvent::ShowShadowMap(self.show_shadow_map));
        }
        events
    }
}

/// Side panel driving the input state
#[derive(Default)]
pub struct ControlsPanel;

impl ControlsPanel {
    pub fn new() -> Self {
        Self
    }

    fn view_controls(&self, ui: &mut Ui, app_state: &SharedAppState) {
        let input = app_state.lock().input.clone();
        let before = ControlValues::from_state(&input.lock());
        let mut values = before;

        egui::Grid::new("view_controls")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Rotation");
                ui.add(
                    egui::Slider::new(&mut values.rotation, 0..=FULL_TURN_DEGREES - 1).suffix("°"),
                );
                ui.end_row();

                ui.label("Light");
                ui.add(
                    egui::Slider::new(&mut values.light_rotation, 0..=FULL_TURN_DEGREES)
                        .suffix("°"),
                );
                ui.end_row();

                ui.label("Zoom");
                ui.add(egui::Slider::new(&mut values.zoom, 0.0..=MAX_ZOOM_PERCENT).suffix("%"));
                ui.end_row();

                ui.label("Projection");
                egui::ComboBox::from_id_salt("projection")
                    .selected_text(values.projection.as_str())
                    .show_ui(ui, |ui| {
                        for mode in ProjectionMode::ALL {
                            ui.selectable_value(&mut values.projection, mode, mode.as_str());
                        }
                    });
                ui.end_row();
            });

        ui.checkbox(&mut values.show_shadow_map, "Show shadow map");

        let events = values.changes_from(&before);
        if !events.is_empty() {
            let mut state = input.lock();
            for event in events {
                tracing::debug!("Control changed: {:?}", event);
                state.apply(event);
            }
        }
    }

    fn layer_list(&self, ui: &mut Ui, app_state: &SharedAppState, viewport: &SharedViewportState) {
        ui.horizontal(|ui| {
            if ui.button("Load geometry…").clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("Geometry", &["json"])
                    .pick_file()
            {
                app_state.lock().load_file(path);
            }
            if app_state.lock().is_loading() {
                ui.spinner();
            }
        });

        ui.separator();

        let mut removed = None;
        let mut clear = false;
        {
            let state = viewport.lock();
            let layers = state.scene().layers();
            if layers.is_empty() {
                ui.weak("No layers loaded.");
            } else if ui.button("Clear layers").clicked() {
                clear = true;
            }
            for layer in layers.iter() {
                ui.horizontal(|ui| {
                    if ui.small_button("✕").on_hover_text("Remove layer").clicked() {
                        removed = Some(layer.name().to_string());
                    }
                    ui.label(layer.name());
                    ui.weak(format!("{} tris", layer.vertices().triangle_count()));
                    if layer.depth_bias() {
                        ui.weak("biased");
                    }
                });
            }
        }
        if clear {
            tracing::info!("Clearing all layers");
            viewport.lock().clear_layers();
        } else if let Some(name) = removed {
            tracing::info!("Removing layer '{}'", name);
            viewport.lock().remove_layer(&name);
        }

        let state = app_state.lock();
        if let Some(report) = &state.last_report
            && !report.rejected.is_empty()
        {
            ui.separator();
            for rejection in &report.rejected {
                ui.colored_label(
                    egui::Color32::from_rgb(220, 120, 80),
                    format!("{}: {}", rejection.name, rejection.reason),
                );
            }
        }
    }
}

impl Panel for ControlsPanel {
    fn name(&self) -> &str {
        "Controls"
    }

    fn ui(&mut self, ui: &mut Ui, app_state: &SharedAppState, viewport: &SharedViewportState) {
        ui.heading("View");
        self.view_controls(ui, app_state);

        ui.add_space(12.0);
        ui.heading("Layers");
        self.layer_list(ui, app_state, viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_controls_emit_nothing() {
        let values = ControlValues::from_state(&InputState::new());
        assert!(values.changes_from(&values).is_empty());
    }

    #[test]
    fn test_each_edit_emits_its_event() {
        let before = ControlValues::from_state(&InputState::new());
        let after = ControlValues {
            rotation: 90,
            projection: ProjectionMode::Orthographic,
            show_shadow_map: true,
            ..before
        };
        assert_eq!(
            after.changes_from(&before),
            vec![
                InputEvent::Rotate(90),
                InputEvent::Projection(ProjectionMode::Orthographic),
                InputEvent::ShowShadowMap(true),
            ]
        );
    }

    #[test]
    fn test_applied_changes_reach_state() {
        let mut state = InputState::new();
        let before = ControlValues::from_state(&state);
        let after = ControlValues {
            light_rotation: 45,
            zoom: 30.0,
            ..before
        };
        for event in after.changes_from(&before) {
            state.apply(event);
        }
        assert_eq!(ControlValues::from_state(&state), after);
    }
}
