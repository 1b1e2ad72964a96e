//! Viewport panel

use umbra_core::{InputEvent, PointerDrag};

use crate::panels::Panel;
use crate::state::{SharedAppState, SharedViewportState};

/// Primary-button gesture phase for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragPhase {
    Started,
    Dragged,
    Stopped,
    Idle,
}

impl DragPhase {
    fn of(response: &egui::Response) -> Self {
        let button = egui::PointerButton::Primary;
        if response.drag_stopped_by(button) {
            DragPhase::Stopped
        } else if response.drag_started_by(button) {
            DragPhase::Started
        } else if response.dragged_by(button) {
            DragPhase::Dragged
        } else {
            DragPhase::Idle
        }
    }
}

/// Feed one frame of pointer state to the drag.
///
/// `pos` is local to the image and is `None` on the release frame.
fn drag_events(
    drag: &mut PointerDrag,
    phase: DragPhase,
    pos: Option<egui::Vec2>,
    size: egui::Vec2,
) -> Option<[InputEvent; 2]> {
    match (phase, pos) {
        (DragPhase::Stopped, _) => {
            drag.release();
            None
        }
        (DragPhase::Started, Some(pos)) => Some(drag.press(pos.x, pos.y, size.x, size.y)),
        (DragPhase::Dragged, Some(pos)) => drag.move_to(pos.x, pos.y, size.x, size.y),
        _ => None,
    }
}

/// Central panel showing the rendered frame
///
/// Dragging with the primary button sets rotation from x and zoom from y.
pub struct ViewportPanel {
    render_state: egui_wgpu::RenderState,
    drag: PointerDrag,
}

impl ViewportPanel {
    pub fn new(render_state: egui_wgpu::RenderState) -> Self {
        Self {
            render_state,
            drag: PointerDrag::default(),
        }
    }
}

impl Panel for ViewportPanel {
    fn name(&self) -> &str {
        "Viewport"
    }

    fn ui(
        &mut self,
        ui: &mut egui::Ui,
        app_state: &SharedAppState,
        viewport_state: &SharedViewportState,
    ) {
        let available_size = ui.available_size();
        let pixels_per_point = ui.ctx().pixels_per_point();
        let width = (available_size.x * pixels_per_point) as u32;
        let height = (available_size.y * pixels_per_point) as u32;

        if width == 0 || height == 0 {
            return;
        }

        // Snapshot once; handlers below only affect the next frame
        let input = app_state.lock().input.clone();
        let snapshot = *input.lock();

        let texture_id = {
            let mut state = viewport_state.lock();
            let mut egui_renderer = self.render_state.renderer.write();
            let texture_id = state.ensure_texture(width, height, &mut egui_renderer);
            drop(egui_renderer);
            state.render(&snapshot);
            texture_id
        };

        let Some(texture_id) = texture_id else {
            ui.weak("Viewport unavailable");
            return;
        };

        let response = ui.add(
            egui::Image::new(egui::load::SizedTexture::new(
                texture_id,
                [available_size.x, available_size.y],
            ))
            .sense(egui::Sense::click_and_drag()),
        );

        let phase = DragPhase::of(&response);
        let pos = response
            .interact_pointer_pos()
            .map(|p| p - response.rect.min);
        let size = response.rect.size();

        if let Some(events) = drag_events(&mut self.drag, phase, pos, size) {
            let mut state = input.lock();
            for event in events {
                state.apply(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: egui::Vec2 = egui::Vec2::new(200.0, 100.0);

    #[test]
    fn test_release_without_pointer_position_ends_drag() {
        let mut drag = PointerDrag::default();
        let pressed = drag_events(&mut drag, DragPhase::Started, Some(egui::vec2(50.0, 10.0)), SIZE);
        assert_eq!(pressed, Some([InputEvent::Rotate(90), InputEvent::Zoom(10.0)]));
        assert!(drag.is_active());

        assert!(drag_events(&mut drag, DragPhase::Stopped, None, SIZE).is_none());
        assert!(!drag.is_active());
    }

    #[test]
    fn test_drag_moves_update_rotation_and_zoom() {
        let mut drag = PointerDrag::default();
        drag_events(&mut drag, DragPhase::Started, Some(egui::vec2(0.0, 0.0)), SIZE);
        let moved = drag_events(&mut drag, DragPhase::Dragged, Some(egui::vec2(100.0, 50.0)), SIZE);
        assert_eq!(moved, Some([InputEvent::Rotate(180), InputEvent::Zoom(50.0)]));
    }

    #[test]
    fn test_idle_frames_emit_nothing() {
        let mut drag = PointerDrag::default();
        assert!(drag_events(&mut drag, DragPhase::Idle, Some(egui::vec2(10.0, 10.0)), SIZE).is_none());
        assert!(drag_events(&mut drag, DragPhase::Dragged, Some(egui::vec2(10.0, 10.0)), SIZE).is_none());
        assert!(!drag.is_active());
    }
}
