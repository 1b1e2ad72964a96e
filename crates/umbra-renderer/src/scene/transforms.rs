//! Per-frame matrices derived from the interactive state.

use glam::{Mat4, Vec3};
use umbra_core::constants::MAX_ZOOM_PERCENT;
use umbra_core::transform;
use umbra_core::{InputState, ProjectionMode};

use crate::config::{CameraConfig, LightConfig, SceneConfig};

/// What the screen pass shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Shaded layers with shadows.
    #[default]
    Normal,
    /// The raw light-space depth buffer.
    ShadowMap,
}

/// Matrices of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Object rotation about the centroid.
    pub model: Mat4,
    /// Eye view.
    pub view: Mat4,
    /// Eye projection.
    pub projection: Mat4,
    /// Light view.
    pub light_view: Mat4,
    /// Light projection.
    pub light_projection: Mat4,
    /// Unit vector from the centroid towards the light.
    pub light_direction: Vec3,
    /// Screen pass selection.
    pub mode: RenderMode,
}

impl RenderState {
    /// Compute every matrix from one centroid snapshot.
    pub fn compute(centroid: Vec3, input: &InputState, aspect: f32, config: &SceneConfig) -> Self {
        let mode = if input.show_shadow_map() {
            RenderMode::ShadowMap
        } else {
            RenderMode::Normal
        };

        let model = match mode {
            RenderMode::Normal => {
                transform::rotate_about(centroid, (input.rotation() as f32).to_radians())
            }
            RenderMode::ShadowMap => transform::identity(),
        };

        let zoom = input.zoom() / MAX_ZOOM_PERCENT;
        let view = eye_view(centroid, zoom, &config.camera);
        let projection = eye_projection(input.projection(), zoom, aspect, &config.camera);

        let light_eye = light_position(centroid, input.light_angle(), mode, &config.light);
        let light_view = transform::look_at(light_eye, centroid, Vec3::Z);
        let light_projection = light_projection(&config.light);
        let light_direction = (light_eye - centroid).normalize_or_zero();

        Self {
            model,
            view,
            projection,
            light_view,
            light_projection,
            light_direction,
            mode,
        }
    }
}

/// Distance-scaled value that shrinks by `zoom_range` at full zoom.
fn zoomed(base: f32, zoom: f32, camera: &CameraConfig) -> f32 {
    base - zoom * base * camera.zoom_range
}

fn eye_view(centroid: Vec3, zoom: f32, camera: &CameraConfig) -> Mat4 {
    let distance = zoomed(camera.max_distance, zoom, camera);
    let eye = centroid + Vec3::splat(distance);
    transform::multiply_chain(&[
        transform::translate(Vec3::new(0.0, 0.0, -distance)),
        transform::look_at(eye, centroid, Vec3::Z),
    ])
}

fn eye_projection(mode: ProjectionMode, zoom: f32, aspect: f32, camera: &CameraConfig) -> Mat4 {
    match mode {
        ProjectionMode::Perspective => transform::perspective(
            camera.fov_degrees.to_radians(),
            aspect,
            camera.near_plane,
            camera.far_plane,
        ),
        ProjectionMode::Orthographic => {
            let half = zoomed(camera.ortho_half_extent, zoom, camera);
            transform::orthographic(
                -aspect * half,
                aspect * half,
                -half,
                half,
                camera.ortho_near_plane,
                camera.far_plane,
            )
        }
    }
}

/// Light position orbiting the centroid.
///
/// The x offset is mirrored while the shadow map is displayed.
fn light_position(centroid: Vec3, angle_degrees: f32, mode: RenderMode, light: &LightConfig) -> Vec3 {
    let angle = angle_degrees.to_radians();
    let x = light.orbit_radius * angle.cos();
    let y = light.orbit_radius * angle.sin();
    let x = match mode {
        RenderMode::Normal => -x,
        RenderMode::ShadowMap => x,
    };
    centroid + Vec3::new(x, y, light.height)
}

fn light_projection(light: &LightConfig) -> Mat4 {
    let half = light.half_extent;
    transform::orthographic(-half, half, -half, half, light.near_plane, light.far_plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::InputEvent;

    const EPSILON: f32 = 1e-3;

    fn compute(centroid: Vec3, input: &InputState) -> RenderState {
        RenderState::compute(centroid, input, 4.0 / 3.0, &SceneConfig::default())
    }

    #[test]
    fn test_rotation_pivots_about_centroid() {
        let centroid = Vec3::new(500.0, -200.0, 10.0);
        let mut input = InputState::new();
        input.apply(InputEvent::Rotate(90));

        let state = compute(centroid, &input);
        assert!(state.model.transform_point3(centroid).abs_diff_eq(centroid, EPSILON));
    }

    #[test]
    fn test_centroid_maps_to_screen_center() {
        // Translating everything by d keeps the centroid at the same clip position.
        let input = InputState::new();
        let project = |centroid: Vec3| {
            let state = compute(centroid, &input);
            (state.projection * state.view * state.model).project_point3(centroid)
        };

        let a = project(Vec3::ZERO);
        let b = project(Vec3::new(1000.0, 2000.0, 30.0));
        assert!(a.abs_diff_eq(b, EPSILON));
        assert!(a.x.abs() < EPSILON && a.y.abs() < EPSILON);
    }

    #[test]
    fn test_shadow_map_mode_uses_identity_model() {
        let mut input = InputState::new();
        input.apply(InputEvent::Rotate(45));
        input.apply(InputEvent::ShowShadowMap(true));

        let state = compute(Vec3::new(5.0, 5.0, 0.0), &input);
        assert_eq!(state.mode, RenderMode::ShadowMap);
        assert_eq!(state.model, Mat4::IDENTITY);
    }

    #[test]
    fn test_toggling_shadow_map_twice_restores_model() {
        let mut input = InputState::new();
        input.apply(InputEvent::Rotate(45));
        let before = compute(Vec3::ONE, &input);

        input.apply(InputEvent::ShowShadowMap(true));
        input.apply(InputEvent::ShowShadowMap(false));
        let after = compute(Vec3::ONE, &input);

        assert_eq!(before.model, after.model);
        assert_eq!(before.light_view, after.light_view);
    }

    #[test]
    fn test_light_orbit() {
        let centroid = Vec3::new(100.0, 0.0, 0.0);
        let input = InputState::new();
        let state = compute(centroid, &input);

        // Angle 0 puts the light at -x in normal mode.
        let expected = Vec3::new(-2000.0, 0.0, 2000.0).normalize();
        assert!(state.light_direction.abs_diff_eq(expected, EPSILON));

        let mut debug = input;
        debug.apply(InputEvent::ShowShadowMap(true));
        let state = compute(centroid, &debug);
        let mirrored = Vec3::new(2000.0, 0.0, 2000.0).normalize();
        assert!(state.light_direction.abs_diff_eq(mirrored, EPSILON));
    }

    #[test]
    fn test_zoom_moves_eye_closer() {
        let centroid = Vec3::ZERO;
        let mut input = InputState::new();
        let far = compute(centroid, &input).view.transform_point3(centroid);
        input.apply(InputEvent::Zoom(100.0));
        let near = compute(centroid, &input).view.transform_point3(centroid);

        assert!(near.z.abs() < far.z.abs());
        assert!(near.z < 0.0);
    }

    #[test]
    fn test_orthographic_extent_follows_zoom() {
        let mut input = InputState::new();
        input.apply(InputEvent::Projection(ProjectionMode::Orthographic));
        let wide = compute(Vec3::ZERO, &input).projection;
        input.apply(InputEvent::Zoom(50.0));
        let narrow = compute(Vec3::ZERO, &input).projection;

        // x scale is 1 / (aspect * half_extent).
        assert!(narrow.x_axis.x > wide.x_axis.x);
    }
}
