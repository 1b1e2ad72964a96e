//! Interactive state and pointer-drag mapping.
//!
//! Input handlers only ever write to an [`InputState`]; the frame loop copies
//! it once at the start of every frame and never looks at it mid-frame.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::{FULL_TURN_DEGREES, MAX_ZOOM_PERCENT};

/// Errors raised by malformed input values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Unknown projection mode: {0} (expected 'perspective' or 'orthographic')")]
    UnknownProjection(String),
}

/// Eye camera projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    /// All modes, in UI order.
    pub const ALL: [ProjectionMode; 2] = [ProjectionMode::Perspective, ProjectionMode::Orthographic];

    /// Lowercase identifier used by the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionMode::Perspective => "perspective",
            ProjectionMode::Orthographic => "orthographic",
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionMode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perspective" => Ok(ProjectionMode::Perspective),
            "orthographic" => Ok(ProjectionMode::Orthographic),
            _ => Err(InputError::UnknownProjection(s.to_string())),
        }
    }
}

/// A discrete update delivered by the UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Object rotation slider, integer degrees.
    Rotate(i32),
    /// Light rotation slider, integer degrees.
    LightRotate(i32),
    /// Zoom slider, percent.
    Zoom(f32),
    /// Projection selector.
    Projection(ProjectionMode),
    /// "Show shadow map" toggle.
    ShowShadowMap(bool),
}

/// Interactive state read once per frame
///
/// The light orbits by `coupled_rotation + light_rotation` degrees.
/// `coupled_rotation` is the object rotation at the last rotate made with the
/// shadow-map view off. Rotating while the raw depth buffer is shown leaves the
/// light in place until the next rotate in normal view catches it up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputState {
    rotation: i32,
    light_rotation: i32,
    coupled_rotation: i32,
    zoom: f32,
    projection: ProjectionMode,
    show_shadow_map: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Initial state: no rotation, zoom 0, perspective, normal rendering.
    pub fn new() -> Self {
        Self {
            rotation: 0,
            light_rotation: 0,
            coupled_rotation: 0,
            zoom: 0.0,
            projection: ProjectionMode::Perspective,
            show_shadow_map: false,
        }
    }

    /// Object rotation in degrees (0..360).
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Light rotation slider value in degrees.
    pub fn light_rotation(&self) -> i32 {
        self.light_rotation
    }

    /// Zoom in percent (0..=100).
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Eye projection mode.
    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    /// Whether the raw shadow map replaces the color pass.
    pub fn show_shadow_map(&self) -> bool {
        self.show_shadow_map
    }

    /// Combined light orbit angle in degrees.
    pub fn light_angle(&self) -> f32 {
        let degrees = i64::from(self.coupled_rotation) + i64::from(self.light_rotation);
        degrees.rem_euclid(i64::from(FULL_TURN_DEGREES)) as f32
    }

    /// Set the object rotation. Values wrap at 360.
    pub fn set_rotation(&mut self, degrees: i32) {
        let degrees = degrees.rem_euclid(FULL_TURN_DEGREES);
        if !self.show_shadow_map {
            self.coupled_rotation = degrees;
        }
        self.rotation = degrees;
    }

    /// Set the light rotation.
    pub fn set_light_rotation(&mut self, degrees: i32) {
        self.light_rotation = degrees;
    }

    /// Set the zoom, clamped to 0..=100.
    pub fn set_zoom(&mut self, percent: f32) {
        self.zoom = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, MAX_ZOOM_PERCENT)
        };
    }

    /// Set the projection mode.
    pub fn set_projection(&mut self, projection: ProjectionMode) {
        self.projection = projection;
    }

    /// Toggle the shadow-map debug view.
    pub fn set_show_shadow_map(&mut self, show: bool) {
        self.show_shadow_map = show;
    }

    /// Apply one UI event.
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Rotate(degrees) => self.set_rotation(degrees),
            InputEvent::LightRotate(degrees) => self.set_light_rotation(degrees),
            InputEvent::Zoom(percent) => self.set_zoom(percent),
            InputEvent::Projection(mode) => self.set_projection(mode),
            InputEvent::ShowShadowMap(show) => self.set_show_shadow_map(show),
        }
    }
}

/// Input state shared between input handlers and the frame loop
pub type SharedInput = Arc<Mutex<InputState>>;

/// Create a shared input state with default values.
pub fn create_shared_input() -> SharedInput {
    Arc::new(Mutex::new(InputState::new()))
}

/// Map a pointer position inside the canvas to `(rotation, zoom)`.
///
/// x spans one full turn across the canvas width, y spans 0..100 zoom across
/// its height. Positions outside the canvas are clamped to its edges.
pub fn map_pointer(x: f32, y: f32, width: f32, height: f32) -> (i32, f32) {
    let fraction = |value: f32, extent: f32| {
        if extent > 0.0 {
            (value / extent).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    let rotation = (fraction(x, width) * FULL_TURN_DEGREES as f32) as i32;
    let zoom = fraction(y, height) * MAX_ZOOM_PERCENT;
    (rotation, zoom)
}

/// Press → move → release gesture that drives rotation and zoom
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerDrag {
    active: bool,
}

impl PointerDrag {
    /// Whether a drag is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a drag at the given canvas position.
    pub fn press(&mut self, x: f32, y: f32, width: f32, height: f32) -> [InputEvent; 2] {
        self.active = true;
        Self::events(x, y, width, height)
    }

    /// Pointer moved. Only produces events while a drag is held.
    pub fn move_to(&mut self, x: f32, y: f32, width: f32, height: f32) -> Option<[InputEvent; 2]> {
        self.active.then(|| Self::events(x, y, width, height))
    }

    /// End the drag.
    pub fn release(&mut self) {
        self.active = false;
    }

    fn events(x: f32, y: f32, width: f32, height: f32) -> [InputEvent; 2] {
        let (rotation, zoom) = map_pointer(x, y, width, height);
        [InputEvent::Rotate(rotation), InputEvent::Zoom(zoom)]
    }
}
