//! Global constants for umbra-core

/// Full turn of the rotation sliders, in degrees
pub const FULL_TURN_DEGREES: i32 = 360;

/// Upper bound of the zoom slider (percent)
pub const MAX_ZOOM_PERCENT: f32 = 100.0;

/// Components per position or normal
pub const COMPONENTS_PER_VERTEX: usize = 3;

/// Indices per triangle
pub const INDICES_PER_TRIANGLE: usize = 3;
