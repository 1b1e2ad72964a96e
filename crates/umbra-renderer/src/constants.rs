//! Rendering constants
//!
//! Tunables that users may want to change live in [`crate::config`]; these
//! are fixed by the GPU pipeline itself.

/// Texture formats
pub mod format {
    /// Depth format of both the shadow map and the output depth buffer
    pub const DEPTH: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
}

/// Shadow map constants
pub mod shadow {
    /// Depth value the shadow map is cleared to (farthest)
    pub const CLEAR_DEPTH: f32 = 1.0;
}

/// Full-screen quad used to present the shadow map
pub mod quad {
    /// Two triangles covering clip space, counter-clockwise
    pub const VERTICES: [[f32; 2]; 6] = [
        [-1.0, -1.0],
        [1.0, -1.0],
        [1.0, 1.0],
        [-1.0, -1.0],
        [1.0, 1.0],
        [-1.0, 1.0],
    ];
}
