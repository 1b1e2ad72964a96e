//! GPU-side uniform blocks.

use bytemuck::{Pod, Zeroable};

use crate::backend::{DepthUniforms, ShadedUniforms};

/// Matches `DepthUniforms` in `depth.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DepthUniformBlock {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl From<&DepthUniforms> for DepthUniformBlock {
    fn from(u: &DepthUniforms) -> Self {
        Self {
            model: u.model.to_cols_array_2d(),
            view: u.view.to_cols_array_2d(),
            projection: u.projection.to_cols_array_2d(),
            color: u.color,
        }
    }
}

/// Matches `ShadedUniforms` in `shaded.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShadedUniformBlock {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_view: [[f32; 4]; 4],
    pub light_projection: [[f32; 4]; 4],
    /// xyz direction, w unused
    pub light_direction: [f32; 4],
    pub color: [f32; 4],
    pub has_normals: u32,
    pub shadow_bias: f32,
    pub _pad: [u32; 2],
}

impl From<&ShadedUniforms> for ShadedUniformBlock {
    fn from(u: &ShadedUniforms) -> Self {
        Self {
            model: u.model.to_cols_array_2d(),
            view: u.view.to_cols_array_2d(),
            projection: u.projection.to_cols_array_2d(),
            light_view: u.light_view.to_cols_array_2d(),
            light_projection: u.light_projection.to_cols_array_2d(),
            light_direction: u.light_direction.extend(0.0).to_array(),
            color: u.color,
            has_normals: u32::from(u.has_normals),
            shadow_bias: u.shadow_bias,
            _pad: [0; 2],
        }
    }
}
