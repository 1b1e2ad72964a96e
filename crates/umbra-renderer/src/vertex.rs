//! Vertex stream layouts
//!
//! Layers upload positions and normals as two separate tightly packed
//! streams, so the depth program can bind positions alone.

/// Creates a vertex buffer layout for a single-attribute stream.
const fn single_attribute_layout(
    attributes: &'static [wgpu::VertexAttribute],
    stride: u64,
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Position stream (location 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    /// Vertex position in layer space.
    pub position: [f32; 3],
}

impl PositionVertex {
    /// Vertex attribute descriptors for the shader.
    pub const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }];

    /// Returns the vertex buffer layout for this vertex type.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        single_attribute_layout(Self::ATTRIBUTES, std::mem::size_of::<Self>() as u64)
    }
}

/// Normal stream (location 1).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NormalVertex {
    /// Vertex normal.
    pub normal: [f32; 3],
}

impl NormalVertex {
    /// Vertex attribute descriptors for the shader.
    pub const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    }];

    /// Returns the vertex buffer layout for this vertex type.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        single_attribute_layout(Self::ATTRIBUTES, std::mem::size_of::<Self>() as u64)
    }
}

/// Full-screen quad corner in clip space.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Clip-space xy.
    pub position: [f32; 2],
}

impl QuadVertex {
    /// Vertex attribute descriptors for the shader.
    pub const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2,
    }];

    /// Returns the vertex buffer layout for this vertex type.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        single_attribute_layout(Self::ATTRIBUTES, std::mem::size_of::<Self>() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_are_tight() {
        assert_eq!(PositionVertex::layout().array_stride, 12);
        assert_eq!(NormalVertex::layout().array_stride, 12);
        assert_eq!(QuadVertex::layout().array_stride, 8);
    }

    #[test]
    fn test_locations() {
        assert_eq!(PositionVertex::ATTRIBUTES[0].shader_location, 0);
        assert_eq!(NormalVertex::ATTRIBUTES[0].shader_location, 1);
    }
}
