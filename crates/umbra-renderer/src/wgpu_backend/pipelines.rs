//! Pipeline builder.

use crate::constants::format;

/// Configuration for creating a render pipeline.
pub struct PipelineConfig<'a> {
    /// Pipeline label for debugging
    pub label: &'a str,
    /// Compiled shader module with `vs_main` (and `fs_main` when there is a color target)
    pub module: &'a wgpu::ShaderModule,
    /// Color target format, `None` for depth-only pipelines
    pub color_format: Option<wgpu::TextureFormat>,
    /// Bind group layouts
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    /// Vertex buffer layouts
    pub vertex_layouts: Vec<wgpu::VertexBufferLayout<'a>>,
    /// Face culling mode
    pub cull_mode: Option<wgpu::Face>,
    /// Whether to write to depth buffer
    pub depth_write: bool,
    /// Depth comparison function
    pub depth_compare: wgpu::CompareFunction,
    /// Rasterizer depth bias
    pub depth_bias: wgpu::DepthBiasState,
    /// Blend state for color output
    pub blend: Option<wgpu::BlendState>,
}

impl<'a> PipelineConfig<'a> {
    /// Create a new pipeline config with the viewer's defaults.
    ///
    /// Default settings:
    /// - Back-face culling
    /// - Depth write enabled, compare Less
    /// - Alpha blending
    /// - No depth bias
    pub fn new(
        label: &'a str,
        module: &'a wgpu::ShaderModule,
        bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    ) -> Self {
        Self {
            label,
            module,
            color_format: None,
            bind_group_layouts,
            vertex_layouts: Vec::new(),
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
            depth_bias: wgpu::DepthBiasState::default(),
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }

    /// Render into a color target of this format.
    pub fn with_color_format(mut self, color_format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(color_format);
        self
    }

    /// Set vertex buffer layouts.
    pub fn with_vertex_layouts(mut self, layouts: Vec<wgpu::VertexBufferLayout<'a>>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    /// Set face culling mode.
    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Disable depth testing (always pass, no write).
    pub fn without_depth_test(mut self) -> Self {
        self.depth_write = false;
        self.depth_compare = wgpu::CompareFunction::Always;
        self
    }

    /// Apply a constant + slope-scaled depth bias.
    pub fn with_depth_bias(mut self, constant: i32, slope_scale: f32) -> Self {
        self.depth_bias = wgpu::DepthBiasState {
            constant,
            slope_scale,
            clamp: 0.0,
        };
        self
    }

    /// Build the render pipeline.
    pub fn build(self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", self.label)),
            bind_group_layouts: self.bind_group_layouts,
            push_constant_ranges: &[],
        });

        let targets = self.color_format.map(|format| {
            [Some(wgpu::ColorTargetState {
                format,
                blend: self.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })]
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", self.label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: self.module,
                entry_point: Some("vs_main"),
                buffers: &self.vertex_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: targets.as_ref().map(|targets| wgpu::FragmentState {
                module: self.module,
                entry_point: Some("fs_main"),
                targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: self.cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: format::DEPTH,
                depth_write_enabled: self.depth_write,
                depth_compare: self.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: self.depth_bias,
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
