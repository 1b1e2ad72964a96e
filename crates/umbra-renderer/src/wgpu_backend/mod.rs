//! wgpu implementation of [`RenderBackend`].
//!
//! The backend renders into its own output texture (color + depth) so the
//! host can show the result anywhere, e.g. as an egui image. Calls between
//! `begin_frame` and `end_frame` are recorded and encoded into a single
//! command buffer at the end: depth passes first, in issue order, then the
//! screen pass.

mod gpu_resources;
mod pipelines;
mod uniforms;

use std::collections::HashMap;
use std::sync::Arc;

use umbra_core::VertexSet;
use wgpu::util::DeviceExt;

use crate::backend::{
    DrawCall, LayerUniforms, MeshHandle, ProgramHandle, RenderBackend, RenderError, TargetHandle,
};
use crate::config::ShadowConfig;
use crate::constants::{quad, shadow};
use crate::program::ProgramKind;
use crate::vertex::{NormalVertex, PositionVertex, QuadVertex};

use pipelines::PipelineConfig;
use uniforms::{DepthUniformBlock, ShadedUniformBlock};

/// WGSL source of a program.
fn shader_source(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Depth => include_str!("../shaders/depth.wgsl"),
        ProgramKind::Shaded => include_str!("../shaders/shaded.wgsl"),
        ProgramKind::Present => include_str!("../shaders/present.wgsl"),
    }
}

struct CompiledProgram {
    kind: ProgramKind,
    standard: wgpu::RenderPipeline,
    /// Variant with the rasterizer depth bias, for programs that draw layers.
    biased: Option<wgpu::RenderPipeline>,
}

struct GpuMesh {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    indices: wgpu::Buffer,
    depth_uniforms: wgpu::Buffer,
    depth_bind_group: wgpu::BindGroup,
    shaded_uniforms: wgpu::Buffer,
    shaded_bind_group: wgpu::BindGroup,
}

struct DepthTarget {
    #[allow(dead_code)] // Held for GPU resource lifetime
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: u32,
    bind_group: wgpu::BindGroup,
}

struct OutputTarget {
    #[allow(dead_code)] // Held for GPU resource lifetime
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    #[allow(dead_code)] // Held for GPU resource lifetime
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy)]
enum RecordedDraw {
    Mesh {
        program: ProgramHandle,
        mesh: MeshHandle,
        index_count: u32,
        biased: bool,
        shadow_map: Option<TargetHandle>,
    },
    Fullscreen {
        program: ProgramHandle,
        texture: TargetHandle,
    },
}

struct DepthPassRecording {
    target: TargetHandle,
    draws: Vec<RecordedDraw>,
}

struct FrameRecording {
    clear_color: [f32; 4],
    depth_passes: Vec<DepthPassRecording>,
    current_depth_pass: Option<DepthPassRecording>,
    screen: Vec<RecordedDraw>,
}

impl FrameRecording {
    fn record(&mut self, draw: RecordedDraw) {
        match self.current_depth_pass.as_mut() {
            Some(pass) => pass.draws.push(draw),
            None => self.screen.push(draw),
        }
    }
}

/// Render backend on top of a wgpu device
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    color_format: wgpu::TextureFormat,
    bias_constant: i32,
    bias_slope: f32,
    uniform_layout: wgpu::BindGroupLayout,
    shadow_map_layout: wgpu::BindGroupLayout,
    shadow_sampler: wgpu::Sampler,
    quad_buffer: wgpu::Buffer,
    programs: HashMap<ProgramHandle, CompiledProgram>,
    meshes: HashMap<MeshHandle, GpuMesh>,
    targets: HashMap<TargetHandle, DepthTarget>,
    output: Option<OutputTarget>,
    frame: Option<FrameRecording>,
    next_id: u64,
}

impl WgpuBackend {
    /// Create a backend rendering into `color_format` textures.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
        shadow: &ShadowConfig,
    ) -> Self {
        let uniform_layout = gpu_resources::create_uniform_bind_group_layout(&device);
        let shadow_map_layout = gpu_resources::create_shadow_map_bind_group_layout(&device);
        let shadow_sampler = gpu_resources::create_shadow_sampler(&device);

        let quad_vertices: Vec<QuadVertex> = quad::VERTICES
            .iter()
            .map(|&position| QuadVertex { position })
            .collect();
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Full-screen Quad Buffer"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            device,
            queue,
            color_format,
            bias_constant: shadow.layer_bias_constant,
            bias_slope: shadow.layer_bias_slope,
            uniform_layout,
            shadow_map_layout,
            shadow_sampler,
            quad_buffer,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            targets: HashMap::new(),
            output: None,
            frame: None,
            next_id: 1,
        }
    }

    /// The device this backend renders with.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Format of the output color texture.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Resize the output texture. Returns `true` if it was recreated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if self
            .output
            .as_ref()
            .is_some_and(|o| o.width == width && o.height == height)
        {
            return false;
        }

        let (color_texture, color_view) =
            gpu_resources::create_color_texture(&self.device, self.color_format, width, height);
        let (depth_texture, depth_view) =
            gpu_resources::create_depth_texture(&self.device, "Umbra Output Depth", width, height);
        self.output = Some(OutputTarget {
            color_texture,
            color_view,
            depth_texture,
            depth_view,
            width,
            height,
        });
        tracing::debug!("Output resized to {}x{}", width, height);
        true
    }

    /// View of the output color texture, once [`Self::resize`] has been called.
    pub fn output_view(&self) -> Option<&wgpu::TextureView> {
        self.output.as_ref().map(|o| &o.color_view)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn build_pipelines(
        &self,
        kind: ProgramKind,
        module: &wgpu::ShaderModule,
    ) -> (wgpu::RenderPipeline, Option<wgpu::RenderPipeline>) {
        match kind {
            ProgramKind::Depth => {
                let layouts = [&self.uniform_layout];
                let config = || {
                    PipelineConfig::new("Depth", module, &layouts)
                        .with_vertex_layouts(vec![PositionVertex::layout()])
                };
                (
                    config().build(&self.device),
                    Some(
                        config()
                            .with_depth_bias(self.bias_constant, self.bias_slope)
                            .build(&self.device),
                    ),
                )
            }
            ProgramKind::Shaded => {
                let layouts = [&self.uniform_layout, &self.shadow_map_layout];
                let config = || {
                    PipelineConfig::new("Shaded", module, &layouts)
                        .with_color_format(self.color_format)
                        .with_vertex_layouts(vec![PositionVertex::layout(), NormalVertex::layout()])
                };
                (
                    config().build(&self.device),
                    Some(
                        config()
                            .with_depth_bias(self.bias_constant, self.bias_slope)
                            .build(&self.device),
                    ),
                )
            }
            ProgramKind::Present => {
                let layouts = [&self.shadow_map_layout];
                let pipeline = PipelineConfig::new("Present", module, &layouts)
                    .with_color_format(self.color_format)
                    .with_vertex_layouts(vec![QuadVertex::layout()])
                    .with_cull_mode(None)
                    .without_depth_test()
                    .build(&self.device);
                (pipeline, None)
            }
        }
    }

    /// Run `create` inside an out-of-memory error scope.
    fn with_resource_scope<T>(
        &self,
        resource: &str,
        create: impl FnOnce(&Self) -> T,
    ) -> Result<T, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(self);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(error) => Err(RenderError::ResourceCreation {
                resource: resource.to_string(),
                reason: error.to_string(),
            }),
            None => Ok(value),
        }
    }

    fn frame_mut(&mut self) -> Result<&mut FrameRecording, RenderError> {
        self.frame.as_mut().ok_or(RenderError::NoFrameInProgress)
    }

    fn program(&self, handle: ProgramHandle) -> Result<&CompiledProgram, RenderError> {
        self.programs.get(&handle).ok_or(RenderError::UnknownHandle {
            kind: "program",
            id: handle.0,
        })
    }

    fn target(&self, handle: TargetHandle) -> Result<&DepthTarget, RenderError> {
        self.targets.get(&handle).ok_or(RenderError::UnknownHandle {
            kind: "target",
            id: handle.0,
        })
    }

    fn encode_draw(&self, pass: &mut wgpu::RenderPass<'_>, draw: &RecordedDraw) {
        match *draw {
            RecordedDraw::Mesh {
                program,
                mesh,
                index_count,
                biased,
                shadow_map,
            } => {
                let (Some(program), Some(mesh)) = (self.programs.get(&program), self.meshes.get(&mesh))
                else {
                    tracing::warn!("Skipping draw of a released mesh or program");
                    return;
                };
                if index_count == 0 {
                    return;
                }

                let pipeline = match (&program.biased, biased) {
                    (Some(biased), true) => biased,
                    _ => &program.standard,
                };
                pass.set_pipeline(pipeline);

                match program.kind {
                    ProgramKind::Depth => {
                        pass.set_bind_group(0, &mesh.depth_bind_group, &[]);
                        pass.set_vertex_buffer(0, mesh.positions.slice(..));
                    }
                    ProgramKind::Shaded => {
                        let Some(target) = shadow_map.and_then(|t| self.targets.get(&t)) else {
                            tracing::warn!("Skipping shaded draw without a shadow map");
                            return;
                        };
                        pass.set_bind_group(0, &mesh.shaded_bind_group, &[]);
                        pass.set_bind_group(1, &target.bind_group, &[]);
                        pass.set_vertex_buffer(0, mesh.positions.slice(..));
                        pass.set_vertex_buffer(1, mesh.normals.slice(..));
                    }
                    ProgramKind::Present => return,
                }

                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..index_count, 0, 0..1);
            }
            RecordedDraw::Fullscreen { program, texture } => {
                let (Some(program), Some(target)) =
                    (self.programs.get(&program), self.targets.get(&texture))
                else {
                    tracing::warn!("Skipping full-screen draw of a released target");
                    return;
                };
                pass.set_pipeline(&program.standard);
                pass.set_bind_group(0, &target.bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                pass.draw(0..quad::VERTICES.len() as u32, 0..1);
            }
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn compile_program(&mut self, kind: ProgramKind) -> Result<ProgramHandle, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} Shader", kind)),
                source: wgpu::ShaderSource::Wgsl(shader_source(kind).into()),
            });
        let (standard, biased) = self.build_pipelines(kind, &module);

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            tracing::error!("Failed to compile {} program: {}", kind, error);
            return Err(RenderError::ProgramCompile {
                program: kind,
                reason: error.to_string(),
            });
        }

        let handle = ProgramHandle(self.next_id());
        self.programs.insert(
            handle,
            CompiledProgram {
                kind,
                standard,
                biased,
            },
        );
        tracing::debug!("Compiled {} program", kind);
        Ok(handle)
    }

    fn create_depth_target(&mut self, size: u32) -> Result<TargetHandle, RenderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if size == 0 || size > max {
            return Err(RenderError::InvalidShadowMapSize(size));
        }

        let target = self.with_resource_scope("shadow map", |backend| {
            let (texture, view) =
                gpu_resources::create_depth_texture(&backend.device, "Shadow Map", size, size);
            let bind_group = gpu_resources::create_shadow_map_bind_group(
                &backend.device,
                &backend.shadow_map_layout,
                &view,
                &backend.shadow_sampler,
            );
            DepthTarget {
                texture,
                view,
                size,
                bind_group,
            }
        })?;

        let handle = TargetHandle(self.next_id());
        self.targets.insert(handle, target);
        Ok(handle)
    }

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &VertexSet,
    ) -> Result<MeshHandle, RenderError> {
        let mesh = self.with_resource_scope(&format!("mesh '{}'", label), |backend| {
            let device = &backend.device;
            let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Position Buffer", label)),
                contents: bytemuck::cast_slice(vertices.positions()),
                usage: wgpu::BufferUsages::VERTEX,
            });

            // Layers without normals get a zero stream so one pipeline fits both.
            let zeros;
            let normal_data = match vertices.normals() {
                Some(normals) => normals,
                None => {
                    zeros = vec![0.0f32; vertices.positions().len()];
                    &zeros[..]
                }
            };
            let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Normal Buffer", label)),
                contents: bytemuck::cast_slice(normal_data),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", label)),
                contents: bytemuck::cast_slice(vertices.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });

            let depth_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} Depth Uniform Buffer", label)),
                size: std::mem::size_of::<DepthUniformBlock>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let depth_bind_group = gpu_resources::create_uniform_bind_group(
                device,
                &backend.uniform_layout,
                &depth_uniforms,
                &format!("{} Depth", label),
            );

            let shaded_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} Shaded Uniform Buffer", label)),
                size: std::mem::size_of::<ShadedUniformBlock>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let shaded_bind_group = gpu_resources::create_uniform_bind_group(
                device,
                &backend.uniform_layout,
                &shaded_uniforms,
                &format!("{} Shaded", label),
            );

            GpuMesh {
                positions,
                normals,
                indices,
                depth_uniforms,
                depth_bind_group,
                shaded_uniforms,
                shaded_bind_group,
            }
        })?;

        let handle = MeshHandle(self.next_id());
        self.meshes.insert(handle, mesh);
        Ok(handle)
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) {
        if let Some(mesh) = self.meshes.remove(&mesh) {
            mesh.positions.destroy();
            mesh.normals.destroy();
            mesh.indices.destroy();
            mesh.depth_uniforms.destroy();
            mesh.shaded_uniforms.destroy();
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        self.output
            .as_ref()
            .map_or((0, 0), |o| (o.width, o.height))
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError> {
        if self.output.is_none() {
            return Err(RenderError::SurfaceUnavailable);
        }
        self.frame = Some(FrameRecording {
            clear_color,
            depth_passes: Vec::new(),
            current_depth_pass: None,
            screen: Vec::new(),
        });
        Ok(())
    }

    fn begin_depth_pass(&mut self, target: TargetHandle) -> Result<(), RenderError> {
        self.target(target)?;
        let frame = self.frame_mut()?;
        if let Some(open) = frame.current_depth_pass.take() {
            frame.depth_passes.push(open);
        }
        frame.current_depth_pass = Some(DepthPassRecording {
            target,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn end_depth_pass(&mut self) {
        if let Some(frame) = self.frame.as_mut()
            && let Some(pass) = frame.current_depth_pass.take()
        {
            frame.depth_passes.push(pass);
        }
    }

    fn draw_mesh(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        let program = self.program(call.program)?;
        if program.kind != call.uniforms.program_kind() {
            return Err(RenderError::UniformMismatch(program.kind));
        }
        let mesh = self.meshes.get(&call.mesh).ok_or(RenderError::UnknownHandle {
            kind: "mesh",
            id: call.mesh.0,
        })?;

        match &call.uniforms {
            LayerUniforms::Depth(uniforms) => {
                let block = DepthUniformBlock::from(uniforms);
                self.queue
                    .write_buffer(&mesh.depth_uniforms, 0, bytemuck::cast_slice(&[block]));
            }
            LayerUniforms::Shaded(uniforms) => {
                let target = call.shadow_map.ok_or(RenderError::MissingShadowMap)?;
                self.target(target)?;
                let block = ShadedUniformBlock::from(uniforms);
                self.queue
                    .write_buffer(&mesh.shaded_uniforms, 0, bytemuck::cast_slice(&[block]));
            }
        }

        let draw = RecordedDraw::Mesh {
            program: call.program,
            mesh: call.mesh,
            index_count: call.index_count,
            biased: call.depth_bias,
            shadow_map: call.shadow_map,
        };
        self.frame_mut()?.record(draw);
        Ok(())
    }

    fn draw_fullscreen(
        &mut self,
        program: ProgramHandle,
        texture: TargetHandle,
    ) -> Result<(), RenderError> {
        let kind = self.program(program)?.kind;
        if kind != ProgramKind::Present {
            return Err(RenderError::UniformMismatch(kind));
        }
        self.target(texture)?;
        self.frame_mut()?
            .screen
            .push(RecordedDraw::Fullscreen { program, texture });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let mut frame = self.frame.take().ok_or(RenderError::NoFrameInProgress)?;
        if let Some(open) = frame.current_depth_pass.take() {
            frame.depth_passes.push(open);
        }
        let output = self.output.as_ref().ok_or(RenderError::SurfaceUnavailable)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Umbra Frame Encoder"),
            });

        for recording in &frame.depth_passes {
            let target = self.target(recording.target)?;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(shadow::CLEAR_DEPTH),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let size = target.size as f32;
            pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
            for draw in &recording.draws {
                self.encode_draw(&mut pass, draw);
            }
        }

        {
            let [r, g, b, a] = frame.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Screen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &output.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &frame.screen {
                self.encode_draw(&mut pass, draw);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_sources_declare_entry_points() {
        for kind in ProgramKind::ALL {
            let source = shader_source(kind);
            assert!(source.contains("fn vs_main"), "{kind} lacks vs_main");
        }
        assert!(!shader_source(ProgramKind::Depth).contains("fn fs_main"));
        assert!(shader_source(ProgramKind::Shaded).contains("fn fs_main"));
        assert!(shader_source(ProgramKind::Present).contains("fn fs_main"));
    }

    #[test]
    fn test_uniform_names_appear_in_shaders() {
        for kind in [ProgramKind::Depth, ProgramKind::Shaded] {
            let source = shader_source(kind);
            for name in kind.interface().uniforms {
                assert!(source.contains(name), "{kind} shader lacks {name}");
            }
        }
    }
}
