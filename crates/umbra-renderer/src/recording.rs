//! Backend that records every call, for frame-logic tests.

use std::collections::HashMap;

use umbra_core::VertexSet;

use crate::backend::{
    DrawCall, MeshHandle, ProgramHandle, RenderBackend, RenderError, TargetHandle,
};
use crate::program::ProgramKind;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileProgram(ProgramKind),
    CreateDepthTarget(u32),
    CreateMesh {
        label: String,
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
    },
    DestroyMesh(MeshHandle),
    BeginFrame([f32; 4]),
    BeginDepthPass(TargetHandle),
    EndDepthPass,
    DrawMesh(DrawCall),
    DrawFullscreen {
        program: ProgramHandle,
        texture: TargetHandle,
    },
    EndFrame,
}

pub struct RecordingBackend {
    pub calls: Vec<GpuCall>,
    size: (u32, u32),
    next_id: u64,
    programs: HashMap<ProgramHandle, ProgramKind>,
    meshes: HashMap<MeshHandle, String>,
    failing_program: Option<ProgramKind>,
    in_depth_pass: bool,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            size: (width, height),
            next_id: 1,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            failing_program: None,
            in_depth_pass: false,
        }
    }

    pub fn fail_program(&mut self, kind: ProgramKind) {
        self.failing_program = Some(kind);
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn program_kind(&self, handle: ProgramHandle) -> Option<ProgramKind> {
        self.programs.get(&handle).copied()
    }

    pub fn compiled_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn in_depth_pass(&self) -> bool {
        self.in_depth_pass
    }

    /// Take every call recorded so far.
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    /// Recorded mesh draws.
    pub fn draws(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::DrawMesh(draw) => Some(draw),
                _ => None,
            })
            .collect()
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderBackend for RecordingBackend {
    fn compile_program(&mut self, kind: ProgramKind) -> Result<ProgramHandle, RenderError> {
        self.calls.push(GpuCall::CompileProgram(kind));
        if self.failing_program == Some(kind) {
            return Err(RenderError::ProgramCompile {
                program: kind,
                reason: "forced failure".to_string(),
            });
        }
        let handle = ProgramHandle(self.next());
        self.programs.insert(handle, kind);
        Ok(handle)
    }

    fn create_depth_target(&mut self, size: u32) -> Result<TargetHandle, RenderError> {
        self.calls.push(GpuCall::CreateDepthTarget(size));
        Ok(TargetHandle(self.next()))
    }

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &VertexSet,
    ) -> Result<MeshHandle, RenderError> {
        let handle = MeshHandle(self.next());
        self.meshes.insert(handle, label.to_string());
        self.calls.push(GpuCall::CreateMesh {
            label: label.to_string(),
            handle,
            vertex_count: vertices.vertex_count(),
            index_count: vertices.index_count(),
        });
        Ok(handle)
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
        self.calls.push(GpuCall::DestroyMesh(mesh));
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError> {
        self.calls.push(GpuCall::BeginFrame(clear_color));
        Ok(())
    }

    fn begin_depth_pass(&mut self, target: TargetHandle) -> Result<(), RenderError> {
        self.in_depth_pass = true;
        self.calls.push(GpuCall::BeginDepthPass(target));
        Ok(())
    }

    fn end_depth_pass(&mut self) {
        self.in_depth_pass = false;
        self.calls.push(GpuCall::EndDepthPass);
    }

    fn draw_mesh(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        if !self.meshes.contains_key(&call.mesh) {
            return Err(RenderError::UnknownHandle {
                kind: "mesh",
                id: call.mesh.0,
            });
        }
        self.calls.push(GpuCall::DrawMesh(call.clone()));
        Ok(())
    }

    fn draw_fullscreen(
        &mut self,
        program: ProgramHandle,
        texture: TargetHandle,
    ) -> Result<(), RenderError> {
        self.calls.push(GpuCall::DrawFullscreen { program, texture });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.calls.push(GpuCall::EndFrame);
        Ok(())
    }
}
