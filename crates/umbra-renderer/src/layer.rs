//! Named layers and their GPU meshes.

use std::collections::BTreeMap;

use glam::{DVec3, Vec3};
use umbra_core::VertexSet;

use crate::backend::{
    DepthUniforms, DrawCall, LayerUniforms, MeshHandle, RenderBackend, RenderError,
    ShadedUniforms, TargetHandle,
};
use crate::program::ProgramSet;
use crate::scene::RenderState;

/// Which pass a layer draw belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Light-space depth pass.
    Depth,
    /// Eye-space color pass.
    Color,
}

/// Per-layer draw options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerOptions {
    /// Draw with the rasterizer depth bias.
    pub depth_bias: bool,
}

/// One uploaded layer
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    vertices: VertexSet,
    mesh: MeshHandle,
    options: LayerOptions,
}

impl Layer {
    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CPU copy of the geometry.
    pub fn vertices(&self) -> &VertexSet {
        &self.vertices
    }

    /// GPU mesh.
    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    /// Whether this layer draws with the depth bias.
    pub fn depth_bias(&self) -> bool {
        self.options.depth_bias
    }

    fn draw_call(
        &self,
        programs: &ProgramSet,
        state: &RenderState,
        pass: PassKind,
        shadow_map: TargetHandle,
        shadow_bias: f32,
    ) -> DrawCall {
        let color = self.vertices.color();
        let (program, uniforms, shadow_map) = match pass {
            PassKind::Depth => (
                programs.depth,
                LayerUniforms::Depth(DepthUniforms {
                    model: state.model,
                    view: state.light_view,
                    projection: state.light_projection,
                    color,
                }),
                None,
            ),
            PassKind::Color => (
                programs.shaded,
                LayerUniforms::Shaded(ShadedUniforms {
                    model: state.model,
                    view: state.view,
                    projection: state.projection,
                    light_view: state.light_view,
                    light_projection: state.light_projection,
                    light_direction: state.light_direction,
                    color,
                    has_normals: self.vertices.has_normals(),
                    shadow_bias,
                }),
                Some(shadow_map),
            ),
        };

        DrawCall {
            program,
            mesh: self.mesh,
            index_count: self.vertices.index_count() as u32,
            uniforms,
            depth_bias: self.options.depth_bias,
            shadow_map,
        }
    }
}

/// Layers keyed by name, drawn in name order
///
/// The centroid is the mean of every vertex of every layer and is
/// recomputed whenever the set changes.
#[derive(Debug, Default)]
pub struct LayerSet {
    layers: BTreeMap<String, Layer>,
    centroid: Vec3,
}

impl LayerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload and insert a layer, replacing any layer of the same name.
    pub fn add_layer<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        vertices: VertexSet,
        options: LayerOptions,
    ) -> Result<(), RenderError> {
        let mesh = backend.create_mesh(name, &vertices)?;
        tracing::info!(
            "Layer '{}': {} vertices, {} triangles, normals: {}",
            name,
            vertices.vertex_count(),
            vertices.triangle_count(),
            vertices.has_normals()
        );

        let layer = Layer {
            name: name.to_string(),
            vertices,
            mesh,
            options,
        };
        if let Some(previous) = self.layers.insert(name.to_string(), layer) {
            tracing::debug!("Replaced existing layer '{}'", name);
            backend.destroy_mesh(previous.mesh);
        }
        self.update_centroid();
        Ok(())
    }

    /// Remove a layer. Returns `false` if no layer had that name.
    pub fn remove_layer<B: RenderBackend>(&mut self, backend: &mut B, name: &str) -> bool {
        let Some(layer) = self.layers.remove(name) else {
            return false;
        };
        backend.destroy_mesh(layer.mesh);
        self.update_centroid();
        tracing::info!("Removed layer '{}'", name);
        true
    }

    /// Remove every layer.
    pub fn clear<B: RenderBackend>(&mut self, backend: &mut B) {
        for layer in std::mem::take(&mut self.layers).into_values() {
            backend.destroy_mesh(layer.mesh);
        }
        self.centroid = Vec3::ZERO;
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Look up a layer by name.
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Layer names in draw order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Iterate layers in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Mean of all vertices, or the origin when there are none.
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Draw every layer for one pass.
    pub fn draw<B: RenderBackend>(
        &self,
        backend: &mut B,
        programs: &ProgramSet,
        state: &RenderState,
        pass: PassKind,
        shadow_map: TargetHandle,
        shadow_bias: f32,
    ) -> Result<(), RenderError> {
        for layer in self.layers.values() {
            let call = layer.draw_call(programs, state, pass, shadow_map, shadow_bias);
            backend.draw_mesh(&call)?;
        }
        Ok(())
    }

    fn update_centroid(&mut self) {
        let (sum, count) = self
            .layers
            .values()
            .fold((DVec3::ZERO, 0usize), |(sum, count), layer| {
                (
                    sum + layer.vertices.position_sum(),
                    count + layer.vertices.vertex_count(),
                )
            });
        self.centroid = if count == 0 {
            Vec3::ZERO
        } else {
            (sum / count as f64).as_vec3()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCall, RecordingBackend};
    use crate::scene::RenderMode;
    use glam::Mat4;

    fn triangle(offset: f32) -> VertexSet {
        VertexSet::new(
            vec![
                offset, 0.0, 0.0, //
                offset + 3.0, 0.0, 0.0, //
                offset, 3.0, 0.0,
            ],
            vec![0, 1, 2],
            [1.0, 0.0, 0.0, 1.0],
            None,
        )
        .unwrap()
    }

    fn state() -> RenderState {
        RenderState {
            model: Mat4::IDENTITY,
            view: Mat4::from_translation(Vec3::X),
            projection: Mat4::from_scale(Vec3::splat(2.0)),
            light_view: Mat4::from_translation(Vec3::Y),
            light_projection: Mat4::from_scale(Vec3::splat(3.0)),
            light_direction: Vec3::Z,
            mode: RenderMode::Normal,
        }
    }

    fn setup() -> (RecordingBackend, ProgramSet) {
        let mut backend = RecordingBackend::new(800, 600);
        let programs = ProgramSet::compile(&mut backend).unwrap();
        (backend, programs)
    }

    #[test]
    fn test_centroid_tracks_add_and_remove() {
        let (mut backend, _) = setup();
        let mut layers = LayerSet::new();
        assert_eq!(layers.centroid(), Vec3::ZERO);

        layers
            .add_layer(&mut backend, "a", triangle(0.0), LayerOptions::default())
            .unwrap();
        assert!(layers.centroid().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));

        layers
            .add_layer(&mut backend, "b", triangle(10.0), LayerOptions::default())
            .unwrap();
        assert!(layers.centroid().abs_diff_eq(Vec3::new(6.0, 1.0, 0.0), 1e-5));

        assert!(layers.remove_layer(&mut backend, "b"));
        assert!(layers.centroid().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_centroid_of_large_coordinates() {
        let (mut backend, _) = setup();
        let mut layers = LayerSet::new();
        layers
            .add_layer(&mut backend, "far", triangle(4_000_000.0), LayerOptions::default())
            .unwrap();
        assert!((layers.centroid().x - 4_000_001.0).abs() <= 1.0);
    }

    #[test]
    fn test_replacing_layer_releases_old_mesh() {
        let (mut backend, _) = setup();
        let mut layers = LayerSet::new();
        layers
            .add_layer(&mut backend, "water", triangle(0.0), LayerOptions::default())
            .unwrap();
        let first = layers.get("water").unwrap().mesh();

        layers
            .add_layer(&mut backend, "water", triangle(5.0), LayerOptions::default())
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert_ne!(layers.get("water").unwrap().mesh(), first);
        assert!(backend.calls.contains(&GpuCall::DestroyMesh(first)));
        assert_eq!(backend.live_meshes(), 1);
    }

    #[test]
    fn test_remove_missing_layer_is_noop() {
        let (mut backend, _) = setup();
        let mut layers = LayerSet::new();
        layers
            .add_layer(&mut backend, "parks", triangle(0.0), LayerOptions::default())
            .unwrap();
        let before = backend.calls.len();

        assert!(!layers.remove_layer(&mut backend, "roads"));
        assert_eq!(layers.len(), 1);
        assert_eq!(backend.calls.len(), before);
    }

    #[test]
    fn test_clear_releases_everything() {
        let (mut backend, _) = setup();
        let mut layers = LayerSet::new();
        for name in ["a", "b", "c"] {
            layers
                .add_layer(&mut backend, name, triangle(1.0), LayerOptions::default())
                .unwrap();
        }
        layers.clear(&mut backend);
        assert!(layers.is_empty());
        assert_eq!(backend.live_meshes(), 0);
        assert_eq!(layers.centroid(), Vec3::ZERO);
    }

    #[test]
    fn test_draw_order_is_by_name() {
        let (mut backend, programs) = setup();
        let mut layers = LayerSet::new();
        for name in ["water", "buildings", "surface"] {
            layers
                .add_layer(&mut backend, name, triangle(0.0), LayerOptions::default())
                .unwrap();
        }
        assert_eq!(
            layers.names().collect::<Vec<_>>(),
            vec!["buildings", "surface", "water"]
        );

        let target = TargetHandle(99);
        layers
            .draw(&mut backend, &programs, &state(), PassKind::Depth, target, 0.0)
            .unwrap();
        let drawn: Vec<_> = backend.draws().iter().map(|d| d.mesh).collect();
        let expected: Vec<_> = layers.iter().map(|l| l.mesh()).collect();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn test_depth_pass_uses_light_matrices() {
        let (mut backend, programs) = setup();
        let mut layers = LayerSet::new();
        layers
            .add_layer(
                &mut backend,
                "surface",
                triangle(0.0),
                LayerOptions { depth_bias: true },
            )
            .unwrap();

        let state = state();
        layers
            .draw(&mut backend, &programs, &state, PassKind::Depth, TargetHandle(7), 0.0)
            .unwrap();

        let draw = backend.draws()[0].clone();
        assert_eq!(draw.program, programs.depth);
        assert!(draw.depth_bias);
        assert_eq!(draw.shadow_map, None);
        let LayerUniforms::Depth(uniforms) = draw.uniforms else {
            panic!("expected depth uniforms");
        };
        assert_eq!(uniforms.view, state.light_view);
        assert_eq!(uniforms.projection, state.light_projection);
    }

    #[test]
    fn test_color_pass_uses_eye_and_light_matrices() {
        let (mut backend, programs) = setup();
        let mut layers = LayerSet::new();
        layers
            .add_layer(&mut backend, "water", triangle(0.0), LayerOptions::default())
            .unwrap();

        let state = state();
        layers
            .draw(&mut backend, &programs, &state, PassKind::Color, TargetHandle(7), 0.002)
            .unwrap();

        let draw = backend.draws()[0].clone();
        assert_eq!(draw.program, programs.shaded);
        assert!(!draw.depth_bias);
        assert_eq!(draw.shadow_map, Some(TargetHandle(7)));
        assert_eq!(draw.index_count, 3);
        let LayerUniforms::Shaded(uniforms) = draw.uniforms else {
            panic!("expected shaded uniforms");
        };
        assert_eq!(uniforms.view, state.view);
        assert_eq!(uniforms.projection, state.projection);
        assert_eq!(uniforms.light_view, state.light_view);
        assert!(!uniforms.has_normals);
        assert_eq!(uniforms.shadow_bias, 0.002);
    }
}
