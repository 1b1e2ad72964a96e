//! Validated per-layer vertex data.

use glam::DVec3;

use crate::constants::{COMPONENTS_PER_VERTEX, INDICES_PER_TRIANGLE};

/// Errors raised while validating or ingesting layer geometry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Failed to read geometry document: {0}")]
    Io(String),

    #[error("Failed to parse geometry document: {0}")]
    Parse(String),

    #[error("Geometry document root must be an object keyed by layer name")]
    NotAnObject,

    #[error("Malformed layer entry: {0}")]
    MalformedLayer(String),

    #[error("Coordinate count {0} is not a multiple of 3")]
    CoordinateCount(usize),

    #[error("Index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Normal count {normals} does not match coordinate count {coordinates}")]
    NormalCount { normals: usize, coordinates: usize },
}

/// Positions, optional normals and triangle indices of one layer, plus its
/// uniform RGBA color.
///
/// Construction through [`VertexSet::new`] guarantees that positions come in
/// whole triples, indices form whole triangles and reference existing
/// vertices, and normals (when present) parallel the positions.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSet {
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
    indices: Vec<u32>,
    color: [f32; 4],
}

impl VertexSet {
    /// Validate and build a vertex set.
    pub fn new(
        positions: Vec<f32>,
        indices: Vec<u32>,
        color: [f32; 4],
        normals: Option<Vec<f32>>,
    ) -> Result<Self, GeometryError> {
        if positions.len() % COMPONENTS_PER_VERTEX != 0 {
            return Err(GeometryError::CoordinateCount(positions.len()));
        }
        if indices.len() % INDICES_PER_TRIANGLE != 0 {
            return Err(GeometryError::IndexCount(indices.len()));
        }

        let vertex_count = positions.len() / COMPONENTS_PER_VERTEX;
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        if let Some(normals) = &normals
            && normals.len() != positions.len()
        {
            return Err(GeometryError::NormalCount {
                normals: normals.len(),
                coordinates: positions.len(),
            });
        }

        Ok(Self {
            positions,
            normals,
            indices,
            color,
        })
    }

    /// Flat position triples.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat normal triples, if the layer has them.
    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    /// Triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Uniform layer color (RGBA, 0..1).
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Whether per-vertex normals are present.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / COMPONENTS_PER_VERTEX
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / INDICES_PER_TRIANGLE
    }

    /// Component-wise sum of every position, accumulated in double precision
    /// so that large map coordinates do not lose the centroid.
    pub fn position_sum(&self) -> DVec3 {
        self.positions
            .chunks_exact(COMPONENTS_PER_VERTEX)
            .fold(DVec3::ZERO, |sum, p| {
                sum + DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    fn triangle() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    }

    #[test]
    fn test_valid_triangle() {
        let set = VertexSet::new(triangle(), vec![0, 1, 2], RED, None).unwrap();
        assert_eq!(set.vertex_count(), 3);
        assert_eq!(set.triangle_count(), 1);
        assert_eq!(set.index_count(), 3);
        assert!(!set.has_normals());
        assert_eq!(set.color(), RED);
    }

    #[test]
    fn test_rejects_partial_coordinate_triple() {
        let mut positions = triangle();
        positions.push(4.0);
        let err = VertexSet::new(positions, vec![0, 1, 2], RED, None).unwrap_err();
        assert_eq!(err, GeometryError::CoordinateCount(10));
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let err = VertexSet::new(triangle(), vec![0, 1], RED, None).unwrap_err();
        assert_eq!(err, GeometryError::IndexCount(2));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let err = VertexSet::new(triangle(), vec![0, 1, 3], RED, None).unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn test_rejects_mismatched_normals() {
        let err = VertexSet::new(triangle(), vec![0, 1, 2], RED, Some(vec![0.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, GeometryError::NormalCount { normals: 3, .. }));
    }

    #[test]
    fn test_accepts_matching_normals() {
        let normals = [0.0, 0.0, 1.0].repeat(3);
        let set = VertexSet::new(triangle(), vec![0, 1, 2], RED, Some(normals)).unwrap();
        assert!(set.has_normals());
        assert_eq!(set.normals().map(<[f32]>::len), Some(9));
    }

    #[test]
    fn test_position_sum() {
        let set = VertexSet::new(triangle(), vec![0, 1, 2], RED, None).unwrap();
        assert_eq!(set.position_sum(), DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_empty_set_is_valid() {
        let set = VertexSet::new(Vec::new(), Vec::new(), RED, None).unwrap();
        assert_eq!(set.vertex_count(), 0);
        assert_eq!(set.position_sum(), DVec3::ZERO);
    }
}
