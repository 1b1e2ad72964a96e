//! Geometry documents keyed by layer name.
//!
//! ```json
//! {
//!   "surface": { "coordinates": [...], "indices": [...], "color": [r, g, b, a] },
//!   "buildings": { "coordinates": [...], "indices": [...], "color": [...], "normals": [...] }
//! }
//! ```
//!
//! A broken document fails as a whole; a broken layer only fails itself.

use std::path::Path;

use serde::Deserialize;

use crate::geometry::{GeometryError, VertexSet};

/// Raw layer entry as it appears in the document
#[derive(Debug, Deserialize)]
struct RawLayer {
    coordinates: Vec<f32>,
    indices: Vec<u32>,
    color: [f32; 4],
    #[serde(default)]
    normals: Option<Vec<f32>>,
    #[serde(default)]
    depth_bias: Option<bool>,
}

/// A validated layer ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSource {
    /// Layer geometry.
    pub vertices: VertexSet,
    /// Explicit depth-bias request, `None` when the document leaves it to
    /// the viewer configuration.
    pub depth_bias: Option<bool>,
}

/// Outcome for one top-level key of a document
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    /// Layer name (the document key).
    pub name: String,
    /// The layer, or why it was rejected.
    pub result: Result<LayerSource, GeometryError>,
}

/// Parse a geometry document into per-layer entries.
///
/// Entries come back in key order.
pub fn parse_document(text: &str) -> Result<Vec<LayerEntry>, GeometryError> {
    let root: serde_json::Value =
        serde_json::from_str(text).map_err(|e| GeometryError::Parse(e.to_string()))?;
    let serde_json::Value::Object(layers) = root else {
        return Err(GeometryError::NotAnObject);
    };

    Ok(layers
        .into_iter()
        .map(|(name, value)| LayerEntry {
            result: parse_layer(value),
            name,
        })
        .collect())
}

/// Read and parse a geometry document from disk.
pub fn read_document(path: &Path) -> Result<Vec<LayerEntry>, GeometryError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GeometryError::Io(format!("{}: {}", path.display(), e)))?;
    parse_document(&text)
}

fn parse_layer(value: serde_json::Value) -> Result<LayerSource, GeometryError> {
    let raw: RawLayer =
        serde_json::from_value(value).map_err(|e| GeometryError::MalformedLayer(e.to_string()))?;
    let vertices = VertexSet::new(raw.coordinates, raw.indices, raw.color, raw.normals)?;
    Ok(LayerSource {
        vertices,
        depth_bias: raw.depth_bias,
    })
}
