//! Umbra core
//!
//! GPU-free building blocks for the layered shadow-map viewer:
//!
//! - [`transform`] - Matrix helpers (look-at, projections, pivot rotation)
//! - [`geometry`] - Validated per-layer vertex sets
//! - [`document`] - JSON geometry documents keyed by layer name
//! - [`input`] - Interactive state written by input handlers, read once per frame

pub mod constants;
pub mod document;
pub mod geometry;
pub mod input;
pub mod transform;

pub use document::{LayerEntry, LayerSource, parse_document, read_document};
pub use geometry::{GeometryError, VertexSet};
pub use input::{
    InputError, InputEvent, InputState, PointerDrag, ProjectionMode, SharedInput,
    create_shared_input, map_pointer,
};
