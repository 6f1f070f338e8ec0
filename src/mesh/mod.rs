//! Half-edge mesh data structures and construction.
//!
//! The graph lives in [`halfedge`], handles in [`handle`], the directed-edge
//! lookup used during construction in [`edge_table`], and the triangle-soup
//! builder in [`builder`]. [`HullVertex`] is the exchange type at the crate
//! boundary: the flat vertex format consumed from the hull step and produced
//! for the renderer.

pub mod edge_table;
pub mod halfedge;
pub mod handle;

pub(crate) mod builder;

pub use edge_table::EdgeTable;
pub use halfedge::{HalfEdge, HullGraph, Triangle, Vertex, VertexState};
pub use handle::{EdgeRef, TriRef, VertexRef};

use nalgebra::{Point3, Vector3};

/// A renderable hull vertex: position plus smoothed normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullVertex {
    /// Vertex position.
    pub position: Point3<f32>,
    /// Vertex normal; recomputed from incident faces by the smoother.
    pub normal: Vector3<f32>,
}

impl HullVertex {
    /// Create a vertex from a position and normal.
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

impl Default for HullVertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            normal: Vector3::zeros(),
        }
    }
}
