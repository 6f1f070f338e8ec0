//! Output buffer emission.
//!
//! Walks the live triangle list once, computing each vertex's normal as the
//! normalized sum of its incident face normals (unweighted; face normals are
//! computed lazily and cached per triangle). Every vertex is written to the
//! output buffer exactly once regardless of how many triangles reference it,
//! and triangle winding is preserved from construction.

use tracing::debug;

use crate::error::{HullError, Result};
use crate::mesh::halfedge::{HullGraph, VertexState, MAX_RING_WALK};
use crate::mesh::handle::{TriRef, VertexRef};
use crate::mesh::HullVertex;
use nalgebra::Vector3;

/// Serialize the live mesh into flat vertex/index buffers.
pub(crate) fn build_buffers(
    graph: &mut HullGraph,
    out_vertices: &mut Vec<HullVertex>,
    out_indices: &mut Vec<u32>,
) -> Result<()> {
    out_vertices.clear();
    out_vertices.resize(graph.vertex_total(), HullVertex::default());

    out_indices.clear();
    out_indices.reserve(graph.live_triangles() * 3);

    let first = graph.first_triangle();
    if !first.is_valid() {
        return Ok(());
    }

    let mut t = first;
    loop {
        copy_triangle(graph, t, out_vertices, out_indices)?;
        t = graph.tri(t).next;
        if t == first {
            break;
        }
    }
    Ok(())
}

/// Append one triangle's indices, emitting any vertex not yet copied.
fn copy_triangle(
    graph: &mut HullGraph,
    t: TriRef,
    out_vertices: &mut [HullVertex],
    out_indices: &mut Vec<u32>,
) -> Result<()> {
    let ring_start = graph.tri(t).first_edge;
    let mut e = ring_start;
    let mut count = 0;
    loop {
        if count >= 3 {
            debug!("bad triangle structure: ring longer than 3 while emitting");
            break;
        }

        let v = graph.edge(e).origin;
        let output_index = graph.vertex(v).output_index as usize;
        if output_index >= out_vertices.len() {
            return Err(HullError::Corrupt {
                details: format!("vertex output index {output_index} out of range"),
            });
        }

        if graph.vertex(v).state != VertexState::Copied {
            let normal = vertex_normal(graph, v);
            let record = graph.vertex_mut(v);
            out_vertices[output_index] = HullVertex::new(record.position, normal);
            record.state = VertexState::Copied;
        }

        out_indices.push(output_index as u32);
        count += 1;

        e = graph.edge(e).next;
        if e == ring_start {
            break;
        }
    }
    Ok(())
}

/// Normalized sum of the face normals of all triangles incident to `v`.
fn vertex_normal(graph: &mut HullGraph, v: VertexRef) -> Vector3<f32> {
    let first = graph.vertex(v).first_edge;
    if !first.is_valid() {
        debug!(?v, "vertex without anchor edge while emitting");
        return Vector3::y();
    }

    let mut sum = Vector3::zeros();
    let mut e = first;
    let mut steps = 0;
    loop {
        let pair = graph.edge(e).pair;
        let triangle = graph.edge(pair).triangle;
        if triangle.is_valid() {
            sum += graph.face_normal(triangle);
        } else {
            debug!(?v, "incident edge without a face while emitting");
        }

        e = graph.edge(pair).next;
        steps += 1;
        if e == first || graph.edge(e).origin != v || steps >= MAX_RING_WALK {
            break;
        }
    }

    let len = sum.norm();
    if len > 1e-12 {
        sum / len
    } else {
        debug!(?v, "zero-length vertex normal, using fallback");
        Vector3::y()
    }
}
