//! Adjacency construction from triangle soup.
//!
//! Consumes a flat vertex/index buffer (the output of an external convex
//! hull step) and populates the half-edge graph. Input winding is not
//! trusted: each triangle's normal is tested against the direction from the
//! triangle to the mesh centroid, and triangles facing inward are relinked
//! in reverse so the whole graph ends up with consistent outward-facing
//! counter-clockwise winding.

use nalgebra::Vector3;
use tracing::{debug, warn};

use super::edge_table::EdgeTable;
use super::halfedge::{HullGraph, VertexState, MAX_RING_WALK};
use super::handle::{TriRef, VertexRef};
use super::HullVertex;
use crate::error::{HullError, Result};

/// Build the half-edge graph for `in_vertices`/`in_indices`.
///
/// `index_map` is scratch storage mapping input vertex indices to graph
/// vertices; it is cleared here and kept around by the caller so repeated
/// calls do not reallocate it.
pub(crate) fn build_adjacency(
    graph: &mut HullGraph,
    table: &mut EdgeTable,
    index_map: &mut Vec<VertexRef>,
    in_vertices: &[HullVertex],
    in_indices: &[u32],
) -> Result<()> {
    validate_input(in_vertices, in_indices)?;

    index_map.clear();
    index_map.resize(in_vertices.len(), VertexRef::invalid());

    // Centroid over the index array: vertices shared by several triangles
    // weigh proportionally, which matches how the winding test below sees
    // the surface.
    let mut centroid = Vector3::zeros();
    for &index in in_indices {
        centroid += in_vertices[index as usize].position.coords;
    }
    centroid /= in_indices.len() as f32;

    for triangle_indices in in_indices.chunks_exact(3) {
        let i0 = triangle_indices[0] as usize;
        let i1 = triangle_indices[1] as usize;
        let i2 = triangle_indices[2] as usize;

        if i0 == i1 || i1 == i2 || i0 == i2 {
            warn!(i0, i1, i2, "skipping degenerate input triangle");
            continue;
        }

        let v0 = resolve_vertex(graph, index_map, in_vertices, i0)?;
        let v1 = resolve_vertex(graph, index_map, in_vertices, i1)?;
        let v2 = resolve_vertex(graph, index_map, in_vertices, i2)?;

        let triangle = graph.alloc_triangle()?;
        graph.add_triangle_to_list(triangle);

        let p0 = graph.vertex(v0).position;
        let p1 = graph.vertex(v1).position;
        let p2 = graph.vertex(v2).position;
        let normal = (p1 - p0).cross(&(p2 - p0));
        let out_direction = p0.coords - centroid;

        if normal.dot(&out_direction) > 0.0 {
            // Already counter-clockwise as seen from outside.
            add_edge(graph, table, triangle, v0, v1)?;
            add_edge(graph, table, triangle, v1, v2)?;
            add_edge(graph, table, triangle, v2, v0)?;
        } else {
            // Clockwise; relink in reverse order.
            add_edge(graph, table, triangle, v0, v2)?;
            add_edge(graph, table, triangle, v2, v1)?;
            add_edge(graph, table, triangle, v1, v0)?;
        }
    }

    graph.set_vertex_total(in_vertices.len());
    Ok(())
}

fn validate_input(in_vertices: &[HullVertex], in_indices: &[u32]) -> Result<()> {
    if in_indices.is_empty() {
        return Err(HullError::EmptyMesh);
    }
    if in_indices.len() % 3 != 0 {
        return Err(HullError::IndexCountNotTriangles {
            count: in_indices.len(),
        });
    }
    for (i, &index) in in_indices.iter().enumerate() {
        if index as usize >= in_vertices.len() {
            return Err(HullError::InvalidVertexIndex {
                triangle: i / 3,
                vertex: index as usize,
            });
        }
    }
    Ok(())
}

/// Fetch or create the graph vertex for an input vertex index.
fn resolve_vertex(
    graph: &mut HullGraph,
    index_map: &mut [VertexRef],
    in_vertices: &[HullVertex],
    index: usize,
) -> Result<VertexRef> {
    if index_map[index].is_valid() {
        return Ok(index_map[index]);
    }

    let v = graph.alloc_vertex()?;
    let generation = graph.generation();
    let record = graph.vertex_mut(v);
    record.position = in_vertices[index].position;
    record.scratch_position = in_vertices[index].position;
    record.state = VertexState::Initial;
    record.generation = generation;
    record.output_index = index as u32;

    index_map[index] = v;
    Ok(v)
}

/// Find or create the half-edge `v1 -> v2` and link it into `triangle`'s ring.
fn add_edge(
    graph: &mut HullGraph,
    table: &mut EdgeTable,
    triangle: TriRef,
    v1: VertexRef,
    v2: VertexRef,
) -> Result<()> {
    // The opposite direction may already exist from the neighbouring
    // triangle; if so, this direction is its pair.
    let edge = match table.find(v2, v1) {
        Some(opposite) => graph.edge(opposite).pair,
        None => {
            let generation = graph.generation();
            let edge = graph.alloc_edge()?;
            let pair = graph.alloc_edge()?;

            {
                let record = graph.edge_mut(edge);
                record.origin = v1;
                record.pair = pair;
                record.generation = generation;
            }
            {
                // The pair's triangle is unknown until its own face shows up;
                // until then it self-loops outside any valid ring.
                let record = graph.edge_mut(pair);
                record.origin = v2;
                record.pair = edge;
                record.next = pair;
                record.prev = pair;
                record.generation = generation;
            }

            table.insert(v1, v2, edge);
            table.insert(v2, v1, pair);
            edge
        }
    };

    graph.edge_mut(edge).triangle = triangle;

    if graph.tri(triangle).first_edge.is_valid() {
        // Insert after the ring edge whose destination is this edge's origin.
        let mut ring_edge = graph.tri(triangle).first_edge;
        let mut steps = 0;
        loop {
            ring_edge = graph.edge(ring_edge).next;
            let pair = graph.edge(ring_edge).pair;
            if graph.edge(pair).origin == v1 {
                break;
            }
            steps += 1;
            if steps >= MAX_RING_WALK {
                debug!("triangle ring has no slot for edge; input is non-manifold");
                break;
            }
        }

        let next = graph.edge(ring_edge).next;
        {
            let record = graph.edge_mut(edge);
            record.prev = ring_edge;
            record.next = next;
        }
        graph.cross_link(edge);
    } else {
        let record = graph.edge_mut(edge);
        record.next = edge;
        record.prev = edge;
        graph.tri_mut(triangle).first_edge = edge;
    }

    graph.update_vertex_anchor(edge);
    // The pair's anchor is left alone: it is not part of a valid ring yet.

    Ok(())
}
