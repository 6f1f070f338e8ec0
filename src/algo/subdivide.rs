//! Topological refinement: one subdivision step.
//!
//! A step runs in two phases over the live triangle list, both stamped with
//! the current pass generation:
//!
//! 1. **Edge split**: every edge not yet split this step is replaced by two
//!    half-edge pairs sharing a new vertex placed by the Loop edge-point rule
//!    `3/8 * (v1 + v2) + 1/8 * (v3 + v4)`, where `v1`,`v2` are the edge's
//!    endpoints and `v3`,`v4` the apex vertices of its two adjacent faces.
//!    Shared edges are visited from both sides; the generation stamp makes
//!    the second visit a no-op and the stored pair handle is reused.
//! 2. **Retriangulation**: each original triangle now bounds a hexagon and
//!    is replaced by 3 corner triangles plus 1 center triangle. A sentinel
//!    triangle bounds the list walk so freshly appended triangles are not
//!    revisited within the phase.

use nalgebra::Point3;
use tracing::debug;

use crate::error::Result;
use crate::mesh::halfedge::{HullGraph, VertexState, MAX_RING_WALK};
use crate::mesh::handle::{EdgeRef, TriRef, VertexRef};

/// Perform one full subdivision step. Triangle count quadruples.
pub(crate) fn subdivide_once(graph: &mut HullGraph) -> Result<()> {
    split_pass(graph)?;
    retriangulate_pass(graph)
}

// ==================== Phase A: edge split ====================

fn split_pass(graph: &mut HullGraph) -> Result<()> {
    let first = graph.first_triangle();
    if !first.is_valid() {
        return Ok(());
    }

    let mut t = first;
    loop {
        split_triangle_edges(graph, t)?;
        t = graph.tri(t).next;
        if t == first {
            break;
        }
    }
    Ok(())
}

fn split_triangle_edges(graph: &mut HullGraph, t: TriRef) -> Result<()> {
    let first = graph.tri(t).first_edge;
    let mut e = first;
    loop {
        // The split rewires `e.next`; remember the original successor.
        let next = graph.edge(e).next;
        if graph.edge(e).generation < graph.generation() {
            split_edge(graph, e)?;
        }
        e = next;
        if e == first {
            break;
        }
    }
    Ok(())
}

/// Apex vertex of the face on `e`'s left: the first pre-step corner after
/// `e`'s destination in the ring. Midpoints inserted earlier in this step
/// carry the current generation and are skipped.
fn apex_origin(graph: &HullGraph, e: EdgeRef) -> VertexRef {
    let current = graph.generation();
    let mut ring_edge = graph.edge(graph.edge(e).next).next;
    for _ in 0..MAX_RING_WALK {
        let v = graph.edge(ring_edge).origin;
        if graph.vertex(v).generation < current {
            return v;
        }
        ring_edge = graph.edge(ring_edge).next;
    }

    debug!("apex scan did not settle; falling back to the edge endpoint");
    graph.edge(graph.edge(e).pair).origin
}

/// Split `e` (and its pair) around a new vertex at the Loop edge point.
fn split_edge(graph: &mut HullGraph, e: EdgeRef) -> Result<()> {
    let generation = graph.generation();

    let v1 = graph.edge(e).origin;
    let old_pair = graph.edge(e).pair;
    let v2 = graph.edge(old_pair).origin;
    // Apexes are read before any rewiring, against pre-step positions.
    let v3 = apex_origin(graph, e);
    let v4 = apex_origin(graph, old_pair);

    let position = Point3::from(
        (graph.vertex(v1).position.coords + graph.vertex(v2).position.coords) * (3.0 / 8.0)
            + (graph.vertex(v3).position.coords + graph.vertex(v4).position.coords) * (1.0 / 8.0),
    );

    let new_vertex = graph.alloc_vertex()?;
    let new_edge = graph.alloc_edge()?;
    let new_edge_pair = graph.alloc_edge()?;

    let output_index = graph.next_output_index();
    {
        let record = graph.vertex_mut(new_vertex);
        record.position = position;
        record.scratch_position = position;
        record.first_edge = new_edge;
        record.state = VertexState::Refined;
        record.generation = generation;
        record.output_index = output_index;
    }

    let e_next = graph.edge(e).next;
    let e_triangle = graph.edge(e).triangle;
    let pair_next = graph.edge(old_pair).next;
    let pair_triangle = graph.edge(old_pair).triangle;

    // new_edge continues e's direction: v1 -> m becomes e, m -> v2 is new.
    {
        let record = graph.edge_mut(new_edge);
        record.origin = new_vertex;
        record.pair = old_pair;
        record.next = e_next;
        record.prev = e;
        record.triangle = e_triangle;
        record.generation = generation;
    }
    graph.cross_link(new_edge);

    {
        let record = graph.edge_mut(new_edge_pair);
        record.origin = new_vertex;
        record.pair = e;
        record.next = pair_next;
        record.prev = old_pair;
        record.triangle = pair_triangle;
        record.generation = generation;
    }
    graph.cross_link(new_edge_pair);

    {
        let record = graph.edge_mut(e);
        record.pair = new_edge_pair;
        record.next = new_edge;
        record.generation = generation;
    }
    {
        let record = graph.edge_mut(old_pair);
        record.pair = new_edge;
        record.next = new_edge_pair;
        record.generation = generation;
    }

    Ok(())
}

// ==================== Phase B: retriangulation ====================

fn retriangulate_pass(graph: &mut HullGraph) -> Result<()> {
    let start = graph.first_triangle();
    if !start.is_valid() {
        return Ok(());
    }

    // Sentinel bounding the walk: triangles appended during the pass land
    // behind it and are not revisited.
    let sentinel = graph.alloc_triangle()?;
    graph.add_triangle_to_list(sentinel);

    let mut t = start;
    while t != sentinel {
        let next = graph.tri(t).next;
        retriangulate(graph, t)?;
        t = next;
    }

    graph.remove_triangle_from_list(sentinel);
    graph.free_triangle(sentinel);
    Ok(())
}

/// Replace one hexagon-ringed triangle with 3 corner triangles + 1 center.
fn retriangulate(graph: &mut HullGraph, t: TriRef) -> Result<()> {
    let mut ring = [EdgeRef::invalid(); 6];
    let count = graph.ring_edges(t, &mut ring);
    if count != 6 {
        debug!(
            edges = count,
            "bad triangle structure: expected a 6-edge ring before retriangulation"
        );
        return Ok(());
    }

    let center = graph.alloc_triangle()?;

    // Hexagon ring: even edges originate at original corners, odd edges at
    // midpoints. Each corner triangle takes a (prev, next) slice of the ring
    // and one fresh center edge; the center edge's pair lands on the center
    // triangle.
    let center_a = corner_triangle(graph, center, &ring, 0, 5)?;
    let center_b = corner_triangle(graph, center, &ring, 4, 3)?;
    let center_c = corner_triangle(graph, center, &ring, 2, 1)?;

    set_edge_links(graph, center_a, center_b, center_c, center);
    set_edge_links(graph, center_b, center_c, center_a, center);
    set_edge_links(graph, center_c, center_a, center_b, center);

    graph.add_triangle_to_list(center);

    graph.remove_triangle_from_list(t);
    graph.free_triangle(t);
    Ok(())
}

/// Build one corner triangle over `ring[i1]`/`ring[i2]`, returning the new
/// center-side half-edge.
fn corner_triangle(
    graph: &mut HullGraph,
    center: TriRef,
    ring: &[EdgeRef; 6],
    i1: usize,
    i2: usize,
) -> Result<EdgeRef> {
    let prev_edge = ring[i1];
    let next_edge = ring[i2];
    let v1 = graph.edge(ring[i1 + 1]).origin;
    let v2 = graph.edge(next_edge).origin;

    let triangle = graph.alloc_triangle()?;
    let center_pair = closing_edge(graph, triangle, center, v1, v2, prev_edge, next_edge)?;
    graph.add_triangle_to_list(triangle);
    Ok(center_pair)
}

/// Create the edge pair closing a corner triangle: `v1 -> v2` on the corner
/// side, `v2 -> v1` on the center side.
fn closing_edge(
    graph: &mut HullGraph,
    left: TriRef,
    right: TriRef,
    v1: VertexRef,
    v2: VertexRef,
    prev_edge: EdgeRef,
    next_edge: EdgeRef,
) -> Result<EdgeRef> {
    let generation = graph.generation();
    let edge = graph.alloc_edge()?;
    let pair = graph.alloc_edge()?;

    {
        let record = graph.edge_mut(edge);
        record.origin = v1;
        record.triangle = left;
        record.pair = pair;
        record.next = next_edge;
        record.prev = prev_edge;
        record.generation = generation;
    }
    graph.cross_link(edge);

    {
        // Ring links are set once all three center edges exist.
        let record = graph.edge_mut(pair);
        record.origin = v2;
        record.triangle = right;
        record.pair = edge;
        record.next = pair;
        record.prev = pair;
        record.generation = generation;
    }

    graph.edge_mut(prev_edge).triangle = left;
    graph.edge_mut(next_edge).triangle = left;

    if !graph.tri(left).first_edge.is_valid() {
        graph.tri_mut(left).first_edge = edge;
    }
    if !graph.tri(right).first_edge.is_valid() {
        graph.tri_mut(right).first_edge = pair;
    }

    graph.update_vertex_anchor(edge);
    graph.update_vertex_anchor(pair);

    Ok(pair)
}

fn set_edge_links(
    graph: &mut HullGraph,
    e: EdgeRef,
    prev: EdgeRef,
    next: EdgeRef,
    triangle: TriRef,
) {
    {
        let record = graph.edge_mut(e);
        record.prev = prev;
        record.next = next;
        record.triangle = triangle;
    }
    graph.update_vertex_anchor(e);
}
