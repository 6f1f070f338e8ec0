//! Pooled half-edge graph for hull smoothing.
//!
//! The graph is rebuilt from triangle soup at the start of every smoothing
//! call and torn down by a bulk pool reset at the start of the next one;
//! nothing is freed in between except triangles retired by retriangulation.
//!
//! # Structure
//!
//! - Each undirected edge is represented by two **half-edges** pointing in
//!   opposite directions; each knows its **pair** (the opposite half-edge),
//!   its **origin** vertex, the **triangle** on its left, and the `next`/
//!   `prev` half-edges of that triangle's edge ring.
//! - Each vertex anchors one outgoing half-edge; walking `pair.next`
//!   repeatedly from it visits every edge incident to the vertex in
//!   consistent rotational order.
//! - Live triangles form an intrusive circular list so retriangulation can
//!   unlink and append them in O(1).
//!
//! Visited-tracking is done with monotonically increasing generation stamps
//! on vertices and edges instead of per-pass visited sets, so the passes
//! allocate nothing beyond the entities they create.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::handle::{EdgeRef, TriRef, VertexRef};
use crate::error::Result;
use crate::pool::Pool;

/// Upper bound on ring walks, so degenerate topology cannot hang a pass.
pub(crate) const MAX_RING_WALK: usize = 64;

/// Lifecycle state of a vertex within one smoothing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexState {
    /// Created by the builder from an input vertex.
    #[default]
    Initial,
    /// Created (or repositioned) by a refinement pass.
    Refined,
    /// Already written to the output vertex buffer.
    Copied,
}

/// A vertex in the half-edge graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Current position.
    pub position: Point3<f32>,
    /// Relaxation write buffer, double-buffered against `position`.
    pub scratch_position: Point3<f32>,
    /// One outgoing half-edge anchoring this vertex's edge ring.
    pub first_edge: EdgeRef,
    /// Lifecycle marker.
    pub state: VertexState,
    /// Last pass generation that touched this vertex.
    pub generation: u64,
    /// Index of this vertex in the emitted vertex buffer.
    pub output_index: u32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            scratch_position: Point3::origin(),
            first_edge: EdgeRef::invalid(),
            state: VertexState::Initial,
            generation: 0,
            output_index: 0,
        }
    }
}

/// A half-edge in the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfEdge {
    /// Vertex this half-edge starts from.
    pub origin: VertexRef,
    /// Triangle on this half-edge's left.
    pub triangle: TriRef,
    /// Opposite-direction half-edge over the same undirected edge.
    pub pair: EdgeRef,
    /// Next half-edge in the owning triangle's ring.
    pub next: EdgeRef,
    /// Previous half-edge in the owning triangle's ring.
    pub prev: EdgeRef,
    /// Last pass generation that split or created this half-edge.
    pub generation: u64,
}

/// A triangle in the graph.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Entry point into this triangle's edge ring.
    pub first_edge: EdgeRef,
    /// Cached face normal; only meaningful when `normal_computed` is set.
    pub normal: Vector3<f32>,
    /// Whether `normal` has been computed for the current positions.
    pub normal_computed: bool,
    /// Next triangle in the live list.
    pub next: TriRef,
    /// Previous triangle in the live list.
    pub prev: TriRef,
}

impl Default for Triangle {
    fn default() -> Self {
        Self {
            first_edge: EdgeRef::invalid(),
            normal: Vector3::zeros(),
            normal_computed: false,
            next: TriRef::invalid(),
            prev: TriRef::invalid(),
        }
    }
}

/// The half-edge graph plus the pools backing it.
///
/// All state is reset (not reallocated) by [`HullGraph::reset`]; pool and
/// list capacity is retained across calls and never shrinks.
#[derive(Debug)]
pub struct HullGraph {
    vertices: Pool<Vertex>,
    edges: Pool<HalfEdge>,
    triangles: Pool<Triangle>,
    first_triangle: TriRef,
    total_vertices: usize,
    total_triangles: usize,
    generation: u64,
}

impl HullGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            vertices: Pool::new(),
            edges: Pool::new(),
            triangles: Pool::new(),
            first_triangle: TriRef::invalid(),
            total_vertices: 0,
            total_triangles: 0,
            generation: 0,
        }
    }

    // ==================== Accessors ====================

    /// Borrow a vertex record.
    #[inline]
    pub fn vertex(&self, v: VertexRef) -> &Vertex {
        self.vertices.get(v.raw())
    }

    /// Mutably borrow a vertex record.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexRef) -> &mut Vertex {
        self.vertices.get_mut(v.raw())
    }

    /// Borrow a half-edge record.
    #[inline]
    pub fn edge(&self, e: EdgeRef) -> &HalfEdge {
        self.edges.get(e.raw())
    }

    /// Mutably borrow a half-edge record.
    #[inline]
    pub fn edge_mut(&mut self, e: EdgeRef) -> &mut HalfEdge {
        self.edges.get_mut(e.raw())
    }

    /// Borrow a triangle record.
    #[inline]
    pub fn tri(&self, t: TriRef) -> &Triangle {
        self.triangles.get(t.raw())
    }

    /// Mutably borrow a triangle record.
    #[inline]
    pub fn tri_mut(&mut self, t: TriRef) -> &mut Triangle {
        self.triangles.get_mut(t.raw())
    }

    /// Head of the live-triangle list; invalid when the graph is empty.
    #[inline]
    pub fn first_triangle(&self) -> TriRef {
        self.first_triangle
    }

    /// Number of triangles currently in the live list.
    #[inline]
    pub fn live_triangles(&self) -> usize {
        self.total_triangles
    }

    /// Size of the output vertex space (input vertices plus created ones).
    #[inline]
    pub fn vertex_total(&self) -> usize {
        self.total_vertices
    }

    /// Current pass generation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new pass generation.
    pub(crate) fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// Claim the next output-buffer index for a created vertex.
    pub(crate) fn next_output_index(&mut self) -> u32 {
        let index = self.total_vertices as u32;
        self.total_vertices += 1;
        index
    }

    /// Record how many input vertices the builder consumed.
    pub(crate) fn set_vertex_total(&mut self, count: usize) {
        self.total_vertices = count;
    }

    // ==================== Lifecycle ====================

    /// Return every entity to its pool and clear the live list.
    ///
    /// Capacity is retained; repeated calls on similarly sized hulls reuse
    /// the same pages.
    pub fn reset(&mut self) {
        self.vertices.reset();
        self.edges.reset();
        self.triangles.reset();
        self.first_triangle = TriRef::invalid();
        self.total_vertices = 0;
        self.total_triangles = 0;
        self.generation = 0;
    }

    /// Grow the pools ahead of a pass.
    pub fn reserve(&mut self, vertices: usize, edges: usize, triangles: usize) -> Result<()> {
        self.vertices.reserve(vertices)?;
        self.edges.reserve(edges)?;
        self.triangles.reserve(triangles)?;
        Ok(())
    }

    /// Allocate a vertex with default contents.
    pub(crate) fn alloc_vertex(&mut self) -> Result<VertexRef> {
        let handle = self.vertices.allocate()?;
        *self.vertices.get_mut(handle) = Vertex::default();
        Ok(VertexRef::new(handle))
    }

    /// Allocate a half-edge with default contents.
    pub(crate) fn alloc_edge(&mut self) -> Result<EdgeRef> {
        let handle = self.edges.allocate()?;
        *self.edges.get_mut(handle) = HalfEdge::default();
        Ok(EdgeRef::new(handle))
    }

    /// Allocate a triangle with default contents (not yet on the live list).
    pub(crate) fn alloc_triangle(&mut self) -> Result<TriRef> {
        let handle = self.triangles.allocate()?;
        *self.triangles.get_mut(handle) = Triangle::default();
        Ok(TriRef::new(handle))
    }

    /// Return a triangle to its pool. It must already be off the live list.
    pub(crate) fn free_triangle(&mut self, t: TriRef) {
        self.triangles.deallocate(t.raw());
    }

    // ==================== Live-triangle list ====================

    /// Append a triangle to the live list.
    pub(crate) fn add_triangle_to_list(&mut self, t: TriRef) {
        if self.first_triangle.is_valid() {
            let first = self.first_triangle;
            let tail = self.tri(first).prev;

            let record = self.tri_mut(t);
            record.next = first;
            record.prev = tail;

            self.tri_mut(first).prev = t;
            self.tri_mut(tail).next = t;
        } else {
            let record = self.tri_mut(t);
            record.next = t;
            record.prev = t;
            self.first_triangle = t;
        }

        self.total_triangles += 1;
    }

    /// Unlink a triangle from the live list without touching its edges.
    pub(crate) fn remove_triangle_from_list(&mut self, t: TriRef) {
        let next = self.tri(t).next;
        let prev = self.tri(t).prev;

        self.tri_mut(prev).next = next;
        self.tri_mut(next).prev = prev;

        if t == self.first_triangle {
            self.first_triangle = if next == t { TriRef::invalid() } else { next };
        }

        self.total_triangles -= 1;
    }

    // ==================== Ring maintenance ====================

    /// Make an edge's ring neighbours point back at it.
    pub(crate) fn cross_link(&mut self, e: EdgeRef) {
        let next = self.edge(e).next;
        let prev = self.edge(e).prev;
        self.edge_mut(next).prev = e;
        self.edge_mut(prev).next = e;
    }

    /// Update the origin vertex's ring anchor for a freshly linked edge.
    ///
    /// The anchor prefers an edge whose `pair.next` returns to the same
    /// vertex, which keeps the ring entry point cheap to verify.
    pub(crate) fn update_vertex_anchor(&mut self, e: EdgeRef) {
        let v = self.edge(e).origin;

        if self.vertex(v).first_edge.is_valid() {
            if self.edge(e).next == e {
                return;
            }
            let pair = self.edge(e).pair;
            let pair_next = self.edge(pair).next;
            let prev = self.edge(e).prev;
            let prev_pair = self.edge(prev).pair;
            if self.edge(pair_next).origin == v && self.edge(prev_pair).origin != v {
                self.vertex_mut(v).first_edge = e;
            }
        } else {
            self.vertex_mut(v).first_edge = e;
        }
    }

    /// Collect a triangle's ring edges into `out`.
    ///
    /// Returns the full ring length, which may exceed `out.len()`; the walk
    /// is bounded by [`MAX_RING_WALK`] against corrupt rings.
    pub(crate) fn ring_edges(&self, t: TriRef, out: &mut [EdgeRef]) -> usize {
        let first = self.tri(t).first_edge;
        if !first.is_valid() {
            return 0;
        }

        let mut e = first;
        let mut count = 0;
        loop {
            if count < out.len() {
                out[count] = e;
            }
            e = self.edge(e).next;
            count += 1;
            if e == first || count >= MAX_RING_WALK {
                break;
            }
        }
        count
    }

    /// Count the edge-ring neighbours of a vertex.
    pub(crate) fn vertex_valence(&self, v: VertexRef) -> usize {
        let first = self.vertex(v).first_edge;
        if !first.is_valid() {
            return 0;
        }

        let mut e = first;
        let mut count = 0;
        loop {
            let pair = self.edge(e).pair;
            e = self.edge(pair).next;
            count += 1;
            if e == first || self.edge(e).origin != v || count >= MAX_RING_WALK {
                break;
            }
        }
        count
    }

    // ==================== Geometry ====================

    /// Face normal of a triangle, computed lazily and cached.
    pub fn face_normal(&mut self, t: TriRef) -> Vector3<f32> {
        if self.tri(t).normal_computed {
            return self.tri(t).normal;
        }

        let mut ring = [EdgeRef::invalid(); 3];
        let count = self.ring_edges(t, &mut ring);
        if count != 3 {
            debug!(
                edges = count,
                "bad triangle structure: expected a 3-edge ring while computing a normal"
            );
            return Vector3::y();
        }

        let p1 = self.vertex(self.edge(ring[0]).origin).position;
        let p2 = self.vertex(self.edge(ring[1]).origin).position;
        let p3 = self.vertex(self.edge(ring[2]).origin).position;

        let cross = (p2 - p1).cross(&(p3 - p1));
        let len = cross.norm();
        let normal = if len > 1e-12 {
            cross / len
        } else {
            Vector3::y()
        };

        let record = self.tri_mut(t);
        record.normal = normal;
        record.normal_computed = true;
        normal
    }

    // ==================== Validation ====================

    /// Walk the whole graph and count invariant violations.
    ///
    /// Each anomaly is logged at debug level. `expected_ring_len` is 3 for a
    /// settled mesh and 6 between the two subdivision phases; 0 skips the
    /// ring-length check.
    pub fn verify(&self, expected_ring_len: usize) -> usize {
        let first = self.first_triangle;
        if !first.is_valid() {
            return 0;
        }

        let mut anomalies = 0;
        let mut t = first;
        loop {
            anomalies += self.verify_triangle(t, expected_ring_len);
            t = self.tri(t).next;
            if t == first {
                break;
            }
        }
        anomalies
    }

    fn verify_triangle(&self, t: TriRef, expected_ring_len: usize) -> usize {
        let mut anomalies = 0;

        let first_edge = self.tri(t).first_edge;
        if !first_edge.is_valid() {
            debug!(?t, "triangle without edges");
            return 1;
        }

        let mut e = first_edge;
        let mut steps = 0;
        loop {
            let record = *self.edge(e);

            if !record.pair.is_valid() {
                debug!(?e, "edge without pair");
                anomalies += 1;
            } else if self.edge(record.pair).pair != e {
                debug!(?e, "pair back-reference mismatch");
                anomalies += 1;
            }

            if !record.triangle.is_valid() {
                debug!(?e, "edge without owning triangle");
                anomalies += 1;
            }

            anomalies += self.verify_anchored(record.origin, e);

            e = record.next;
            steps += 1;
            if e == first_edge || steps >= MAX_RING_WALK {
                break;
            }
        }

        if expected_ring_len > 0 {
            let mut scratch = [EdgeRef::invalid(); 8];
            let count = self.ring_edges(t, &mut scratch);
            if count != expected_ring_len {
                debug!(
                    edges = count,
                    expected = expected_ring_len,
                    "bad triangle structure detected during verification"
                );
                anomalies += 1;
            }
        }

        anomalies
    }

    /// Check that `e` appears exactly once in its origin's edge ring.
    fn verify_anchored(&self, v: VertexRef, e: EdgeRef) -> usize {
        let anchor = self.vertex(v).first_edge;
        if !anchor.is_valid() {
            debug!(?v, "vertex without anchor edge");
            return 1;
        }

        let mut ring_edge = anchor;
        let mut found = 0;
        let mut steps = 0;
        loop {
            if ring_edge == e {
                found += 1;
            }
            let pair = self.edge(ring_edge).pair;
            if !pair.is_valid() {
                break;
            }
            ring_edge = self.edge(pair).next;
            steps += 1;
            if ring_edge == anchor || self.edge(ring_edge).origin != v || steps >= MAX_RING_WALK {
                break;
            }
        }

        if found == 1 {
            0
        } else {
            debug!(?e, found, "edge not reachable exactly once from its vertex ring");
            1
        }
    }
}

impl Default for HullGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let graph = HullGraph::new();
        assert!(!graph.first_triangle().is_valid());
        assert_eq!(graph.live_triangles(), 0);
        assert_eq!(graph.verify(3), 0);
    }

    #[test]
    fn test_triangle_list_add_remove() {
        let mut graph = HullGraph::new();
        let a = graph.alloc_triangle().unwrap();
        let b = graph.alloc_triangle().unwrap();
        let c = graph.alloc_triangle().unwrap();

        graph.add_triangle_to_list(a);
        graph.add_triangle_to_list(b);
        graph.add_triangle_to_list(c);
        assert_eq!(graph.live_triangles(), 3);
        assert_eq!(graph.first_triangle(), a);
        // Circular order: a -> b -> c -> a.
        assert_eq!(graph.tri(a).next, b);
        assert_eq!(graph.tri(c).next, a);
        assert_eq!(graph.tri(a).prev, c);

        graph.remove_triangle_from_list(b);
        assert_eq!(graph.live_triangles(), 2);
        assert_eq!(graph.tri(a).next, c);
        assert_eq!(graph.tri(c).prev, a);

        graph.remove_triangle_from_list(a);
        assert_eq!(graph.first_triangle(), c);

        graph.remove_triangle_from_list(c);
        assert!(!graph.first_triangle().is_valid());
        assert_eq!(graph.live_triangles(), 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut graph = HullGraph::new();
        let t = graph.alloc_triangle().unwrap();
        graph.add_triangle_to_list(t);
        graph.bump_generation();
        graph.set_vertex_total(12);

        graph.reset();
        assert!(!graph.first_triangle().is_valid());
        assert_eq!(graph.live_triangles(), 0);
        assert_eq!(graph.vertex_total(), 0);
        assert_eq!(graph.generation(), 0);
    }
}
