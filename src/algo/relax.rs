//! Vertex relaxation: Loop's weighted neighbour average.
//!
//! Each pass recomputes every vertex position as
//! `(1 - n*beta) * position + beta * sum(neighbour positions)` with
//! `beta(n) = (5/8 - x^2) / n` and `x = 3/8 + cos(2*pi/n) / 4`, where `n` is
//! the vertex valence. Values for small valences are tabulated once per
//! smoother. New positions are written to the scratch buffer first and
//! copied back in a second sweep, so relaxation reads only pre-pass
//! positions regardless of visitation order.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::mesh::halfedge::{HullGraph, MAX_RING_WALK};
use crate::mesh::handle::VertexRef;

/// Valences below this bound use the precomputed table.
pub(crate) const MAX_TABLED_VALENCE: usize = 20;

/// Precomputed Loop smoothing weights per valence.
pub(crate) struct BetaTable {
    beta: Vec<f32>,
}

impl BetaTable {
    /// Tabulate weights for valences `0..max_valence`.
    pub(crate) fn new(max_valence: usize) -> Self {
        let beta = (0..max_valence).map(Self::compute).collect();
        Self { beta }
    }

    /// Weight for a vertex with `n` neighbours.
    #[inline]
    pub(crate) fn beta(&self, n: usize) -> f32 {
        match self.beta.get(n) {
            Some(&value) => value,
            None => Self::compute(n),
        }
    }

    fn compute(n: usize) -> f32 {
        if n == 0 {
            return 0.0;
        }
        let n = n as f32;
        let x = 3.0 / 8.0 + (2.0 * std::f32::consts::PI / n).cos() / 4.0;
        (5.0 / 8.0 - x * x) / n
    }
}

/// Run one relaxation pass over every vertex of the live mesh.
pub(crate) fn relax_once(graph: &mut HullGraph, weights: &BetaTable) {
    let first = graph.first_triangle();
    if !first.is_valid() {
        return;
    }

    // Sweep 1: compute new positions into the scratch buffer.
    let mut t = first;
    loop {
        let ring_start = graph.tri(t).first_edge;
        let mut e = ring_start;
        loop {
            let v = graph.edge(e).origin;
            refine_vertex(graph, weights, v);
            e = graph.edge(e).next;
            if e == ring_start {
                break;
            }
        }
        t = graph.tri(t).next;
        if t == first {
            break;
        }
    }

    // Sweep 2: publish the scratch buffer.
    let mut t = first;
    loop {
        let ring_start = graph.tri(t).first_edge;
        let mut e = ring_start;
        loop {
            let v = graph.edge(e).origin;
            let record = graph.vertex_mut(v);
            record.position = record.scratch_position;
            e = graph.edge(e).next;
            if e == ring_start {
                break;
            }
        }
        t = graph.tri(t).next;
        if t == first {
            break;
        }
    }
}

/// Compute one vertex's relaxed position into its scratch buffer.
///
/// Vertices are shared by every incident triangle; the generation stamp
/// makes only the first visit per pass do the work.
fn refine_vertex(graph: &mut HullGraph, weights: &BetaTable, v: VertexRef) {
    let generation = graph.generation();
    if graph.vertex(v).generation >= generation {
        return;
    }

    let first = graph.vertex(v).first_edge;
    if !first.is_valid() {
        debug!(?v, "vertex without anchor edge during relaxation");
        return;
    }

    let valence = graph.vertex_valence(v);
    let beta = weights.beta(valence);

    let mut weighted_sum = Vector3::zeros();
    let mut steps = 0;
    let mut e = first;
    loop {
        let pair = graph.edge(e).pair;
        weighted_sum += graph.vertex(graph.edge(pair).origin).position.coords * beta;
        steps += 1;
        e = graph.edge(pair).next;
        if e == first || graph.edge(e).origin != v || steps >= MAX_RING_WALK {
            break;
        }
    }

    let position = graph.vertex(v).position.coords;
    let relaxed = Point3::from(position * (1.0 - valence as f32 * beta) + weighted_sum);

    let record = graph.vertex_mut(v);
    record.scratch_position = relaxed;
    record.generation = generation;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::builder::build_adjacency;
    use crate::mesh::{EdgeTable, HullVertex};
    use nalgebra::Point3;

    #[test]
    fn test_beta_known_valences() {
        let table = BetaTable::new(MAX_TABLED_VALENCE);

        // Valence 3: x = 3/8 + cos(120 deg)/4 = 1/4, beta = (5/8 - 1/16)/3.
        assert!((table.beta(3) - 3.0 / 16.0).abs() < 1e-6);
        // Valence 6 (regular): x = 1/2, beta = (5/8 - 1/4)/6 = 1/16.
        assert!((table.beta(6) - 1.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_beta_beyond_table_matches_closed_form() {
        let table = BetaTable::new(4);
        let direct = BetaTable::new(12);
        assert!((table.beta(10) - direct.beta(10)).abs() < 1e-7);
    }

    #[test]
    fn test_relax_tetrahedron_matches_hand_computation() {
        let vertices = vec![
            HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
        ];
        let indices = vec![0u32, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];

        let mut graph = HullGraph::new();
        let mut table = EdgeTable::new();
        let mut index_map = Vec::new();
        table.reset(indices.len() * 2);
        build_adjacency(&mut graph, &mut table, &mut index_map, &vertices, &indices).unwrap();

        graph.bump_generation();
        let weights = BetaTable::new(MAX_TABLED_VALENCE);
        relax_once(&mut graph, &weights);

        // Every tetrahedron vertex has valence 3, so
        // new = (1 - 3*beta) * p + beta * (sum of the other three).
        let beta = 3.0 / 16.0;
        let total: Vector3<f32> = vertices.iter().map(|v| v.position.coords).sum();

        let first = graph.first_triangle();
        let mut t = first;
        loop {
            let ring_start = graph.tri(t).first_edge;
            let mut e = ring_start;
            loop {
                let record = graph.vertex(graph.edge(e).origin);
                let original = vertices[record.output_index as usize].position.coords;
                let expected = original * (1.0 - 3.0 * beta) + (total - original) * beta;
                assert!(
                    (record.position.coords - expected).norm() < 1e-5,
                    "vertex {} relaxed to {:?}, expected {:?}",
                    record.output_index,
                    record.position,
                    expected
                );
                e = graph.edge(e).next;
                if e == ring_start {
                    break;
                }
            }
            t = graph.tri(t).next;
            if t == first {
                break;
            }
        }
    }

    #[test]
    fn test_relax_after_subdivision_keeps_topology_sound() {
        let vertices = vec![
            HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
        ];
        let indices = vec![0u32, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];

        let mut graph = HullGraph::new();
        let mut table = EdgeTable::new();
        let mut index_map = Vec::new();
        table.reset(indices.len() * 2);
        build_adjacency(&mut graph, &mut table, &mut index_map, &vertices, &indices).unwrap();

        let weights = BetaTable::new(MAX_TABLED_VALENCE);
        graph.bump_generation();
        crate::algo::subdivide::subdivide_once(&mut graph).unwrap();
        graph.bump_generation();
        relax_once(&mut graph, &weights);

        // Relaxation moves positions but must leave the graph untouched.
        assert_eq!(graph.verify(3), 0);
        assert_eq!(graph.live_triangles(), 16);

        let first = graph.first_triangle();
        let anchor = graph.tri(first).first_edge;
        let position = graph.vertex(graph.edge(anchor).origin).position;
        assert!(position.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_relax_skips_already_stamped_vertices() {
        let vertices = vec![
            HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
            HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
        ];
        let indices = vec![0u32, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];

        let mut graph = HullGraph::new();
        let mut table = EdgeTable::new();
        let mut index_map = Vec::new();
        table.reset(indices.len() * 2);
        build_adjacency(&mut graph, &mut table, &mut index_map, &vertices, &indices).unwrap();

        let weights = BetaTable::new(MAX_TABLED_VALENCE);
        // Without a generation bump every vertex is already stamped and the
        // pass must leave positions untouched.
        relax_once(&mut graph, &weights);

        let first = graph.first_triangle();
        let anchor = graph.tri(first).first_edge;
        let record = graph.vertex(graph.edge(anchor).origin);
        let original = vertices[record.output_index as usize].position;
        assert_eq!(record.position, original);
    }
}
