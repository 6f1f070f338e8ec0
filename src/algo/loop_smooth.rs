//! The Loop subdivision smoother.
//!
//! One smoothing call rebuilds the half-edge graph from the input hull,
//! then alternates subdivision steps with a configurable number of
//! relaxation passes, and finally serializes the refined mesh to flat
//! buffers. All working state (pools, lookup table, dedup map) is reset but
//! never shrunk between calls, so an instance that smooths similarly sized
//! hulls every frame stops allocating after its first call.

use crate::algo::emit::build_buffers;
use crate::algo::relax::{relax_once, BetaTable, MAX_TABLED_VALENCE};
use crate::algo::smoother::Smoother;
use crate::algo::subdivide::subdivide_once;
use crate::error::Result;
use crate::mesh::builder::build_adjacency;
use crate::mesh::{EdgeTable, HullGraph, HullVertex, VertexRef};

/// Floor on vertex-pool reservations, so tiny hulls still pre-size for the
/// common case.
const MIN_RESERVED_VERTICES: usize = 500;
/// Floor on index-derived reservations.
const MIN_RESERVED_INDICES: usize = 1500;
/// Cap on the exponent used by the reservation heuristics; higher levels
/// grow on demand instead of pre-reserving astronomically.
const MAX_RESERVE_LEVEL: u32 = 4;

/// Smoother performing Loop subdivision plus vertex relaxation.
pub struct LoopSmoother {
    smooth_level: u16,
    refine_level: u16,
    weights: BetaTable,
    graph: HullGraph,
    edge_table: EdgeTable,
    index_map: Vec<VertexRef>,
}

impl LoopSmoother {
    /// Create a smoother with the given subdivision level and one relaxation
    /// pass per step.
    pub fn new(smooth_level: u16) -> Self {
        Self {
            smooth_level,
            refine_level: 1,
            weights: BetaTable::new(MAX_TABLED_VALENCE),
            graph: HullGraph::new(),
            edge_table: EdgeTable::new(),
            index_map: Vec::new(),
        }
    }

    /// Configured subdivision iteration count.
    pub fn smooth_level(&self) -> u16 {
        self.smooth_level
    }

    /// Configured relaxation passes per subdivision step.
    pub fn refine_level(&self) -> u16 {
        self.refine_level
    }

    fn run(
        &mut self,
        in_vertices: &[HullVertex],
        in_indices: &[u32],
        out_vertices: &mut Vec<HullVertex>,
        out_indices: &mut Vec<u32>,
    ) -> Result<()> {
        if self.smooth_level == 0 {
            out_vertices.clear();
            out_vertices.extend_from_slice(in_vertices);
            out_indices.clear();
            out_indices.extend_from_slice(in_indices);
            return Ok(());
        }

        // Reset working state and pre-size the pools for the final mesh, so
        // the passes below never grow a page mid-flight in the common case.
        let reserved_vertices = in_vertices.len().max(MIN_RESERVED_VERTICES);
        let reserved_indices = in_indices.len().max(MIN_RESERVED_INDICES);
        let level = u32::from(self.smooth_level).min(MAX_RESERVE_LEVEL);

        self.graph.reset();
        self.graph.reserve(
            reserved_vertices * 2usize.pow(level),
            2 * reserved_indices * 3usize.pow(level),
            reserved_indices / 3 * 4usize.pow(level),
        )?;
        self.edge_table.reset(reserved_indices * 2);

        build_adjacency(
            &mut self.graph,
            &mut self.edge_table,
            &mut self.index_map,
            in_vertices,
            in_indices,
        )?;

        for _ in 0..self.smooth_level {
            self.graph.bump_generation();
            subdivide_once(&mut self.graph)?;

            for _ in 0..self.refine_level {
                self.graph.bump_generation();
                relax_once(&mut self.graph, &self.weights);
            }
        }

        build_buffers(&mut self.graph, out_vertices, out_indices)
    }
}

impl Smoother for LoopSmoother {
    fn set_smooth_level(&mut self, smooth_level: u16, refine_level: u16) {
        self.smooth_level = smooth_level;
        self.refine_level = refine_level;
    }

    fn smooth(
        &mut self,
        in_vertices: &[HullVertex],
        in_indices: &[u32],
        out_vertices: &mut Vec<HullVertex>,
        out_indices: &mut Vec<u32>,
    ) -> Result<()> {
        self.run(in_vertices, in_indices, out_vertices, out_indices)
    }
}

/// One-shot convenience: smooth a hull and return owned output buffers.
///
/// # Example
///
/// ```
/// use nalgebra::{Point3, Vector3};
/// use ripple::prelude::*;
///
/// let vertices = vec![
///     HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
///     HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
///     HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
///     HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
/// ];
/// let indices = vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];
///
/// let (out_vertices, out_indices) = smooth_hull(&vertices, &indices, 1, 1).unwrap();
/// assert_eq!(out_indices.len() / 3, 16);
/// assert_eq!(out_vertices.len(), 10);
/// ```
pub fn smooth_hull(
    vertices: &[HullVertex],
    indices: &[u32],
    smooth_level: u16,
    refine_level: u16,
) -> Result<(Vec<HullVertex>, Vec<u32>)> {
    let mut smoother = LoopSmoother::new(smooth_level);
    smoother.set_smooth_level(smooth_level, refine_level);

    let mut out_vertices = Vec::new();
    let mut out_indices = Vec::new();
    smoother.smooth(vertices, indices, &mut out_vertices, &mut out_indices)?;
    Ok((out_vertices, out_indices))
}
