//! The smoothing strategy interface.
//!
//! Exactly two strategies exist: the Loop subdivision engine
//! ([`LoopSmoother`](crate::algo::LoopSmoother)) and an identity pass-through
//! used when smoothing is disabled or as a cheap testing stand-in.

use crate::algo::loop_smooth::LoopSmoother;
use crate::error::Result;
use crate::mesh::HullVertex;

/// A hull smoothing strategy.
///
/// Implementations own whatever scratch state they need; repeated calls on
/// one instance must be sequential, but independent instances are fully
/// isolated and may run on separate threads.
pub trait Smoother {
    /// Configure subdivision and relaxation iteration counts.
    ///
    /// Takes effect on the next [`Smoother::smooth`] call. The default
    /// implementation ignores the request (the identity strategy has no
    /// levels).
    fn set_smooth_level(&mut self, _smooth_level: u16, _refine_level: u16) {}

    /// Smooth `in_vertices`/`in_indices` into the output buffers.
    ///
    /// The output buffers are cleared and refilled; after the call returns
    /// they are plain caller-owned data with no aliasing into smoother
    /// internals.
    fn smooth(
        &mut self,
        in_vertices: &[HullVertex],
        in_indices: &[u32],
        out_vertices: &mut Vec<HullVertex>,
        out_indices: &mut Vec<u32>,
    ) -> Result<()>;
}

/// Pass-through strategy: output is a verbatim copy of the input.
#[derive(Debug, Default)]
pub struct IdentitySmoother;

impl Smoother for IdentitySmoother {
    fn smooth(
        &mut self,
        in_vertices: &[HullVertex],
        in_indices: &[u32],
        out_vertices: &mut Vec<HullVertex>,
        out_indices: &mut Vec<u32>,
    ) -> Result<()> {
        out_vertices.clear();
        out_vertices.extend_from_slice(in_vertices);
        out_indices.clear();
        out_indices.extend_from_slice(in_indices);
        Ok(())
    }
}

/// Create a boxed Loop subdivision smoother with the given level.
pub fn loop_smoother(smooth_level: u16) -> Box<dyn Smoother> {
    Box::new(LoopSmoother::new(smooth_level))
}

/// Create a boxed identity smoother that only copies its input.
pub fn identity_smoother() -> Box<dyn Smoother> {
    Box::new(IdentitySmoother)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_identity_copies_verbatim() {
        let vertices = vec![
            HullVertex::new(Point3::new(0.25, -1.5, 3.0), Vector3::new(0.0, 1.0, 0.0)),
            HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)),
            HullVertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, 1.0)),
        ];
        let indices = vec![0u32, 1, 2];

        let mut smoother = identity_smoother();
        let mut out_vertices = Vec::new();
        let mut out_indices = Vec::new();
        smoother
            .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
            .unwrap();

        assert_eq!(out_vertices, vertices);
        assert_eq!(out_indices, indices);
    }

    #[test]
    fn test_identity_ignores_levels() {
        let mut smoother = identity_smoother();
        smoother.set_smooth_level(3, 2);

        let vertices = vec![HullVertex::default()];
        let indices = vec![0u32, 0, 0];
        let mut out_vertices = Vec::new();
        let mut out_indices = Vec::new();
        smoother
            .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
            .unwrap();

        assert_eq!(out_indices, indices);
    }
}
