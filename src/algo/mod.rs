//! Smoothing passes and strategies.
//!
//! The smoothing pipeline is split into three passes over the half-edge
//! graph:
//!
//! - **Subdivision**: split every edge at the Loop edge point, then
//!   retriangulate each resulting hexagon into 4 triangles.
//! - **Relaxation**: recompute vertex positions with Loop's
//!   valence-weighted neighbour average, double-buffered.
//! - **Emission**: serialize the refined graph to flat vertex/index buffers
//!   with per-vertex averaged normals.
//!
//! [`LoopSmoother`] drives the passes; [`Smoother`] is the strategy
//! interface shared with the trivial [`IdentitySmoother`].

pub mod loop_smooth;
pub mod smoother;

pub(crate) mod emit;
pub(crate) mod relax;
pub(crate) mod subdivide;

pub use loop_smooth::{smooth_hull, LoopSmoother};
pub use smoother::{identity_smoother, loop_smoother, IdentitySmoother, Smoother};
