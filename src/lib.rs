//! # Ripple
//!
//! A surface smoothing engine for coarse convex-hull meshes.
//!
//! Ripple takes the triangle soup an external convex-hull step produces for
//! a tracked object (its original use: liquid droplet clusters, re-hulled
//! every frame) and refines it into a smooth renderable mesh: it builds a
//! half-edge graph over the soup, runs a configurable number of Loop
//! subdivision steps interleaved with vertex relaxation passes, and emits
//! flat vertex/index buffers with recomputed smoothed normals.
//!
//! Because the engine runs many times per second, all working memory comes
//! from per-instance pools that are reset (never freed) between calls:
//! after the first call on a given hull size, a smoothing call performs no
//! heap allocation.
//!
//! ## Quick start
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use ripple::prelude::*;
//!
//! // A tetrahedron from the hull step (winding need not be consistent;
//! // the builder fixes it against the mesh centroid).
//! let vertices = vec![
//!     HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
//!     HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
//!     HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
//!     HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
//! ];
//! let indices = vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];
//!
//! let (out_vertices, out_indices) = smooth_hull(&vertices, &indices, 2, 1).unwrap();
//! assert_eq!(out_indices.len() / 3, 4 * 4 * 4);
//! ```
//!
//! ## Per-frame use
//!
//! Keep one [`LoopSmoother`](algo::LoopSmoother) per tracked object and
//! reuse it; its pools and tables retain capacity across calls:
//!
//! ```
//! use ripple::prelude::*;
//! # use nalgebra::{Point3, Vector3};
//! # let vertices = vec![
//! #     HullVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros()),
//! #     HullVertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros()),
//! #     HullVertex::new(Point3::new(0.5, 1.0, 0.0), Vector3::zeros()),
//! #     HullVertex::new(Point3::new(0.5, 0.5, 1.0), Vector3::zeros()),
//! # ];
//! # let indices = vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];
//!
//! let mut smoother = LoopSmoother::new(1);
//! let mut out_vertices = Vec::new();
//! let mut out_indices = Vec::new();
//!
//! // Once per frame, with that frame's hull:
//! smoother.smooth(&vertices, &indices, &mut out_vertices, &mut out_indices).unwrap();
//! ```
//!
//! Setting the smooth level to 0 (or using
//! [`identity_smoother`](algo::identity_smoother)) returns the input
//! unchanged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;
pub mod pool;

/// Prelude module for convenient imports.
///
/// ```
/// use ripple::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        identity_smoother, loop_smoother, smooth_hull, IdentitySmoother, LoopSmoother, Smoother,
    };
    pub use crate::error::{HullError, Result};
    pub use crate::mesh::HullVertex;
}

// Re-export nalgebra for convenience.
pub use nalgebra;
