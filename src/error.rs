//! Error types for ripple.
//!
//! Only conditions detected before or at the boundary of a smoothing call are
//! errors. Internal topology anomalies encountered mid-pass (degenerate rings,
//! duplicate edge registrations) are diagnostics: they are logged and the
//! offending element is skipped, because partial output beats a hard failure
//! in a per-frame rendering path.

use thiserror::Error;

/// Result type alias using [`HullError`].
pub type Result<T> = std::result::Result<T, HullError>;

/// Errors that can occur while smoothing a hull mesh.
#[derive(Error, Debug)]
pub enum HullError {
    /// The input index array is empty.
    #[error("input mesh has no triangles")]
    EmptyMesh,

    /// The input index array does not describe whole triangles.
    #[error("index count {count} is not a multiple of 3")]
    IndexCountNotTriangles {
        /// Number of indices supplied.
        count: usize,
    },

    /// A triangle references a vertex index outside the vertex array.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle ordinal in the input index array.
        triangle: usize,
        /// The out-of-range vertex index.
        vertex: usize,
    },

    /// A pool page reservation could not be satisfied.
    #[error("out of memory while reserving {what}")]
    OutOfMemory {
        /// What was being reserved.
        what: &'static str,
    },

    /// Internal bookkeeping was found violated while emitting output buffers.
    #[error("corrupt mesh state: {details}")]
    Corrupt {
        /// Description of the violated invariant.
        details: String,
    },
}
