//! Handle types for mesh elements.
//!
//! All cross-references in the half-edge graph are `u32` indices into pool
//! storage, wrapped in per-entity newtypes so a vertex handle cannot be
//! mistaken for an edge handle. `u32::MAX` is the invalid sentinel.

use std::fmt::{self, Debug};

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident, $display:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// The invalid/null handle.
            pub const INVALID: Self = Self(u32::MAX);

            /// Create a handle from a raw pool index.
            #[inline]
            pub fn new(index: u32) -> Self {
                debug_assert!(index != u32::MAX, "index collides with the invalid sentinel");
                Self(index)
            }

            /// Create an invalid/null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self::INVALID
            }

            /// Get the raw pool index.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Check that this is a valid (non-null) handle.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

define_handle!(
    /// Handle to a vertex in the half-edge graph.
    VertexRef,
    "V"
);
define_handle!(
    /// Handle to a half-edge in the half-edge graph.
    EdgeRef,
    "HE"
);
define_handle!(
    /// Handle to a triangle in the half-edge graph.
    TriRef,
    "T"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        let v = VertexRef::new(7);
        assert!(v.is_valid());
        assert_eq!(v.raw(), 7);

        let invalid = VertexRef::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(invalid, VertexRef::default());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", EdgeRef::new(42)), "HE(42)");
        assert_eq!(format!("{:?}", TriRef::invalid()), "T(INVALID)");
    }
}
