//! Directed-edge lookup table.
//!
//! Maps an ordered `(origin, destination)` vertex pair to the half-edge that
//! owns that direction, so adjacency building can find an edge's
//! already-created pair in O(1) amortized instead of scanning every edge.
//! Hashing is the XOR of the two vertex identities with chaining; chains are
//! resolved by exact ordered comparison of both endpoints.

use tracing::debug;

use super::handle::{EdgeRef, VertexRef};

const NONE: u32 = u32::MAX;

struct EdgeNode {
    origin: VertexRef,
    dest: VertexRef,
    edge: EdgeRef,
    next: u32,
}

/// Hash table from a directed vertex pair to its half-edge.
///
/// [`EdgeTable::reset`] clears the table while keeping node capacity, so a
/// table reused every frame stops allocating once it has seen its largest
/// input.
pub struct EdgeTable {
    buckets: Vec<u32>,
    nodes: Vec<EdgeNode>,
}

impl EdgeTable {
    /// Create an empty table; call [`EdgeTable::reset`] before use.
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Clear all entries and size the bucket array.
    pub fn reset(&mut self, bucket_count: usize) {
        self.buckets.clear();
        self.buckets.resize(bucket_count.max(1), NONE);
        self.nodes.clear();
    }

    /// Number of stored directed edges.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    fn bucket(&self, origin: VertexRef, dest: VertexRef) -> usize {
        ((origin.raw() ^ dest.raw()) as usize) % self.buckets.len()
    }

    /// Look up the half-edge going from `origin` to `dest`.
    pub fn find(&self, origin: VertexRef, dest: VertexRef) -> Option<EdgeRef> {
        if self.buckets.is_empty() {
            return None;
        }

        let mut node = self.buckets[self.bucket(origin, dest)];
        while node != NONE {
            let record = &self.nodes[node as usize];
            if record.origin == origin && record.dest == dest {
                return Some(record.edge);
            }
            node = record.next;
        }
        None
    }

    /// Register the half-edge going from `origin` to `dest`.
    ///
    /// A duplicate registration indicates upstream non-manifold geometry; it
    /// is logged and ignored.
    pub fn insert(&mut self, origin: VertexRef, dest: VertexRef, edge: EdgeRef) {
        if self.find(origin, dest).is_some() {
            debug!(?origin, ?dest, "edge already registered in lookup table");
            return;
        }

        let bucket = self.bucket(origin, dest);
        let head = self.buckets[bucket];
        self.nodes.push(EdgeNode {
            origin,
            dest,
            edge,
            next: head,
        });
        self.buckets[bucket] = (self.nodes.len() - 1) as u32;
    }
}

impl Default for EdgeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_direction_sensitive() {
        let mut table = EdgeTable::new();
        table.reset(16);

        let a = VertexRef::new(1);
        let b = VertexRef::new(2);
        table.insert(a, b, EdgeRef::new(10));

        assert_eq!(table.find(a, b), Some(EdgeRef::new(10)));
        // Both directions share a bucket (XOR hash) but must not collide.
        assert_eq!(table.find(b, a), None);

        table.insert(b, a, EdgeRef::new(11));
        assert_eq!(table.find(a, b), Some(EdgeRef::new(10)));
        assert_eq!(table.find(b, a), Some(EdgeRef::new(11)));
    }

    #[test]
    fn test_chained_collisions() {
        let mut table = EdgeTable::new();
        // A single bucket forces every entry onto one chain.
        table.reset(1);

        for i in 0..8u32 {
            table.insert(VertexRef::new(i), VertexRef::new(i + 100), EdgeRef::new(i));
        }
        for i in 0..8u32 {
            assert_eq!(
                table.find(VertexRef::new(i), VertexRef::new(i + 100)),
                Some(EdgeRef::new(i))
            );
        }
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_duplicate_insert_keeps_first() {
        let mut table = EdgeTable::new();
        table.reset(4);

        let a = VertexRef::new(3);
        let b = VertexRef::new(7);
        table.insert(a, b, EdgeRef::new(1));
        table.insert(a, b, EdgeRef::new(2));

        assert_eq!(table.find(a, b), Some(EdgeRef::new(1)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_reset_clears_entries() {
        let mut table = EdgeTable::new();
        table.reset(4);
        table.insert(VertexRef::new(0), VertexRef::new(1), EdgeRef::new(0));

        table.reset(4);
        assert!(table.is_empty());
        assert_eq!(table.find(VertexRef::new(0), VertexRef::new(1)), None);
    }
}
