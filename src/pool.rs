//! Page-based block pool.
//!
//! The smoothing passes allocate vertices, half-edges and triangles many
//! times per second, once per tracked hull. A [`Pool`] keeps that off the
//! global allocator: blocks come from fixed-size pages threaded onto an
//! intrusive free list, `allocate`/`deallocate` are O(1), and [`Pool::reset`]
//! returns every block at once while keeping the pages for the next call.
//!
//! Blocks are addressed by `u32` handles rather than pointers. Pages are
//! append-only boxed slices, so a handle stays valid for the lifetime of the
//! pool no matter how much it grows afterwards; the half-edge graph relies
//! on this while it holds long-lived cross-references into pool storage.

use crate::error::{HullError, Result};

/// Sentinel for "no slot" in the free list.
const NONE: u32 = u32::MAX;

/// Default number of blocks per page.
pub const DEFAULT_PAGE_SIZE: usize = 256;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    next_free: u32,
}

/// A fixed-page arena with an intrusive free list.
///
/// Allocated blocks hold a stale `T` value from their previous life; the
/// owner is expected to overwrite every field after [`Pool::allocate`].
#[derive(Debug)]
pub struct Pool<T> {
    pages: Vec<Box<[Slot<T>]>>,
    page_size: usize,
    free_head: u32,
    free_count: usize,
}

impl<T: Default> Pool<T> {
    /// Create an empty pool with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty pool with the given blocks-per-page count.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "pool page size must be non-zero");
        Self {
            pages: Vec::new(),
            page_size,
            free_head: NONE,
            free_count: 0,
        }
    }

    /// Total number of blocks across all pages.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.page_size
    }

    /// Number of blocks currently on the free list.
    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_count
    }

    /// Grow capacity until at least `blocks` blocks are free.
    ///
    /// Reserving ahead of a pass avoids page growth in the middle of it.
    /// Allocation failure is surfaced as [`HullError::OutOfMemory`].
    pub fn reserve(&mut self, blocks: usize) -> Result<()> {
        while self.free_count < blocks {
            self.add_page()?;
        }
        Ok(())
    }

    /// Take a block from the free list, growing by one page if it is empty.
    pub fn allocate(&mut self) -> Result<u32> {
        if self.free_head == NONE {
            self.add_page()?;
        }
        let handle = self.free_head;
        self.free_head = self.slot(handle).next_free;
        self.free_count -= 1;
        Ok(handle)
    }

    /// Return a single block to the free list.
    pub fn deallocate(&mut self, handle: u32) {
        let head = self.free_head;
        self.slot_mut(handle).next_free = head;
        self.free_head = handle;
        self.free_count += 1;
    }

    /// Return every block to the free list without releasing any page.
    ///
    /// After a reset, `allocate` hands out handles in ascending order again,
    /// which keeps repeated runs over the same input deterministic.
    pub fn reset(&mut self) {
        let total = self.capacity();
        for (page_index, page) in self.pages.iter_mut().enumerate() {
            for (i, slot) in page.iter_mut().enumerate() {
                let global = page_index * self.page_size + i;
                slot.next_free = if global + 1 < total {
                    (global + 1) as u32
                } else {
                    NONE
                };
            }
        }
        self.free_head = if total > 0 { 0 } else { NONE };
        self.free_count = total;
    }

    /// Borrow the block behind a handle.
    #[inline]
    pub fn get(&self, handle: u32) -> &T {
        &self.slot(handle).value
    }

    /// Mutably borrow the block behind a handle.
    #[inline]
    pub fn get_mut(&mut self, handle: u32) -> &mut T {
        &mut self.slot_mut(handle).value
    }

    #[inline]
    fn slot(&self, handle: u32) -> &Slot<T> {
        let h = handle as usize;
        &self.pages[h / self.page_size][h % self.page_size]
    }

    #[inline]
    fn slot_mut(&mut self, handle: u32) -> &mut Slot<T> {
        let h = handle as usize;
        &mut self.pages[h / self.page_size][h % self.page_size]
    }

    fn add_page(&mut self) -> Result<()> {
        let base = self.capacity();
        if base + self.page_size >= NONE as usize {
            return Err(HullError::OutOfMemory {
                what: "pool handle space",
            });
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(self.page_size)
            .map_err(|_| HullError::OutOfMemory { what: "pool page" })?;
        for i in 0..self.page_size {
            // New pages are pushed onto the front of the free list.
            let next = if i + 1 < self.page_size {
                (base + i + 1) as u32
            } else {
                self.free_head
            };
            slots.push(Slot {
                value: T::default(),
                next_free: next,
            });
        }

        self.pages.push(slots.into_boxed_slice());
        self.free_head = base as u32;
        self.free_count += self.page_size;
        Ok(())
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential_after_reset() {
        let mut pool: Pool<u64> = Pool::with_page_size(4);
        pool.reserve(4).unwrap();
        pool.reset();

        for expected in 0..4u32 {
            assert_eq!(pool.allocate().unwrap(), expected);
        }
    }

    #[test]
    fn test_deallocate_reuses_block() {
        let mut pool: Pool<u64> = Pool::with_page_size(4);
        let a = pool.allocate().unwrap();
        let _b = pool.allocate().unwrap();

        pool.deallocate(a);
        assert_eq!(pool.allocate().unwrap(), a);
    }

    #[test]
    fn test_reset_retains_capacity() {
        let mut pool: Pool<u64> = Pool::with_page_size(8);
        pool.reserve(20).unwrap();
        let capacity = pool.capacity();
        assert!(capacity >= 20);

        for _ in 0..20 {
            pool.allocate().unwrap();
        }
        pool.reset();

        assert_eq!(pool.capacity(), capacity);
        assert_eq!(pool.free_blocks(), capacity);
    }

    #[test]
    fn test_handles_stable_across_growth() {
        let mut pool: Pool<u64> = Pool::with_page_size(2);
        let a = pool.allocate().unwrap();
        *pool.get_mut(a) = 42;

        // Force several page additions.
        for _ in 0..10 {
            pool.allocate().unwrap();
        }

        assert_eq!(*pool.get(a), 42);
    }

    #[test]
    fn test_reserve_is_idempotent_when_satisfied() {
        let mut pool: Pool<u64> = Pool::with_page_size(8);
        pool.reserve(8).unwrap();
        let capacity = pool.capacity();
        pool.reserve(4).unwrap();
        assert_eq!(pool.capacity(), capacity);
    }
}
