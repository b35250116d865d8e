//! The fixed-partition block allocator.
//!
//! Message buffers for the MAC and NWK layers come out of a small arena split
//! into partitions of fixed block sizes. Allocation is smallest-fit over the
//! partitions, sorted ascending by block size at registration; freeing
//! locates the owning partition by address-range containment. There is no
//! coalescing or splitting, so both operations run in bounded time.
//!
//! Allocation failure is a normal, handled outcome: every caller in the
//! protocol core treats `None` as a reportable error, not a fault.

use core::cell::{RefCell, UnsafeCell};
use core::ops::{Deref, DerefMut};

use critical_section::Mutex;

/// The size of the arena backing the pool, in octets.
pub const ARENA_SIZE: usize = 2048;

/// The maximum number of partitions that can be registered.
pub const MAX_PARTITIONS: usize = 4;

/// Sentinel terminating a partition free list.
const FREE_LIST_END: u16 = 0xffff;

/// An invalid pool layout was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutError;

#[derive(Clone, Copy)]
struct Partition {
    block_size: u16,
    block_count: u16,
    start: u16,
    free_head: u16,
    free_count: u16,
}

impl Partition {
    fn end(&self) -> usize {
        self.start as usize + self.block_size as usize * self.block_count as usize
    }

    fn contains(&self, offset: usize) -> bool {
        offset >= self.start as usize && offset < self.end()
    }
}

struct PoolState {
    partitions: heapless::Vec<Partition, MAX_PARTITIONS>,
}

/// A fixed-partition block allocator over a static arena.
///
/// The free list of each partition is threaded through the first two octets
/// of the free blocks themselves, so the pool carries no per-block
/// bookkeeping outside the arena.
pub struct BufferPool {
    arena: UnsafeCell<[u8; ARENA_SIZE]>,
    state: Mutex<RefCell<PoolState>>,
}

// Safety: the partition bookkeeping (and the free-list links stored inside
// free blocks) is only touched within critical sections, and the payload of
// an allocated block is only reachable through the unique `Buffer` that owns
// it.
unsafe impl Sync for BufferPool {}

impl BufferPool {
    /// Create a new pool from `(block_size, block_count)` partitions.
    ///
    /// Partitions are sorted ascending by block size. The layout must fit in
    /// [`ARENA_SIZE`] octets and use block sizes of at least two octets (the
    /// free-list link lives inside free blocks).
    pub fn new(layout: &[(usize, usize)]) -> Result<Self, LayoutError> {
        if layout.is_empty() || layout.len() > MAX_PARTITIONS {
            return Err(LayoutError);
        }

        let mut partitions: heapless::Vec<Partition, MAX_PARTITIONS> = heapless::Vec::new();

        for &(block_size, block_count) in layout {
            if block_size < 2 || block_size > u16::MAX as usize || block_count == 0 {
                return Err(LayoutError);
            }

            let partition = Partition {
                block_size: block_size as u16,
                block_count: block_count as u16,
                start: 0,
                free_head: FREE_LIST_END,
                free_count: block_count as u16,
            };

            // The length was checked above.
            let _ = partitions.push(partition);
        }

        partitions.sort_unstable_by_key(|p| p.block_size);

        let total: usize = partitions
            .iter()
            .map(|p| p.block_size as usize * p.block_count as usize)
            .sum();
        if total > ARENA_SIZE {
            return Err(LayoutError);
        }

        let mut arena = [0u8; ARENA_SIZE];
        let mut offset = 0usize;

        for partition in partitions.iter_mut() {
            partition.start = offset as u16;

            // Link every block onto the free list, last block first, so
            // allocation hands the blocks out in address order.
            let mut head = FREE_LIST_END;
            for block in (0..partition.block_count as usize).rev() {
                let block_offset = offset + block * partition.block_size as usize;
                arena[block_offset..block_offset + 2].copy_from_slice(&head.to_le_bytes());
                head = block_offset as u16;
            }
            partition.free_head = head;

            offset += partition.block_size as usize * partition.block_count as usize;
        }

        Ok(Self {
            arena: UnsafeCell::new(arena),
            state: Mutex::new(RefCell::new(PoolState { partitions })),
        })
    }

    /// Allocate a block of at least `len` octets.
    ///
    /// Scans the partitions for the first one whose block size can hold
    /// `len` and whose free list is not empty. The returned [`Buffer`] has
    /// length `len` and is freed on drop.
    pub fn alloc(&self, len: usize) -> Option<Buffer<'_>> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);

            let partition = state
                .partitions
                .iter_mut()
                .find(|p| p.block_size as usize >= len && p.free_head != FREE_LIST_END)?;

            let offset = partition.free_head as usize;

            // Safety: the head of a free list is a free block; no `Buffer`
            // aliases it and we hold the critical section.
            let next = unsafe {
                let arena = &*self.arena.get();
                u16::from_le_bytes([arena[offset], arena[offset + 1]])
            };

            partition.free_head = next;
            partition.free_count -= 1;

            Some(Buffer {
                pool: self,
                offset,
                capacity: partition.block_size as usize,
                len,
            })
        })
    }

    /// Return a block to its owning partition.
    ///
    /// The partition is located by address-range containment. An offset
    /// outside every partition, not on a block boundary, or belonging to a
    /// partition whose free list is already full is ignored: the free lists
    /// are never corrupted by a stray free.
    fn release(&self, offset: usize) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);

            let Some(partition) = state.partitions.iter_mut().find(|p| p.contains(offset)) else {
                return;
            };

            if (offset - partition.start as usize) % partition.block_size as usize != 0 {
                return;
            }

            if partition.free_count >= partition.block_count {
                return;
            }

            // Safety: the block being released is no longer reachable through
            // any `Buffer` and we hold the critical section.
            unsafe {
                let arena = &mut *self.arena.get();
                arena[offset..offset + 2].copy_from_slice(&partition.free_head.to_le_bytes());
            }

            partition.free_head = offset as u16;
            partition.free_count += 1;
        });
    }

    /// Return the number of free blocks in the partition at `index`
    /// (partitions are sorted ascending by block size).
    pub fn free_block_count(&self, index: usize) -> Option<usize> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            state.partitions.get(index).map(|p| p.free_count as usize)
        })
    }

    /// Return the number of blocks in the partition at `index`.
    pub fn block_count(&self, index: usize) -> Option<usize> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            state.partitions.get(index).map(|p| p.block_count as usize)
        })
    }
}

/// An owning handle to an allocated block.
///
/// Dereferences to its `len` octets; the block is returned to its partition
/// exactly once, when the handle is dropped.
pub struct Buffer<'p> {
    pool: &'p BufferPool,
    offset: usize,
    capacity: usize,
    len: usize,
}

impl Buffer<'_> {
    /// Return the capacity of the underlying block.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrink the buffer to `len` octets.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }
}

impl Deref for Buffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // Safety: the block is uniquely owned by this handle; the pool only
        // writes into free blocks.
        unsafe {
            core::slice::from_raw_parts((self.pool.arena.get() as *const u8).add(self.offset), self.len)
        }
    }
}

impl DerefMut for Buffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // Safety: as above, plus exclusive access through `&mut self`.
        unsafe {
            core::slice::from_raw_parts_mut((self.pool.arena.get() as *mut u8).add(self.offset), self.len)
        }
    }
}

impl Drop for Buffer<'_> {
    fn drop(&mut self) {
        self.pool.release(self.offset);
    }
}

impl core::fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Buffer")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> BufferPool {
        BufferPool::new(&[(16, 4), (64, 2), (128, 2)]).unwrap()
    }

    #[test]
    fn smallest_fit_allocation() {
        let pool = pool();

        let small = pool.alloc(10).unwrap();
        assert_eq!(small.capacity(), 16);
        assert_eq!(small.len(), 10);

        let medium = pool.alloc(17).unwrap();
        assert_eq!(medium.capacity(), 64);

        let large = pool.alloc(100).unwrap();
        assert_eq!(large.capacity(), 128);

        assert_eq!(pool.free_block_count(0), Some(3));
        assert_eq!(pool.free_block_count(1), Some(1));
        assert_eq!(pool.free_block_count(2), Some(1));
    }

    #[test]
    fn exhausted_partition_falls_through() {
        let pool = pool();

        let _a = pool.alloc(16).unwrap();
        let _b = pool.alloc(16).unwrap();
        let _c = pool.alloc(16).unwrap();
        let _d = pool.alloc(16).unwrap();

        // The small partition is empty; the next fit is used instead.
        let e = pool.alloc(16).unwrap();
        assert_eq!(e.capacity(), 64);
    }

    #[test]
    fn alloc_too_large_fails() {
        let pool = pool();
        assert!(pool.alloc(129).is_none());
    }

    #[test]
    fn free_restores_counts() {
        let pool = pool();

        {
            let _a = pool.alloc(8).unwrap();
            let _b = pool.alloc(8).unwrap();
            let _c = pool.alloc(60).unwrap();
            assert_eq!(pool.free_block_count(0), Some(2));
            assert_eq!(pool.free_block_count(1), Some(1));
        }

        assert_eq!(pool.free_block_count(0), Some(4));
        assert_eq!(pool.free_block_count(1), Some(2));
        assert_eq!(pool.free_block_count(2), Some(2));

        // Blocks remain allocatable after churn.
        for _ in 0..3 {
            let buffers: std::vec::Vec<_> = (0..4).map(|_| pool.alloc(16).unwrap()).collect();
            drop(buffers);
            assert_eq!(
                pool.free_block_count(0).unwrap(),
                pool.block_count(0).unwrap()
            );
        }
    }

    #[test]
    fn foreign_and_stray_frees_are_ignored() {
        let pool = pool();

        // Outside every partition.
        pool.release(ARENA_SIZE + 10);
        // Not on a block boundary.
        pool.release(3);
        // Partition already full.
        pool.release(0);
        pool.release(16);

        assert_eq!(pool.free_block_count(0), Some(4));

        // The free list still works.
        let a = pool.alloc(16).unwrap();
        let b = pool.alloc(16).unwrap();
        drop(a);
        drop(b);
        assert_eq!(pool.free_block_count(0), Some(4));
    }

    #[test]
    fn buffer_data_roundtrip() {
        let pool = pool();

        let mut buffer = pool.alloc(4).unwrap();
        buffer.copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(&buffer[..], &[1, 2, 3, 4]);

        buffer.truncate(2);
        assert_eq!(&buffer[..], &[1, 2]);
    }

    #[test]
    fn invalid_layouts_rejected() {
        assert!(BufferPool::new(&[]).is_err());
        assert!(BufferPool::new(&[(1, 4)]).is_err());
        assert!(BufferPool::new(&[(16, 0)]).is_err());
        assert!(BufferPool::new(&[(1024, 3)]).is_err());
        // Fits per partition, overflows in total.
        assert!(BufferPool::new(&[(16, 4), (1024, 2)]).is_err());
    }
}
