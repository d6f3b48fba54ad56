//! The segregated free-list registry: 46 bins, each an intrusive circular
//! doubly-linked list of free chunks threaded through their own payload area.
//!
//! Bin `i` holds free chunks whose size falls in `(bound[i - 1], bound[i]]`
//! (bin 0's lower bound is `MIN_CHUNK_SIZE - 1`). The schedule below is a
//! fixed table: 8-byte strides up to 128, widening strides up to 1024, then
//! powers of two up to 512 KiB, with the last bin unbounded.

use crate::chunk::{ChunkPtr, MIN_CHUNK_SIZE};
use crate::llist::LlistNode;

pub(crate) const NUM_BINS: usize = 46;

const fn build_bounds() -> [u64; NUM_BINS] {
    let mut bounds = [0u64; NUM_BINS];
    let mut i = 0;

    // indices 0..=11: stride 8, 40..=128
    let mut v = MIN_CHUNK_SIZE as u64;
    while v <= 128 {
        bounds[i] = v;
        i += 1;
        v += 8;
    }

    // indices 12..=19: stride 16, 144..=256
    v = 144;
    while v <= 256 {
        bounds[i] = v;
        i += 1;
        v += 16;
    }

    // indices 20..=27: stride 32, 288..=512
    v = 288;
    while v <= 512 {
        bounds[i] = v;
        i += 1;
        v += 32;
    }

    // indices 28..=35: stride 64, 576..=1024
    v = 576;
    while v <= 1024 {
        bounds[i] = v;
        i += 1;
        v += 64;
    }

    // indices 36..=44: powers of two, 2048..=524288
    v = 2048;
    while v <= 524288 {
        bounds[i] = v;
        i += 1;
        v *= 2;
    }

    // index 45: unbounded
    bounds[i] = u64::MAX;
    i += 1;

    debug_assert!(i == NUM_BINS);
    bounds
}

static BOUNDS: [u64; NUM_BINS] = build_bounds();

/// The bin index whose range contains `size`.
///
/// Linear scan: the table is tiny (46 entries) and this is called on every
/// allocation and release, so a predictable branch-free-ish scan beats the
/// bookkeeping of a binary search at this scale.
#[inline]
pub(crate) fn bin_of(size: usize) -> usize {
    debug_assert!(size >= MIN_CHUNK_SIZE);
    let size = size as u64;
    for (i, &bound) in BOUNDS.iter().enumerate() {
        if size <= bound {
            return i;
        }
    }
    NUM_BINS - 1
}

/// One bin's sentinel node. Free chunks are threaded via an `LlistNode`
/// embedded at their payload offset; `sentinel` is never itself a chunk.
pub(crate) struct Bin {
    sentinel: LlistNode,
}

impl Bin {
    /// # Safety
    /// `self` must be a stable address for the lifetime of the registry: the
    /// sentinel is self-referential until chunks are linked in.
    pub unsafe fn init(&mut self) {
        LlistNode::new(&mut self.sentinel);
    }

    /// Link `chunk` into this bin, ordered after any existing chunks of the
    /// same size (so repeated same-size churn doesn't reorder unrelated nodes).
    pub unsafe fn insert(&mut self, chunk: ChunkPtr, size: usize) {
        let sentinel = &mut self.sentinel as *mut LlistNode;
        let node = chunk.payload().cast::<LlistNode>();

        let mut cursor = (*sentinel).next;
        while cursor != sentinel {
            let cursor_chunk = ChunkPtr::from_payload(cursor.cast());
            if cursor_chunk.size() > size {
                break;
            }
            cursor = (*cursor).next;
        }

        LlistNode::insert(node, (*cursor).prev, cursor);
    }

    /// Pop the first chunk in the bin that is at least `min_size`, if any.
    pub unsafe fn take_at_least(&mut self, min_size: usize) -> Option<ChunkPtr> {
        let sentinel = &mut self.sentinel as *mut LlistNode;
        let mut cursor = (*sentinel).next;
        while cursor != sentinel {
            let chunk = ChunkPtr::from_payload(cursor.cast());
            if chunk.size() >= min_size {
                LlistNode::remove(cursor);
                return Some(chunk);
            }
            cursor = (*cursor).next;
        }
        None
    }
}

/// Remove `chunk` (known to be linked into whichever bin currently holds it)
/// from its free list. O(1): the intrusive list doesn't need the bin index.
#[inline]
pub(crate) unsafe fn unlink(chunk: ChunkPtr) {
    let node = chunk.payload().cast::<LlistNode>();
    LlistNode::remove(node);
}

/// The registry: one `Bin` per size class.
pub(crate) struct Registry {
    bins: [Bin; NUM_BINS],
}

impl Registry {
    /// # Safety
    /// `self` must not be moved after `init` is called.
    pub unsafe fn init(registry: *mut Self) {
        for i in 0..NUM_BINS {
            let bin = core::ptr::addr_of_mut!((*registry).bins[i]);
            (*bin).init();
        }
    }

    pub unsafe fn insert(&mut self, chunk: ChunkPtr, size: usize) {
        let i = bin_of(size);
        self.bins[i].insert(chunk, size);
    }

    /// Find a free chunk of at least `size`, scanning upward from `size`'s
    /// bin through larger bins until one yields a fit or the table is exhausted.
    pub unsafe fn find_fit(&mut self, size: usize) -> Option<ChunkPtr> {
        let start = bin_of(size);
        for i in start..NUM_BINS {
            if let Some(chunk) = self.bins[i].take_at_least(size) {
                return Some(chunk);
            }
        }
        None
    }
}
