//! The boundary manager: splitting a free chunk on allocation and coalescing
//! free neighbors on release, keeping the redundant leading/trailing views
//! on both sides of every boundary in sync.

use crate::chunk::{ChunkPtr, MIN_CHUNK_SIZE};

/// Cleave `used_size` bytes off the front of a free chunk of `total_size`
/// bytes, if the remainder would still be a valid chunk. Returns the
/// remainder's size if a split happened, or `None` if `chunk` is handed out
/// whole.
///
/// `chunk` is assumed not yet linked into any free list.
pub(crate) unsafe fn split(chunk: ChunkPtr, total_size: usize, used_size: usize) -> Option<usize> {
    debug_assert!(used_size <= total_size);
    let remainder_size = total_size - used_size;

    if remainder_size < MIN_CHUNK_SIZE {
        // Handed out whole: mark in-use and tell both neighbors about it.
        if chunk.has_prev() {
            let prev = chunk.prev_ptr();
            let prev_size = prev.size();
            prev.set_next_view(prev_size, total_size, true);
        }
        if chunk.has_next(total_size) {
            let next = chunk.next_ptr(total_size);
            next.set_prev_view(total_size, true);
        }
        return None;
    }

    let rest = chunk.next_ptr(used_size);

    // The remainder inherits chunk's old following-neighbor view verbatim:
    // its identity and size haven't changed, only who claims to border it.
    let (old_next_size, old_next_used) = chunk.next_view(total_size);
    rest.set_size(remainder_size);
    rest.set_next_view(remainder_size, old_next_size, old_next_used);
    if chunk.has_next(total_size) {
        let old_next = chunk.next_ptr(total_size);
        old_next.set_prev_view(remainder_size, false);
    }

    chunk.set_size(used_size);
    chunk.set_next_view(used_size, remainder_size, false);
    rest.set_prev_view(used_size, true);
    if chunk.has_prev() {
        let prev = chunk.prev_ptr();
        let prev_size = prev.size();
        prev.set_next_view(prev_size, used_size, true);
    }

    Some(remainder_size)
}

/// Mark `chunk` (size `size`) free, and tell both neighbors.
pub(crate) unsafe fn mark_free(chunk: ChunkPtr, size: usize) {
    if chunk.has_prev() {
        let prev = chunk.prev_ptr();
        let prev_size = prev.size();
        prev.set_next_view(prev_size, size, false);
    }
    if chunk.has_next(size) {
        let next = chunk.next_ptr(size);
        next.set_prev_view(size, false);
    }
}

/// A chunk ready for the free-list registry: its base address and size,
/// after any coalescing with free neighbors has already happened.
pub(crate) struct Coalesced {
    pub chunk: ChunkPtr,
    pub size: usize,
}

/// Merge `chunk` (already marked free, of `size` bytes) with whichever of its
/// immediate neighbors are also free. Neighbors that coalesce are assumed to
/// already be unlinked from their free lists by the caller before this runs,
/// since this function only has size information, not bin membership.
pub(crate) unsafe fn coalesce(mut chunk: ChunkPtr, mut size: usize) -> Coalesced {
    if chunk.has_prev() {
        let (prev_size, prev_used) = chunk.prev_view();
        if !prev_used {
            let prev = chunk.prev_ptr();
            let merged_size = prev_size + size;

            // the merged chunk's forward boundary is whatever `chunk` bordered
            let (next_size, next_used) = chunk.next_view(size);
            prev.set_size(merged_size);
            prev.set_next_view(merged_size, next_size, next_used);
            if chunk.has_next(size) {
                let next = chunk.next_ptr(size);
                next.set_prev_view(merged_size, false);
            }

            chunk = prev;
            size = merged_size;
        }
    }

    if chunk.has_next(size) {
        let (next_size, next_used) = chunk.next_view(size);
        if !next_used {
            let next = chunk.next_ptr(size);
            let merged_size = size + next_size;

            let (after_size, after_used) = next.next_view(next_size);
            chunk.set_size(merged_size);
            chunk.set_next_view(merged_size, after_size, after_used);
            if next.has_next(next_size) {
                let after = next.next_ptr(next_size);
                after.set_prev_view(merged_size, false);
            }

            size = merged_size;
        }
    }

    Coalesced { chunk, size }
}
