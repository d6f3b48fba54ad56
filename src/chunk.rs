//! Chunk encoding: the boundary-tag layout shared by every chunk in every region.
//!
//! A chunk of size `S` (`S >= MIN_CHUNK_SIZE`, `S` a multiple of `WORD_SIZE`) is laid
//! out as three metadata words around a payload/linkage area:
//!
//! ```text
//! offset 0        : leading word  -- preceding neighbor's (size, in-use) view, 0 if none
//! offset 8        : own size      -- this chunk's size, no flag
//! offset 16..S-8  : payload / free-list linkage
//! offset S-8      : trailing word -- following neighbor's (size, in-use) view, 0 if none
//! ```
//!
//! The leading and trailing words are *not* self-descriptive: they are written by
//! whichever neighbor currently borders this chunk, and must be kept in sync by
//! the boundary manager whenever a chunk's size or in-use status changes. This
//! lets existence and in-use tests for either neighbor happen with a single read,
//! with no need to dereference the neighbor itself.

use core::mem::size_of;

pub(crate) const WORD_SIZE: usize = size_of::<u64>();
pub(crate) const OVERHEAD: usize = 3 * WORD_SIZE;
pub(crate) const MIN_CHUNK_SIZE: usize = 40;
pub(crate) const PAYLOAD_OFFSET: usize = 2 * WORD_SIZE;

const USED_FLAG: u64 = 1 << 63;
const SIZE_MASK: u64 = !USED_FLAG;

#[inline]
pub(crate) fn pack(size: usize, used: bool) -> u64 {
    debug_assert!(size as u64 & USED_FLAG == 0, "chunk size exceeds 63 bits");
    size as u64 | if used { USED_FLAG } else { 0 }
}

#[inline]
pub(crate) fn unpack(word: u64) -> (usize, bool) {
    ((word & SIZE_MASK) as usize, word & USED_FLAG != 0)
}

/// A pointer to the base (leading word) of a chunk.
///
/// All methods are thin wrappers over raw reads/writes; none of them validate
/// that `self` actually points at a live chunk. Safety is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkPtr(pub *mut u8);

impl ChunkPtr {
    #[inline]
    pub unsafe fn from_payload(payload: *mut u8) -> Self {
        Self(payload.sub(PAYLOAD_OFFSET))
    }

    #[inline]
    pub unsafe fn payload(self) -> *mut u8 {
        self.0.add(PAYLOAD_OFFSET)
    }

    #[inline]
    unsafe fn leading_word(self) -> *mut u64 {
        self.0.cast()
    }

    #[inline]
    unsafe fn own_size_word(self) -> *mut u64 {
        self.0.add(WORD_SIZE).cast()
    }

    #[inline]
    unsafe fn trailing_word(self, own_size: usize) -> *mut u64 {
        self.0.add(own_size - WORD_SIZE).cast()
    }

    /// This chunk's own size, as recorded at offset 8.
    #[inline]
    pub unsafe fn size(self) -> usize {
        self.own_size_word().read() as usize
    }

    #[inline]
    pub unsafe fn set_size(self, size: usize) {
        debug_assert!(size >= MIN_CHUNK_SIZE && size % WORD_SIZE == 0);
        self.own_size_word().write(size as u64);
    }

    /// The `(size, used)` view this chunk holds of its preceding neighbor.
    #[inline]
    pub unsafe fn prev_view(self) -> (usize, bool) {
        unpack(self.leading_word().read())
    }

    #[inline]
    pub unsafe fn set_prev_view(self, size: usize, used: bool) {
        self.leading_word().write(pack(size, used));
    }

    #[inline]
    pub unsafe fn clear_prev_view(self) {
        self.leading_word().write(0);
    }

    #[inline]
    pub unsafe fn has_prev(self) -> bool {
        self.leading_word().read() != 0
    }

    /// The address of the preceding chunk, derived from this chunk's leading word.
    ///
    /// Only meaningful when `has_prev` is true.
    #[inline]
    pub unsafe fn prev_ptr(self) -> ChunkPtr {
        let (size, _) = self.prev_view();
        ChunkPtr(self.0.sub(size))
    }

    /// The `(size, used)` view this chunk holds of its following neighbor.
    ///
    /// Requires the chunk's own size, since the trailing word sits at `own_size - 8`.
    #[inline]
    pub unsafe fn next_view(self, own_size: usize) -> (usize, bool) {
        unpack(self.trailing_word(own_size).read())
    }

    #[inline]
    pub unsafe fn set_next_view(self, own_size: usize, size: usize, used: bool) {
        self.trailing_word(own_size).write(pack(size, used));
    }

    #[inline]
    pub unsafe fn clear_next_view(self, own_size: usize) {
        self.trailing_word(own_size).write(0);
    }

    #[inline]
    pub unsafe fn has_next(self, own_size: usize) -> bool {
        self.trailing_word(own_size).read() != 0
    }

    /// The address of the following chunk, derived from this chunk's own size.
    ///
    /// Only meaningful when `has_next` is true.
    #[inline]
    pub unsafe fn next_ptr(self, own_size: usize) -> ChunkPtr {
        ChunkPtr(self.0.add(own_size))
    }
}
