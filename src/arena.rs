//! The OS arena source: acquires regions from the operating system via a
//! single anonymous, private, read-write `mmap` call per region. Regions are
//! never returned to the OS.

use crate::chunk::ChunkPtr;

const PAGE_SIZE: usize = 4096;
const MIN_REGION_SIZE: usize = 32 * PAGE_SIZE;

/// Round `request` up to the region size the arena source will actually
/// acquire for a request of that many bytes: `MIN_REGION_SIZE` at minimum,
/// otherwise the smallest whole-page count exceeding `request` by one page.
pub(crate) fn region_size_for(request: usize) -> usize {
    if request <= MIN_REGION_SIZE {
        return MIN_REGION_SIZE;
    }

    let pages = (request + PAGE_SIZE - 1) / PAGE_SIZE + 1;
    pages * PAGE_SIZE
}

/// A freshly mapped region, not yet handed to the registry.
pub(crate) struct Region {
    pub chunk: ChunkPtr,
    pub size: usize,
}

/// Map a new region able to satisfy a request of at least `request` bytes.
///
/// The region is initialized as a single chunk spanning its whole usable
/// span, bounded by zero sentinel words at both ends (no preceding or
/// following neighbor). Returns `None` on `mmap` failure.
pub(crate) unsafe fn acquire(request: usize) -> Option<Region> {
    let region_size = region_size_for(request);

    let addr = libc::mmap(
        core::ptr::null_mut(),
        region_size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
        -1,
        0,
    );

    if addr == libc::MAP_FAILED {
        #[cfg(debug_assertions)]
        eprintln!("segalloc: mmap failed for region of {region_size} bytes");
        return None;
    }

    let chunk = ChunkPtr(addr.cast());
    chunk.set_size(region_size);
    chunk.clear_prev_view();
    chunk.clear_next_view(region_size);

    Some(Region { chunk, size: region_size })
}
