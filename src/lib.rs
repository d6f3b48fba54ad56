//! A segregated free-list allocator for POSIX-like targets.
//!
//! Two operations are exposed: [`allocate`] and [`release`], matching the
//! shape of C's `malloc`/`free`. Memory is acquired from the OS in large
//! regions via `mmap` and carved into chunks bounded by redundant
//! leading/trailing size words (see [`chunk`]), kept in a 46-bin segregated
//! free-list registry (see [`bins`]), with splitting and coalescing handled
//! by the boundary manager (see [`boundary`]).
//!
//! This allocator is single-threaded: there is no locking anywhere, and
//! calling [`allocate`] or [`release`] concurrently from more than one
//! thread is undefined behaviour. Memory is never returned to the OS, chunks
//! are never poisoned on free, and requested alignment beyond 8 bytes is not
//! supported.

mod arena;
mod bins;
mod boundary;
mod chunk;
mod error;
mod llist;

pub use error::OomError;

use bins::Registry;
use chunk::{ChunkPtr, MIN_CHUNK_SIZE, OVERHEAD, WORD_SIZE};
use core::mem::MaybeUninit;

struct Engine {
    registry: Registry,
}

impl Engine {
    /// # Safety
    /// `engine` must point at valid, properly aligned storage for `Engine`
    /// that will never subsequently be moved.
    unsafe fn init(engine: *mut Self) {
        let registry = core::ptr::addr_of_mut!((*engine).registry);
        Registry::init(registry);
    }
}

static mut ENGINE: MaybeUninit<Engine> = MaybeUninit::uninit();
static mut ENGINE_READY: bool = false;

/// Get the global engine, initializing it in place on first use.
///
/// Not thread-safe by design: see the crate-level docs.
unsafe fn engine() -> &'static mut Engine {
    if !ENGINE_READY {
        Engine::init(ENGINE.as_mut_ptr());
        ENGINE_READY = true;
    }
    ENGINE.assume_init_mut()
}

/// The chunk size needed to hold a `payload_size`-byte allocation: overhead
/// plus the payload, rounded up to a whole word, floored at the minimum
/// chunk size.
#[inline]
fn chunk_size_for(payload_size: usize) -> usize {
    let raw = payload_size + OVERHEAD;
    let rounded = (raw + (WORD_SIZE - 1)) & !(WORD_SIZE - 1);
    rounded.max(MIN_CHUNK_SIZE)
}

/// Allocate a block of memory able to hold at least `payload_size` bytes,
/// 8-byte aligned.
///
/// Returns [`OomError`] if no existing region has room and a new region
/// could not be mapped from the OS.
///
/// # Safety
/// Must not be called concurrently with any other call to [`allocate`] or
/// [`release`].
pub unsafe fn allocate(payload_size: usize) -> Result<*mut u8, OomError> {
    let need = chunk_size_for(payload_size);
    let eng = engine();

    if let Some(chunk) = eng.registry.find_fit(need) {
        let total = chunk.size();
        if let Some(rest_size) = boundary::split(chunk, total, need) {
            let rest = chunk.next_ptr(need);
            eng.registry.insert(rest, rest_size);
        }
        return Ok(chunk.payload());
    }

    let region = arena::acquire(need).ok_or(error::OomError)?;

    if let Some(rest_size) = boundary::split(region.chunk, region.size, need) {
        let rest = region.chunk.next_ptr(need);
        eng.registry.insert(rest, rest_size);
    }

    Ok(region.chunk.payload())
}

/// Release a block previously returned by [`allocate`].
///
/// # Safety
/// `ptr` must have been returned by a prior call to [`allocate`] and not
/// already released. Must not be called concurrently with any other call to
/// [`allocate`] or [`release`].
pub unsafe fn release(ptr: *mut u8) {
    let chunk = ChunkPtr::from_payload(ptr);
    let size = chunk.size();
    let eng = engine();

    boundary::mark_free(chunk, size);

    if chunk.has_prev() {
        let (_, prev_used) = chunk.prev_view();
        if !prev_used {
            bins::unlink(chunk.prev_ptr());
        }
    }
    if chunk.has_next(size) {
        let (_, next_used) = chunk.next_view(size);
        if !next_used {
            bins::unlink(chunk.next_ptr(size));
        }
    }

    let merged = boundary::coalesce(chunk, size);
    eng.registry.insert(merged.chunk, merged.size);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The engine is one process-wide static with no internal locking, by
    // design (see the crate docs). `cargo test` runs tests on separate
    // threads by default, so every test here serializes on this lock first
    // to avoid racing the shared engine against itself.
    static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn single_alloc_and_release_roundtrip() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let p = allocate(64).expect("allocation should succeed");
            assert!(!p.is_null());
            assert_eq!(p as usize % WORD_SIZE, 0);
            p.write_bytes(0xAB, 64);
            release(p);
        }
    }

    #[test]
    fn many_small_allocations_reuse_freed_space() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let mut ptrs = Vec::new();
            for _ in 0..256 {
                ptrs.push(allocate(32).unwrap());
            }
            for &p in &ptrs {
                release(p);
            }

            // a fresh run of the same size should fit into what was just freed
            // without requiring a new region; exercised indirectly by the
            // bin-reuse property, not asserted on region count here.
            for _ in 0..256 {
                let p = allocate(32).unwrap();
                release(p);
            }
        }
    }

    #[test]
    fn split_then_coalesce_restores_original_span() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            // Allocate, then immediately free: the freed chunk should be
            // available for a same-size request without growing the heap.
            let a = allocate(4000).unwrap();
            release(a);
            let b = allocate(4000).unwrap();
            assert_eq!(a, b, "freed chunk should be reused verbatim");
            release(b);
        }
    }

    #[test]
    fn adjacent_frees_coalesce_into_larger_chunk() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let a = allocate(256).unwrap();
            let b = allocate(256).unwrap();
            let c = allocate(256).unwrap();

            release(a);
            release(c);
            release(b); // merges a, b, c into one run

            // the merged span should now satisfy a request too big for any
            // one of the three original chunks alone.
            let d = allocate(700).unwrap();
            release(d);
        }
    }

    #[test]
    fn zero_size_allocation_succeeds_with_minimum_chunk() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let p = allocate(0).unwrap();
            release(p);
        }
    }

    #[test]
    fn large_allocation_triggers_fresh_region() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let p = allocate(1 << 20).unwrap();
            release(p);
        }
    }

    #[test]
    fn randomized_alloc_free_workload_stays_consistent() {
        let _guard = TEST_LOCK.lock().unwrap();
        unsafe {
            let mut live = Vec::new();
            for i in 0..2000 {
                if live.is_empty() || fastrand::bool() {
                    let size = fastrand::usize(1..=2048);
                    live.push((allocate(size).unwrap(), size));
                } else {
                    let idx = fastrand::usize(0..live.len());
                    let (p, _) = live.swap_remove(idx);
                    release(p);
                }
                let _ = i;
            }
            for (p, _) in live {
                release(p);
            }
        }
    }
}
