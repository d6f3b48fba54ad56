#![no_main]

use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Action {
    /// Allocate `size` bytes.
    Alloc { size: u16 },
    /// Release the `index`th live allocation, if any.
    Dealloc { index: u8 },
}
use Action::*;

fuzz_target!(|actions: Vec<Action>| {
    let mut live: Vec<(*mut u8, usize)> = Vec::new();

    for action in actions {
        match action {
            Alloc { size } => {
                let size = size as usize;
                if let Ok(ptr) = unsafe { segalloc::allocate(size) } {
                    unsafe { ptr.write_bytes(0xab, size) };
                    live.push((ptr, size));
                }
            }
            Dealloc { index } => {
                if (index as usize) >= live.len() {
                    continue;
                }
                let (ptr, _) = live.swap_remove(index as usize);
                unsafe { segalloc::release(ptr) };
            }
        }
    }

    for (ptr, _) in live {
        unsafe { segalloc::release(ptr) };
    }
});
