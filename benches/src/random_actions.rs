//! A hand-rolled timing harness exercising random allocate/release workloads.
//!
//! Usage: cargo run -p benches --bin random_actions --release -- [--iters N] [--max-size N]

use std::time::Instant;

const DEFAULT_ITERS: usize = 200_000;
const DEFAULT_MAX_SIZE: usize = 4096;

fn main() {
    let mut iters = DEFAULT_ITERS;
    let mut max_size = DEFAULT_MAX_SIZE;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--iters" => {
                iters = args.next().and_then(|a| a.parse().ok()).expect("expected number after --iters")
            }
            "--max-size" => {
                max_size =
                    args.next().and_then(|a| a.parse().ok()).expect("expected number after --max-size")
            }
            "--help" => {
                println!(
                    "Random actions benchmark\n\nUsage: cargo run -p benches --bin random_actions --release -- [--iters N] [--max-size N]"
                );
                return;
            }
            arg => panic!("unrecognized argument '{arg}'"),
        }
    }

    let mut live: Vec<*mut u8> = Vec::new();
    let start = Instant::now();

    for _ in 0..iters {
        if live.is_empty() || fastrand::f32() < 0.6 {
            let size = fastrand::usize(1..=max_size);
            let ptr = unsafe { segalloc::allocate(size) }.expect("allocation failed");
            live.push(ptr);
        } else {
            let idx = fastrand::usize(0..live.len());
            let ptr = live.swap_remove(idx);
            unsafe { segalloc::release(ptr) };
        }
    }

    for ptr in live {
        unsafe { segalloc::release(ptr) };
    }

    let elapsed = start.elapsed();
    println!(
        "{iters} actions (max size {max_size}B) in {elapsed:?} ({:.1} ns/action)",
        elapsed.as_nanos() as f64 / iters as f64
    );
}
