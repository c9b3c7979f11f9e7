//! Counting global allocator with windowed usage tracking
//!
//! `TracingAllocator` wraps the system allocator and keeps a running
//! total of live heap bytes plus a resettable high-water mark, so a
//! caller can attribute allocation to a specific span of execution
//! rather than reading whole-process resident memory.
//!
//! The binary opts in with:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: TracingAllocator = TracingAllocator;
//! ```
//!
//! Without that attribute the counters stay at zero and window reads
//! report zero bytes, which keeps library tests independent of the
//! allocator being installed.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::sampler::AllocationTracer;

/// Live traced bytes across the whole process
static ALLOCATED: AtomicUsize = AtomicUsize::new(0);

/// Live bytes at the moment the current window opened
static WINDOW_BASE: AtomicUsize = AtomicUsize::new(0);

/// High-water mark of live bytes since the current window opened
static WINDOW_PEAK: AtomicUsize = AtomicUsize::new(0);

/// System allocator wrapper that counts live bytes
pub struct TracingAllocator;

// SAFETY: delegates all allocation to `System`; only the byte
// accounting is added, and it never touches the returned memory.
unsafe impl GlobalAlloc for TracingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            let live = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
            WINDOW_PEAK.fetch_max(live, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
    }
}

/// Tracer over the process-wide counting allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapTracer;

impl AllocationTracer for HeapTracer {
    fn begin_window(&mut self) {
        let live = ALLOCATED.load(Ordering::Relaxed);
        WINDOW_BASE.store(live, Ordering::Relaxed);
        WINDOW_PEAK.store(live, Ordering::Relaxed);
    }

    fn window_usage(&mut self) -> (u64, u64) {
        let base = WINDOW_BASE.load(Ordering::Relaxed);
        let current = ALLOCATED.load(Ordering::Relaxed).saturating_sub(base);
        let peak = WINDOW_PEAK.load(Ordering::Relaxed).saturating_sub(base);
        (current as u64, peak as u64)
    }
}
