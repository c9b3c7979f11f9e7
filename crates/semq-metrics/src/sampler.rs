//! Resource sampler bracketing a single unit of work
//!
//! The sampler owns its probes as injected dependencies rather than
//! reaching for ambient process state, so tests can substitute a
//! deterministic fake (fixed wall time, scripted CPU deltas).

use std::future::Future;
use std::time::Instant;

use semq_core::ResourceSample;

use crate::alloc::HeapTracer;
use crate::probe::SysinfoProbe;

/// Source of wall-clock, CPU, core-count, and memory readings
pub trait ResourceProbe {
    /// Current wall-clock instant
    fn wall_now(&mut self) -> Instant;

    /// Cumulative user + system CPU time of the process, in seconds
    fn cpu_seconds(&mut self) -> f64;

    /// Logical core count used for CPU normalization
    fn logical_cores(&self) -> usize;

    /// Process resident memory as a percentage of system memory
    fn process_memory_percent(&mut self) -> f64;
}

/// Source of traced heap allocation figures for a window
pub trait AllocationTracer {
    /// Open a measurement window at the current allocation level
    fn begin_window(&mut self);

    /// Read `(current, peak)` traced bytes since the window opened
    fn window_usage(&mut self) -> (u64, u64);
}

/// Brackets a unit of work and reports its resource envelope
pub struct ResourceSampler<P, T> {
    probe: P,
    tracer: T,
}

impl ResourceSampler<SysinfoProbe, HeapTracer> {
    /// Sampler wired to the host OS and the process-wide counting
    /// allocator
    pub fn host() -> Self {
        Self::new(SysinfoProbe::new(), HeapTracer)
    }
}

impl<P: ResourceProbe, T: AllocationTracer> ResourceSampler<P, T> {
    pub fn new(probe: P, tracer: T) -> Self {
        Self { probe, tracer }
    }

    /// Drive `work` exactly once and measure the span it executes in.
    ///
    /// Snapshot order: wall start, allocation window open, CPU start;
    /// then the work; then wall end, allocation window read, CPU end,
    /// and a point sample of system memory percentage. Nothing outside
    /// this bracket (prompting, parsing) is attributed to the span.
    pub async fn measure<F>(&mut self, work: F) -> (F::Output, ResourceSample)
    where
        F: Future,
    {
        let wall_start = self.probe.wall_now();
        self.tracer.begin_window();
        let cpu_start = self.probe.cpu_seconds();

        let output = work.await;

        let wall_end = self.probe.wall_now();
        let (mem_current_bytes, mem_peak_bytes) = self.tracer.window_usage();
        let cpu_end = self.probe.cpu_seconds();

        let wall_seconds = wall_end
            .saturating_duration_since(wall_start)
            .as_secs_f64();
        let cpu_seconds = (cpu_end - cpu_start).max(0.0);
        let cores = self.probe.logical_cores().max(1);

        // Fraction of one core's worth of total capacity. A
        // sub-measurable window reports 0 instead of dividing by it.
        let cpu_percent = if wall_seconds == 0.0 {
            0.0
        } else {
            (cpu_seconds / wall_seconds) * 100.0 / cores as f64
        };

        let system_mem_percent = self.probe.process_memory_percent();

        let sample = ResourceSample {
            wall_seconds,
            mem_current_bytes,
            mem_peak_bytes,
            cpu_seconds,
            cpu_percent,
            system_mem_percent,
        };

        tracing::debug!(
            wall_seconds,
            cpu_seconds,
            mem_peak_bytes,
            "measured retrieval span"
        );

        (output, sample)
    }
}
