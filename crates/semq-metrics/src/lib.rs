//! semq Metrics - Resource sampling for measured query spans
//!
//! Brackets a single retrieval call and reports its resource envelope:
//! wall time, traced heap allocation (current + peak), process CPU
//! time normalized by logical core count, and process memory as a
//! percentage of system memory.
//!
//! The measurement assumes a single logical thread of control. If
//! other threads run work during the window, their CPU time lands on
//! the shared process counters and is attributed to the span; that is
//! an accepted limitation of process-level accounting.

pub mod alloc;
pub mod probe;
pub mod sampler;

pub use alloc::{HeapTracer, TracingAllocator};
pub use probe::SysinfoProbe;
pub use sampler::{AllocationTracer, ResourceProbe, ResourceSampler};
