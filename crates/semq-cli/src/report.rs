//! Report rendering for retrieval results and resource metrics
//!
//! Pure string formatting; the console decides where the text goes.

use std::fmt::Write as _;

use semq_core::{Match, ResourceSample};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Render ranked matches followed by the metrics block.
pub fn render(matches: &[Match], sample: &ResourceSample) -> String {
    let mut out = String::new();

    out.push_str("\nResults:\n");
    for m in matches {
        let _ = writeln!(out, "Document: {} | Distance: {:.4}", m.document, m.distance);
    }

    out.push_str("\n--- Performance Metrics ---\n");
    let _ = writeln!(out, "Time taken: {:.4} seconds", sample.wall_seconds);
    let _ = writeln!(
        out,
        "Memory usage: {:.4} MB (Current), {:.4} MB (Peak)",
        sample.mem_current_bytes as f64 / BYTES_PER_MB,
        sample.mem_peak_bytes as f64 / BYTES_PER_MB,
    );
    let _ = writeln!(out, "CPU usage: {:.2}%", sample.cpu_percent);
    let _ = writeln!(out, "Memory usage (system): {:.2}%", sample.system_mem_percent);
    out.push_str("-------------------------\n");

    out
}
