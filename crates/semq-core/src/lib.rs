//! semq Core - Domain models, errors, and configuration
//!
//! This crate defines the shared vocabulary of the query console:
//! - Validated query input (`Query`)
//! - Retrieval results (`Match`, `RetrievalResult`)
//! - Per-query resource measurements (`ResourceSample`)
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, EmbeddingConfig, LoggingConfig, StoreConfig};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for semq operations
#[derive(Error, Debug)]
pub enum SemqError {
    /// Bad user input, recovered locally; the loop continues.
    #[error("{0}")]
    Validation(String),

    /// The embedding backend is unavailable or returned garbage.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The vector collection cannot be opened or queried.
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SemqError>;

// ============================================================================
// Query Input
// ============================================================================

/// A validated nearest-neighbor query: non-empty text and a positive
/// result count. Constructed once per loop iteration from raw console
/// input; invalid input is rejected here, before any retrieval work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Free-text query, trimmed, never empty
    pub text: String,

    /// Number of results to retrieve, always > 0
    pub k: usize,
}

impl Query {
    /// Parse raw console input into a query.
    ///
    /// Text is checked before the count; each failure mode has a fixed
    /// user-facing message suitable for printing verbatim.
    pub fn parse(text: &str, count: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SemqError::Validation(
                "Query text cannot be empty.".to_string(),
            ));
        }

        let k: i64 = count
            .trim()
            .parse()
            .map_err(|_| SemqError::Validation("Invalid input. Please enter a number.".to_string()))?;

        if k <= 0 {
            return Err(SemqError::Validation(
                "Please enter a valid positive number.".to_string(),
            ));
        }

        Ok(Self {
            text: text.to_string(),
            k: k as usize,
        })
    }
}

// ============================================================================
// Retrieval Results
// ============================================================================

/// A single retrieved document with its distance to the query vector.
/// Smaller distance means more similar. Immutable once produced by the
/// store adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Document payload stored alongside the vector
    pub document: String,

    /// Dissimilarity score, non-decreasing across a result set
    pub distance: f64,
}

/// Matches ordered nearest-first, at most `k` long. The store adapter
/// is responsible for the ordering invariant, never the caller.
pub type RetrievalResult = Vec<Match>;

// ============================================================================
// Resource Measurement
// ============================================================================

/// Resource envelope of a single measured retrieval span.
///
/// Produced exactly once per query by bracketing the retrieval call;
/// used only for reporting, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSample {
    /// Wall-clock duration of the measured span, in seconds
    pub wall_seconds: f64,

    /// Traced heap bytes still allocated at the end of the span
    pub mem_current_bytes: u64,

    /// High-water mark of traced heap bytes during the span
    pub mem_peak_bytes: u64,

    /// Combined user + system CPU time consumed, in seconds
    pub cpu_seconds: f64,

    /// CPU time as a percentage of one core's worth of total capacity:
    /// `(cpu_seconds / wall_seconds) * 100 / logical_cores`. Reported
    /// as 0 for sub-measurable windows.
    pub cpu_percent: f64,

    /// Process resident memory as a percentage of system memory,
    /// point-sampled at the end of the span
    pub system_mem_percent: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse_valid() {
        let query = Query::parse("apple", "3").unwrap();
        assert_eq!(query.text, "apple");
        assert_eq!(query.k, 3);
    }

    #[test]
    fn test_query_parse_trims_text() {
        let query = Query::parse("  apple pie  ", " 5 ").unwrap();
        assert_eq!(query.text, "apple pie");
        assert_eq!(query.k, 5);
    }

    #[test]
    fn test_query_parse_empty_text() {
        let err = Query::parse("   ", "3").unwrap_err();
        assert!(matches!(err, SemqError::Validation(_)));
        assert_eq!(err.to_string(), "Query text cannot be empty.");
    }

    #[test]
    fn test_query_parse_non_numeric_count() {
        let err = Query::parse("apple", "three").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input. Please enter a number.");
    }

    #[test]
    fn test_query_parse_non_positive_count() {
        for bad in ["0", "-2"] {
            let err = Query::parse("apple", bad).unwrap_err();
            assert_eq!(err.to_string(), "Please enter a valid positive number.");
        }
    }

    #[test]
    fn test_resource_sample_default_is_zeroed() {
        let sample = ResourceSample::default();
        assert_eq!(sample.wall_seconds, 0.0);
        assert_eq!(sample.cpu_percent, 0.0);
        assert_eq!(sample.mem_peak_bytes, 0);
    }
}
