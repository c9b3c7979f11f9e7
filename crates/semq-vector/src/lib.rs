//! semq Vector - Embedding and vector store adapters
//!
//! Wraps the two external capabilities the query console depends on:
//! text embedding (Ollama) and nearest-neighbor retrieval (Qdrant),
//! each behind a trait so tests can substitute fakes.

use async_trait::async_trait;
use semq_core::{Result, RetrievalResult};

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate one fixed-length vector per input text, same order.
    /// The input is never mutated or reordered. An empty batch is an
    /// error; callers are expected not to construct one.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Fixed vector length produced by the backing model
    fn dimension(&self) -> usize;
}

/// Trait for nearest-neighbor retrieval against a persisted collection
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `k` matches ordered ascending by distance. Fewer
    /// than `k` results when the collection is smaller is not an
    /// error. The ordering invariant (non-decreasing distance, stable
    /// at ties) is this adapter's responsibility. Read-only.
    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<RetrievalResult>;
}

pub mod embedding;
pub mod qdrant_store;

pub use embedding::OllamaEmbedder;
pub use qdrant_store::QdrantStore;
