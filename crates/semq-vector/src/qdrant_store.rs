//! Qdrant implementation of the vector store adapter
//!
//! Read-only: the console only ever queries the persisted collection,
//! it never writes to it.

use async_trait::async_trait;
use qdrant_client::qdrant::{ScoredPoint, SearchPointsBuilder};
use qdrant_client::Qdrant;
use semq_core::{Match, Result, RetrievalResult, SemqError, StoreConfig};

/// Qdrant-backed vector store
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Connect to the Qdrant server named in the config
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| SemqError::StoreUnavailable(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
        })
    }

    /// Verify the collection exists and can be queried. The console is
    /// read-only, so a missing collection is an error rather than
    /// something to create.
    pub async fn check_ready(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(|e| {
            SemqError::StoreUnavailable(format!("Failed to list collections: {e}"))
        })?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            return Err(SemqError::StoreUnavailable(format!(
                "Collection '{}' not found",
                self.collection
            )));
        }

        Ok(())
    }
}

/// Convert a scored point into a domain match.
///
/// Qdrant reports cosine similarity, best-first; the console reports
/// cosine distance, nearest-first. `1 - score` flips one into the
/// other, so the store's result order is already ascending by
/// distance.
fn point_to_match(point: ScoredPoint) -> Match {
    let document = point
        .payload
        .get("document")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    Match {
        document,
        distance: 1.0 - f64::from(point.score),
    }
}

#[async_trait]
impl super::VectorStore for QdrantStore {
    async fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| SemqError::StoreUnavailable(format!("Vector search failed: {e}")))?;

        tracing::debug!(
            collection = %self.collection,
            requested = k,
            returned = results.result.len(),
            "nearest-neighbor search"
        );

        let mut matches: RetrievalResult =
            results.result.into_iter().map(point_to_match).collect();

        // Stable sort: preserves the store-reported order at equal
        // distances, and keeps the ordering invariant ours to uphold
        // rather than an assumption about the backend.
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(matches)
    }
}
