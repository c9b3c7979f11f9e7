//! Embedding client for generating vector representations
//!
//! Talks to an Ollama server's embeddings API. The model is fixed at
//! construction; the console never switches models mid-session.

use async_trait::async_trait;
use reqwest::Client;
use semq_core::{EmbeddingConfig, Result, SemqError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama embedding API client
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create a new embedder for the given server and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "all-minilm" => 384,
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            _ => 768, // Default for most models
        };

        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SemqError::Embedding(format!("Failed to build HTTP client: {e}")))?;

        let mut embedder = Self::new(config.ollama_url.clone(), config.model.clone());
        embedder.client = client;
        Ok(embedder)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| SemqError::Embedding(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SemqError::Embedding(format!(
                "Embedding server error: {error_text}"
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SemqError::Embedding(format!("Failed to parse embedding response: {e}")))?;

        Ok(result.embedding)
    }
}

#[async_trait]
impl super::Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(SemqError::Embedding(
                "Cannot embed an empty batch".to_string(),
            ));
        }

        tracing::debug!(model = %self.model, batch = texts.len(), "embedding batch");

        // The API has no native batch endpoint; texts are embedded
        // sequentially, preserving input order.
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_one(text).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
