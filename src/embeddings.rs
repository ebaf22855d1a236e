//! # Embeddings
//!
//! The [`Embedder`] trait is the only thing the memory pipeline knows about
//! embeddings: turn text into a vector of a fixed, declared length.
//!
//! [`OllamaEmbedder`] implements it against a local Ollama server
//! (`POST /api/embeddings`). The default model, `all-minilm`, produces
//! 384-dimensional vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";

/// Text → vector capability with a stable dimensionality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Embed several texts, one request per text.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_query(text).await?);
        }
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let EmbeddingResponse { embedding } = response.json().await?;
        debug!(model = %self.model, dims = embedding.len(), "Embedded text");

        if embedding.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        if embedding.len() != self.dimension {
            return Err(ModelError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }
        Ok(embedding)
    }
}
