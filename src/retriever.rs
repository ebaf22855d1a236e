//! Query string → ranked context passages.

use tracing::debug;

use crate::embeddings::Embedder;
use crate::error::PipelineError;
use crate::vector_store::{MetadataFilter, RetrievalResult, VectorStore};

/// Number of passages retrieved for `ask` unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Borrows a store and an embedder for the duration of one query.
pub struct Retriever<'a> {
    store: &'a VectorStore,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a VectorStore, embedder: &'a dyn Embedder) -> Self {
        Self { store, embedder }
    }

    /// Texts of the `k` stored records closest to `question`, best first.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<String>, PipelineError> {
        Ok(self
            .retrieve_scored(question, k, None)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps scores and metadata, optionally
    /// restricted to records matching `filter`.
    pub async fn retrieve_scored(
        &self,
        question: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, PipelineError> {
        let query = self.embedder.embed_query(question).await?;
        let hits = self.store.search(&query, k, filter).await?;
        debug!(k, found = hits.len(), "Retrieved passages");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use serde_json::json;

    #[tokio::test]
    async fn test_retrieve_returns_texts_in_rank_order() {
        let embedder = KeywordEmbedder::new(&["rust", "python", "go"]);
        let mut store = VectorStore::in_memory("notes", embedder.dimension()).await.unwrap();
        let texts: Vec<String> = ["python snakes", "rust crabs", "rust and go"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();
        store.add(&texts, vectors, None).await.unwrap();

        let retriever = Retriever::new(&store, &embedder);
        let passages = retriever.retrieve("rust", 2).await.unwrap();

        assert_eq!(passages, vec!["rust crabs".to_string(), "rust and go".to_string()]);
    }

    #[tokio::test]
    async fn test_retrieve_scored_applies_filter() {
        let embedder = KeywordEmbedder::new(&["rust", "python"]);
        let mut store = VectorStore::in_memory("notes", embedder.dimension()).await.unwrap();
        let texts = vec!["rust book".to_string(), "rust blog".to_string()];
        let vectors = embedder.embed_documents(&texts).await.unwrap();
        let metadatas = vec![
            json!({ "source": "firecrawl" }).as_object().cloned().unwrap(),
            json!({ "source": "manual" }).as_object().cloned().unwrap(),
        ];
        store.add(&texts, vectors, Some(metadatas)).await.unwrap();

        let mut filter = MetadataFilter::new();
        filter.insert("source".into(), json!("manual"));
        let hits = Retriever::new(&store, &embedder)
            .retrieve_scored("rust", 5, Some(&filter))
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "rust blog");
    }

    #[tokio::test]
    async fn test_empty_store_yields_no_passages() {
        let embedder = KeywordEmbedder::new(&["rust"]);
        let store = VectorStore::in_memory("notes", embedder.dimension()).await.unwrap();

        let passages = Retriever::new(&store, &embedder)
            .retrieve("rust", DEFAULT_TOP_K)
            .await
            .unwrap();
        assert!(passages.is_empty());
    }
}
