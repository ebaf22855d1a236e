//! # Memory pipeline
//!
//! Wires the embedder, vector store, retriever, prompt assembler and generator
//! together for the two operations the agent exposes:
//!
//! ```text
//! ingest: content ─▶ Embedder ─▶ VectorStore::add
//! ask:    question ─▶ Embedder ─▶ VectorStore::search(k) ─▶ assemble_prompt ─▶ Generator
//! ```
//!
//! Both operations are the stability boundary of the application: they never
//! return an error. `ingest` reports a `bool`, `ask` turns any failure into an
//! apology string that carries the error message.

use chrono::{Local, SecondsFormat};
use serde_json::Value;
use tracing::{error, info};

use crate::api::Generator;
use crate::embeddings::Embedder;
use crate::error::PipelineError;
use crate::prompt::assemble_prompt;
use crate::retriever::{DEFAULT_TOP_K, Retriever};
use crate::vector_store::{Metadata, VectorStore};

/// Metadata key stamped on every ingested record.
pub const INGESTED_AT: &str = "ingested_at";

pub struct MemoryPipeline {
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    store: VectorStore,
    top_k: usize,
}

impl MemoryPipeline {
    pub fn new(
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
        store: VectorStore,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Number of passages `ask` retrieves when memory is enabled.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VectorStore {
        &mut self.store
    }

    /// Embed `content` and store it with `metadata` plus a fresh `ingested_at` timestamp.
    ///
    /// A caller-supplied `ingested_at` is overwritten. Returns `false` (after
    /// logging) if embedding or storage fails; nothing is written in that case.
    pub async fn ingest(&mut self, content: &str, metadata: Option<Metadata>) -> bool {
        match self.try_ingest(content, metadata).await {
            Ok(_) => {
                info!(chars = content.chars().count(), "Ingested content");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to ingest content");
                false
            }
        }
    }

    async fn try_ingest(
        &mut self,
        content: &str,
        metadata: Option<Metadata>,
    ) -> Result<Vec<String>, PipelineError> {
        let mut metadata = metadata.unwrap_or_default();
        metadata.insert(
            INGESTED_AT.to_string(),
            Value::String(Local::now().to_rfc3339_opts(SecondsFormat::Nanos, false)),
        );

        let texts = vec![content.to_string()];
        let vectors = self.embedder.embed_documents(&texts).await?;
        let ids = self.store.add(&texts, vectors, Some(vec![metadata])).await?;
        Ok(ids)
    }

    /// Answer `question`, grounding it on stored memories when `use_memory` is set.
    ///
    /// Never fails: any error from embedding, retrieval or generation comes back
    /// as `"Sorry, I encountered an error: ..."`.
    pub async fn ask(&self, question: &str, use_memory: bool) -> String {
        match self.try_ask(question, use_memory).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "Error generating response");
                format!("Sorry, I encountered an error: {e}")
            }
        }
    }

    async fn try_ask(&self, question: &str, use_memory: bool) -> Result<String, PipelineError> {
        let passages = if use_memory {
            let passages = Retriever::new(&self.store, self.embedder.as_ref())
                .retrieve(question, self.top_k)
                .await?;
            if !passages.is_empty() {
                info!(count = passages.len(), "Found relevant documents in memory");
            }
            passages
        } else {
            Vec::new()
        };

        let prompt = assemble_prompt(question, &passages);
        let response = self.generator.invoke(&prompt).await?;
        info!(chars = response.chars().count(), "Generated response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, FailingGenerator, KeywordEmbedder, RecordingGenerator};
    use serde_json::json;

    const KEYWORDS: &[&str] = &["paris", "france", "rust", "x"];

    async fn pipeline(generator: RecordingGenerator) -> MemoryPipeline {
        let store = VectorStore::in_memory("test", KEYWORDS.len()).await.unwrap();
        MemoryPipeline::new(Box::new(KeywordEmbedder::new(KEYWORDS)), Box::new(generator), store)
    }

    #[tokio::test]
    async fn test_ingest_stamps_timestamp_and_keeps_metadata() {
        let mut pipeline = pipeline(RecordingGenerator::new("ok")).await;
        let metadata = json!({ "source": "cli", "ingested_at": "1999-01-01T00:00:00" })
            .as_object()
            .cloned();

        assert!(pipeline.ingest("Paris is in France", metadata).await);

        let hits = pipeline.store().search(&[1.0, 1.0, 0.0, 0.0], 5, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["source"], "cli");
        let stamp = hits[0].metadata[INGESTED_AT].as_str().unwrap();
        assert_ne!(stamp, "1999-01-01T00:00:00");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_ingest_same_content_twice_creates_two_records() {
        let mut pipeline = pipeline(RecordingGenerator::new("ok")).await;

        assert!(pipeline.ingest("rust rust", None).await);
        assert!(pipeline.ingest("rust rust", None).await);

        let hits = pipeline.store().search(&[0.0, 0.0, 1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].metadata["doc_id"], hits[1].metadata["doc_id"]);
        assert_ne!(hits[0].metadata[INGESTED_AT], hits[1].metadata[INGESTED_AT]);
    }

    #[tokio::test]
    async fn test_ingest_embedding_failure_returns_false_and_writes_nothing() {
        let store = VectorStore::in_memory("test", 3).await.unwrap();
        let mut pipeline = MemoryPipeline::new(
            Box::new(FailingEmbedder),
            Box::new(RecordingGenerator::new("ok")),
            store,
        );

        assert!(!pipeline.ingest("Test content", None).await);
        let info = pipeline.store().collection_info("test").await.unwrap();
        assert_eq!(info.points_count, 0);
    }

    #[tokio::test]
    async fn test_ingest_empty_content_returns_false() {
        let mut pipeline = pipeline(RecordingGenerator::new("ok")).await;
        assert!(!pipeline.ingest("", None).await);
    }

    #[tokio::test]
    async fn test_ask_with_memory_includes_context() {
        let generator = RecordingGenerator::new("Paris is the capital of France.");
        let mut pipeline = pipeline(generator.clone()).await;
        pipeline.ingest("Paris is the capital of France.", None).await;
        pipeline.ingest("Rust has no garbage collector.", None).await;

        let answer = pipeline.ask("What is the capital of France?", true).await;

        assert_eq!(answer, "Paris is the capital of France.");
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Based on the following context"));
        assert!(prompts[0].contains("Context:\nParis is the capital of France."));
        assert!(prompts[0].ends_with("Question: What is the capital of France?\n\nAnswer:"));
    }

    #[tokio::test]
    async fn test_ask_with_empty_memory_uses_plain_template() {
        let generator = RecordingGenerator::new("I need more context.");
        let pipeline = pipeline(generator.clone()).await;

        pipeline.ask("What is X?", true).await;
        assert_eq!(generator.prompts(), vec!["Question: What is X?\n\nAnswer:".to_string()]);
    }

    #[tokio::test]
    async fn test_ask_without_memory_skips_retrieval() {
        let generator = RecordingGenerator::new("I need more context.");
        let mut pipeline = pipeline(generator.clone()).await;
        pipeline.ingest("What is X? X is a perfect match.", None).await;

        let answer = pipeline.ask("What is X?", false).await;

        assert_eq!(answer, "I need more context.");
        let prompts = generator.prompts();
        assert_eq!(prompts, vec!["Question: What is X?\n\nAnswer:".to_string()]);
        assert!(!prompts[0].contains("perfect match"));
    }

    #[tokio::test]
    async fn test_ask_without_memory_never_embeds() {
        let generator = RecordingGenerator::new("fine");
        let store = VectorStore::in_memory("test", 3).await.unwrap();
        let pipeline = MemoryPipeline::new(Box::new(FailingEmbedder), Box::new(generator), store);

        assert_eq!(pipeline.ask("anything", false).await, "fine");
        assert!(pipeline.ask("anything", true).await.starts_with("Sorry, I encountered an error:"));
    }

    #[tokio::test]
    async fn test_ask_generator_failure_returns_apology() {
        let store = VectorStore::in_memory("test", KEYWORDS.len()).await.unwrap();
        let pipeline = MemoryPipeline::new(
            Box::new(KeywordEmbedder::new(KEYWORDS)),
            Box::new(FailingGenerator),
            store,
        );

        let answer = pipeline.ask("What is X?", true).await;
        assert!(answer.starts_with("Sorry, I encountered an error:"));
        assert!(answer.contains("empty response"));
    }

    #[tokio::test]
    async fn test_top_k_limits_context() {
        let generator = RecordingGenerator::new("ok");
        let mut pipeline = pipeline(generator.clone()).await.with_top_k(1);
        pipeline.ingest("rust x", None).await;
        pipeline.ingest("rust only", None).await;

        pipeline.ask("rust", true).await;
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Context:\nrust only\n\nQuestion: rust"));
        assert!(!prompt.contains("rust x"));
    }
}
