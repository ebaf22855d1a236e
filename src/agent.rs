//! # Agent
//!
//! The facade the CLI and REPL talk to. It owns the [`MemoryPipeline`] and the
//! [`ToolRegistry`] and adds the operations that span both: web search, and
//! scraping a URL straight into memory.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::ChatGenerator;
use crate::config::AgentConfig;
use crate::embeddings::OllamaEmbedder;
use crate::error::{StoreError, ToolError};
use crate::pipeline::MemoryPipeline;
use crate::tools::{ScrapedPage, SearchChoice, SearchHit, ToolCredentials, ToolKind, ToolRegistry};
use crate::vector_store::{CollectionInfo, Metadata, StoreMode, VectorStore};

/// Snapshot of the memory backend, as shown by the `stats` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub mode: StoreMode,
    pub collection: Option<CollectionInfo>,
}

pub struct Agent {
    pipeline: MemoryPipeline,
    tools: ToolRegistry,
}

impl Agent {
    pub fn new(pipeline: MemoryPipeline, tools: ToolRegistry) -> Self {
        Self { pipeline, tools }
    }

    /// Build the production agent: Ollama embeddings, OpenAI-compatible
    /// generation, Qdrant (or in-memory) storage and whichever web tools have keys.
    pub async fn from_config(
        config: &AgentConfig,
        credentials: &ToolCredentials,
    ) -> Result<Self, StoreError> {
        let embedder = OllamaEmbedder::new(
            &config.ollama_base,
            config.embedding_model.clone(),
            config.vector_size,
        );
        info!(model = %embedder.model(), "Initialized Ollama embeddings");

        let generator = ChatGenerator::new(config);
        info!(model = %generator.model(), "Initialized chat model");

        let store = VectorStore::connect(&config.store_settings()).await?;
        info!(collection = %store.collection_name(), mode = %store.mode(), "Initialized memory");

        let pipeline = MemoryPipeline::new(Box::new(embedder), Box::new(generator), store)
            .with_top_k(config.retrieval_k);
        let tools = ToolRegistry::from_credentials(credentials, config.search_results);

        Ok(Self::new(pipeline, tools))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn pipeline(&self) -> &MemoryPipeline {
        &self.pipeline
    }

    pub async fn ingest(&mut self, content: &str, metadata: Option<Metadata>) -> bool {
        self.pipeline.ingest(content, metadata).await
    }

    pub async fn ask(&self, question: &str, use_memory: bool) -> String {
        self.pipeline.ask(question, use_memory).await
    }

    pub async fn search_web(&self, query: &str, choice: SearchChoice) -> Vec<SearchHit> {
        self.tools.search(query, choice).await
    }

    /// Scrape `url` and ingest its content with `{source, url, title}` metadata.
    ///
    /// The page is returned even if ingesting it fails; that failure is only logged.
    ///
    /// # Errors
    /// [`ToolError::NotConfigured`] without a FireCrawl key, or whatever the scrape failed with.
    pub async fn fetch_url(&mut self, url: &str) -> Result<ScrapedPage, ToolError> {
        let scraper = self.tools.scraper().ok_or_else(|| {
            warn!("FireCrawl tool not available");
            ToolError::NotConfigured(ToolKind::FireCrawl)
        })?;

        let page = scraper.scrape(url).await.inspect_err(|e| {
            warn!(url, error = %e, "Error fetching URL");
        })?;
        info!(url, "Fetched content");

        if !page.content.is_empty() {
            let mut metadata = Metadata::new();
            metadata.insert("source".into(), Value::String(ToolKind::FireCrawl.name().into()));
            metadata.insert("url".into(), Value::String(url.to_string()));
            metadata.insert("title".into(), Value::String(page.title.clone()));
            if !self.pipeline.ingest(&page.content, Some(metadata)).await {
                warn!(url, "Fetched page was not stored in memory");
            }
        }

        Ok(page)
    }

    pub async fn memory_stats(&self) -> MemoryStats {
        let store = self.pipeline.store();
        MemoryStats {
            mode: store.mode(),
            collection: store.collection_info(store.collection_name()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, RecordingGenerator, StaticScraper, StaticSearch};
    use crate::tools::SearchProvider;

    const KEYWORDS: &[&str] = &["rust", "ownership", "python"];

    async fn agent(tools: ToolRegistry) -> Agent {
        let store = VectorStore::in_memory("agent_test", KEYWORDS.len()).await.unwrap();
        let pipeline = MemoryPipeline::new(
            Box::new(KeywordEmbedder::new(KEYWORDS)),
            Box::new(RecordingGenerator::new("answer")),
            store,
        );
        Agent::new(pipeline, tools)
    }

    #[tokio::test]
    async fn test_fetch_url_ingests_page_with_source_metadata() {
        let tools = ToolRegistry::empty(5)
            .with_scraper(Box::new(StaticScraper::new("Rust Book", "Rust ownership rules")));
        let mut agent = agent(tools).await;

        let page = agent.fetch_url("https://doc.rust-lang.org/book").await.unwrap();
        assert_eq!(page.title, "Rust Book");

        let hits = agent
            .pipeline()
            .store()
            .search(&[1.0, 1.0, 0.0], 5, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "Rust ownership rules");
        assert_eq!(hits[0].metadata["source"], "firecrawl");
        assert_eq!(hits[0].metadata["url"], "https://doc.rust-lang.org/book");
        assert_eq!(hits[0].metadata["title"], "Rust Book");
        assert!(hits[0].metadata.contains_key("ingested_at"));
    }

    #[tokio::test]
    async fn test_fetch_url_without_firecrawl_is_not_configured() {
        let mut agent = agent(ToolRegistry::empty(5)).await;
        let err = agent.fetch_url("https://example.com").await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(ToolKind::FireCrawl)));
        assert_eq!(err.to_string(), "FireCrawl not configured");
    }

    #[tokio::test]
    async fn test_fetch_url_returns_page_when_ingest_fails() {
        let tools = ToolRegistry::empty(5).with_scraper(Box::new(StaticScraper::new("T", "rust")));
        // Store dimension differs from the embedder's, so the insert is rejected.
        let store = VectorStore::in_memory("mismatch", 7).await.unwrap();
        let pipeline = MemoryPipeline::new(
            Box::new(KeywordEmbedder::new(KEYWORDS)),
            Box::new(RecordingGenerator::new("answer")),
            store,
        );
        let mut agent = Agent::new(pipeline, tools);

        let page = agent.fetch_url("https://example.com").await.unwrap();
        assert_eq!(page.content, "rust");
        let stats = agent.memory_stats().await;
        assert_eq!(stats.collection.unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn test_fetch_url_skips_empty_content() {
        let tools = ToolRegistry::empty(5).with_scraper(Box::new(StaticScraper::new("Empty", "")));
        let mut agent = agent(tools).await;

        agent.fetch_url("https://example.com/empty").await.unwrap();
        assert_eq!(agent.memory_stats().await.collection.unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn test_search_web_uses_registry() {
        let brave = StaticSearch::returning(ToolKind::Brave, &["Rust"]);
        let agent = agent(ToolRegistry::empty(5).with_search(Box::new(brave.clone()))).await;

        let hits = agent
            .search_web("rust", SearchChoice::Provider(SearchProvider::Brave))
            .await;
        assert_eq!(hits.len(), 1);
        assert!(agent.search_web("rust", SearchChoice::Provider(SearchProvider::SerpApi)).await.is_empty());
        assert_eq!(brave.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_stats_reports_mode_and_counts() {
        let mut agent = agent(ToolRegistry::empty(5)).await;
        agent.ingest("rust", None).await;
        agent.ingest("python", None).await;

        let stats = agent.memory_stats().await;
        assert_eq!(stats.mode, StoreMode::InMemory);
        let info = stats.collection.unwrap();
        assert_eq!(info.name, "agent_test");
        assert_eq!(info.points_count, 2);

        let json = serde_json::to_value(&agent.memory_stats().await).unwrap();
        assert_eq!(json["mode"], "in_memory");
    }

    #[tokio::test]
    async fn test_ask_delegates_to_pipeline() {
        let agent = agent(ToolRegistry::empty(5)).await;
        assert_eq!(agent.ask("What is rust?", true).await, "answer");
    }
}
