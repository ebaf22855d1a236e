//! Deterministic stand-ins for the model backends and web tools, used by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::Generator;
use crate::embeddings::Embedder;
use crate::error::{ModelError, ToolError};
use crate::tools::{ScrapeTool, ScrapedPage, SearchHit, SearchTool, ToolKind};
use crate::vector_store::Metadata;

/// One dimension per keyword; each component counts occurrences of that keyword.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimension(&self) -> usize {
        self.keywords.len()
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let text = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dimension(&self) -> usize {
        3
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::Status {
            status: 500,
            body: "Embedding failed".to_string(),
        })
    }
}

/// Replies with a fixed answer and remembers every prompt it was given.
#[derive(Clone)]
pub struct RecordingGenerator {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn invoke(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::EmptyResponse)
    }
}

/// Search tool returning canned hits (or an error) and counting calls.
#[derive(Clone)]
pub struct StaticSearch {
    kind: ToolKind,
    hits: Option<Vec<SearchHit>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticSearch {
    pub fn returning(kind: ToolKind, titles: &[&str]) -> Self {
        let hits = titles
            .iter()
            .map(|t| SearchHit {
                title: t.to_string(),
                link: format!("https://example.com/{}", t.replace(' ', "-")),
                snippet: format!("About {t}"),
                source: kind.name().to_string(),
            })
            .collect();
        Self {
            kind,
            hits: Some(hits),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(kind: ToolKind) -> Self {
        Self {
            kind,
            hits: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchTool for StaticSearch {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    async fn search(&self, query: &str, _num_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        self.calls.lock().unwrap().push(query.to_string());
        self.hits.clone().ok_or(ToolError::Status {
            tool: self.kind,
            status: 500,
            body: "boom".to_string(),
        })
    }
}

/// Scraper returning a fixed page for any URL.
pub struct StaticScraper {
    title: String,
    content: String,
}

impl StaticScraper {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl ScrapeTool for StaticScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError> {
        Ok(ScrapedPage {
            url: url.to_string(),
            title: self.title.clone(),
            description: String::new(),
            content: self.content.clone(),
            metadata: Metadata::new(),
        })
    }
}
