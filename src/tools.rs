//! # Web tools
//!
//! Search and scrape adapters the agent can call besides its own memory.
//!
//! | Kind                      | Trait          | Service                                 |
//! |---------------------------|----------------|-----------------------------------------|
//! | [`ToolKind::SerpApi`]     | [`SearchTool`] | SerpAPI Google search                   |
//! | [`ToolKind::Brave`]       | [`SearchTool`] | Brave Search web API                    |
//! | [`ToolKind::FireCrawl`]   | [`ScrapeTool`] | FireCrawl single-page scrape (markdown) |
//!
//! The set of kinds is closed. A [`ToolRegistry`] holds at most one tool per
//! kind and is filled once at startup from whatever API keys are available;
//! a missing key just leaves the slot empty.

mod brave;
mod firecrawl;
mod serpapi;

pub use brave::BraveSearchTool;
pub use firecrawl::FireCrawlTool;
pub use serpapi::SerpApiTool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::ToolError;
use crate::vector_store::Metadata;

/// Number of search hits requested when nothing else is configured.
pub const DEFAULT_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    SerpApi,
    Brave,
    FireCrawl,
}

impl ToolKind {
    /// Short identifier, also used as [`SearchHit::source`].
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SerpApi => "serpapi",
            ToolKind::Brave => "brave",
            ToolKind::FireCrawl => "firecrawl",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolKind::SerpApi => "SerpAPI",
            ToolKind::Brave => "Brave Search",
            ToolKind::FireCrawl => "FireCrawl",
        })
    }
}

/// The tools that can answer a web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    SerpApi,
    Brave,
}

impl SearchProvider {
    /// Order tried by [`SearchChoice::Auto`].
    pub const AUTO_ORDER: [SearchProvider; 2] = [SearchProvider::SerpApi, SearchProvider::Brave];

    pub fn kind(self) -> ToolKind {
        match self {
            SearchProvider::SerpApi => ToolKind::SerpApi,
            SearchProvider::Brave => ToolKind::Brave,
        }
    }
}

/// Which search tool to use: the first one that answers, or a specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchChoice {
    #[default]
    Auto,
    Provider(SearchProvider),
}

impl FromStr for SearchChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(SearchChoice::Auto),
            "serpapi" => Ok(SearchChoice::Provider(SearchProvider::SerpApi)),
            "brave" => Ok(SearchChoice::Provider(SearchProvider::Brave)),
            other => Err(format!(
                "unknown search tool `{other}` (expected auto, serpapi or brave)"
            )),
        }
    }
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Name of the tool that produced the hit.
    pub source: String,
}

/// Main content of a single scraped page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Page body, markdown when the scraper provides it.
    pub content: String,
    pub metadata: Metadata,
}

#[async_trait]
pub trait SearchTool: Send + Sync {
    fn kind(&self) -> ToolKind;

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, ToolError>;
}

#[async_trait]
pub trait ScrapeTool: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError>;
}

/// API keys for the web tools. Blank keys count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCredentials {
    pub serpapi_key: Option<String>,
    pub brave_key: Option<String>,
    pub firecrawl_key: Option<String>,
}

fn present(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

/// At most one tool per [`ToolKind`].
pub struct ToolRegistry {
    serpapi: Option<Box<dyn SearchTool>>,
    brave: Option<Box<dyn SearchTool>>,
    firecrawl: Option<Box<dyn ScrapeTool>>,
    num_results: usize,
}

impl ToolRegistry {
    /// A registry with no tools configured. Searches against it return no results.
    ///
    /// ```
    /// use ollama_cli_agent::tools::{SearchProvider, ToolRegistry};
    ///
    /// let registry = ToolRegistry::empty(5);
    /// assert_eq!(registry.num_results(), 5);
    /// assert!(registry.search_tool(SearchProvider::Brave).is_none());
    /// assert!(registry.scraper().is_none());
    /// ```
    pub fn empty(num_results: usize) -> Self {
        Self {
            serpapi: None,
            brave: None,
            firecrawl: None,
            num_results,
        }
    }

    /// Build every tool whose key is present.
    pub fn from_credentials(credentials: &ToolCredentials, num_results: usize) -> Self {
        let mut registry = Self::empty(num_results);

        if let Some(key) = present(&credentials.serpapi_key) {
            match SerpApiTool::new(key) {
                Ok(tool) => registry = registry.with_search(Box::new(tool)),
                Err(e) => warn!(error = %e, "Failed to initialize SerpAPI"),
            }
        }
        if let Some(key) = present(&credentials.brave_key) {
            match BraveSearchTool::new(key) {
                Ok(tool) => registry = registry.with_search(Box::new(tool)),
                Err(e) => warn!(error = %e, "Failed to initialize Brave Search"),
            }
        }
        if let Some(key) = present(&credentials.firecrawl_key) {
            match FireCrawlTool::new(key) {
                Ok(tool) => registry = registry.with_scraper(Box::new(tool)),
                Err(e) => warn!(error = %e, "Failed to initialize FireCrawl"),
            }
        }

        info!(count = registry.available().len(), "Initialized tools");
        registry
    }

    /// Put `tool` into the slot for its kind, replacing any previous one.
    pub fn with_search(mut self, tool: Box<dyn SearchTool>) -> Self {
        let kind = tool.kind();
        match kind {
            ToolKind::SerpApi => self.serpapi = Some(tool),
            ToolKind::Brave => self.brave = Some(tool),
            ToolKind::FireCrawl => {
                warn!(%kind, "Not a search tool, ignoring");
                return self;
            }
        }
        info!(%kind, "Initialized tool");
        self
    }

    pub fn with_scraper(mut self, tool: Box<dyn ScrapeTool>) -> Self {
        self.firecrawl = Some(tool);
        info!(kind = %ToolKind::FireCrawl, "Initialized tool");
        self
    }

    /// Kinds that currently have a tool, in declaration order.
    pub fn available(&self) -> Vec<ToolKind> {
        let mut kinds = Vec::new();
        if self.serpapi.is_some() {
            kinds.push(ToolKind::SerpApi);
        }
        if self.brave.is_some() {
            kinds.push(ToolKind::Brave);
        }
        if self.firecrawl.is_some() {
            kinds.push(ToolKind::FireCrawl);
        }
        kinds
    }

    /// Result count requested from every search provider.
    pub fn num_results(&self) -> usize {
        self.num_results
    }

    /// The configured tool for `provider`, if its key was supplied.
    pub fn search_tool(&self, provider: SearchProvider) -> Option<&dyn SearchTool> {
        match provider {
            SearchProvider::SerpApi => self.serpapi.as_deref(),
            SearchProvider::Brave => self.brave.as_deref(),
        }
    }

    /// The FireCrawl scraper, if configured.
    pub fn scraper(&self) -> Option<&dyn ScrapeTool> {
        self.firecrawl.as_deref()
    }

    /// Run a web search. Never fails: errors are logged and yield an empty list.
    ///
    /// [`SearchChoice::Auto`] walks [`SearchProvider::AUTO_ORDER`], skipping
    /// absent tools, and stops at the first non-empty answer.
    pub async fn search(&self, query: &str, choice: SearchChoice) -> Vec<SearchHit> {
        match choice {
            SearchChoice::Auto => {
                for provider in SearchProvider::AUTO_ORDER {
                    let Some(tool) = self.search_tool(provider) else {
                        continue;
                    };
                    match tool.search(query, self.num_results).await {
                        Ok(hits) if !hits.is_empty() => {
                            info!(count = hits.len(), tool = %tool.kind(), "Found results");
                            return hits;
                        }
                        Ok(_) => {}
                        Err(e) => warn!(tool = %tool.kind(), error = %e, "Search failed"),
                    }
                }
                Vec::new()
            }
            SearchChoice::Provider(provider) => {
                let Some(tool) = self.search_tool(provider) else {
                    warn!(tool = %provider.kind(), "Tool not available");
                    return Vec::new();
                };
                match tool.search(query, self.num_results).await {
                    Ok(hits) => {
                        info!(count = hits.len(), tool = %tool.kind(), "Found results");
                        hits
                    }
                    Err(e) => {
                        warn!(tool = %tool.kind(), error = %e, "Search failed");
                        Vec::new()
                    }
                }
            }
        }
    }
}
