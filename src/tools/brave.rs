//! Brave Search web API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchHit, SearchTool, ToolKind};
use crate::error::ToolError;

const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Deserialize)]
struct BraveResponse {
    web: Option<WebResults>,
}

#[derive(Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone)]
pub struct BraveSearchTool {
    client: Client,
    api_key: String,
    url: String,
}

impl BraveSearchTool {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ToolError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolError::MissingApiKey("BRAVE_API_KEY"));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            url: BRAVE_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl SearchTool for BraveSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Brave
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let count = num_results.to_string();
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                tool: ToolKind::Brave,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: BraveResponse = response.json().await?;
        let results = body.web.map(|w| w.results).unwrap_or_default();
        debug!(count = results.len(), "Brave web results");

        Ok(results
            .into_iter()
            .take(num_results)
            .map(|r| SearchHit {
                title: r.title,
                link: r.url,
                snippet: r.description,
                source: ToolKind::Brave.name().to_string(),
            })
            .collect())
    }
}
