//! Google search through SerpAPI.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchHit, SearchTool, ToolKind};
use crate::error::ToolError;

const SERPAPI_URL: &str = "https://serpapi.com/search";

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Clone)]
pub struct SerpApiTool {
    client: Client,
    api_key: String,
    url: String,
}

impl SerpApiTool {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ToolError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolError::MissingApiKey("SERPAPI_API_KEY"));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            url: SERPAPI_URL.to_string(),
        })
    }

    /// Point the tool at another search endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl SearchTool for SerpApiTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SerpApi
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                tool: ToolKind::SerpApi,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: SerpApiResponse = response.json().await?;
        debug!(count = body.organic_results.len(), "SerpAPI organic results");

        Ok(body
            .organic_results
            .into_iter()
            .take(num_results)
            .map(|r| SearchHit {
                title: r.title,
                link: r.link,
                snippet: r.snippet,
                source: ToolKind::SerpApi.name().to_string(),
            })
            .collect())
    }
}
