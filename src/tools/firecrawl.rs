//! Single-page scraping through FireCrawl.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ScrapeTool, ScrapedPage, ToolKind};
use crate::error::ToolError;
use crate::vector_store::Metadata;

const FIRECRAWL_BASE: &str = "https://api.firecrawl.dev/v0";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOptions {
    include_markdown: bool,
    include_html: bool,
    only_main_content: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    page_options: PageOptions,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    data: Option<ScrapeData>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    content: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

fn metadata_str(metadata: &Metadata, key: &str) -> String {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct FireCrawlTool {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FireCrawlTool {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ToolError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolError::MissingApiKey("FIRECRAWL_API_KEY"));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: FIRECRAWL_BASE.to_string(),
        })
    }

    /// Use another API root; `/scrape` is appended to it.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ScrapeTool for FireCrawlTool {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError> {
        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ScrapeRequest {
                url,
                page_options: PageOptions {
                    include_markdown: true,
                    include_html: false,
                    only_main_content: true,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                tool: ToolKind::FireCrawl,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let ScrapeResponse { data } = response.json().await?;
        let data = data.ok_or(ToolError::NoData)?;
        let content = data.markdown.or(data.content).unwrap_or_default();
        debug!(url, chars = content.len(), "Scraped page");

        Ok(ScrapedPage {
            url: url.to_string(),
            title: metadata_str(&data.metadata, "title"),
            description: metadata_str(&data.metadata, "description"),
            content,
            metadata: data.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn expected_request(url: &str) -> Value {
        json!({
            "url": url,
            "pageOptions": { "includeMarkdown": true, "includeHtml": false, "onlyMainContent": true }
        })
    }

    #[tokio::test]
    async fn test_scrape_prefers_markdown() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v0/scrape")
                    .header("authorization", "Bearer fc_key")
                    .json_body(expected_request("https://example.com"));
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "markdown": "# Example\n\nBody",
                        "content": "Example Body",
                        "metadata": { "title": "Example", "description": "An example page", "sourceURL": "https://example.com" }
                    }
                }));
            })
            .await;

        let tool = FireCrawlTool::new("fc_key").unwrap().with_base_url(server.url("/v0"));
        let page = tool.scrape("https://example.com").await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.url, "https://example.com");
        assert_eq!(page.title, "Example");
        assert_eq!(page.description, "An example page");
        assert_eq!(page.content, "# Example\n\nBody");
        assert_eq!(page.metadata["sourceURL"], "https://example.com");
    }

    #[tokio::test]
    async fn test_scrape_falls_back_to_plain_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/scrape");
                then.status(200)
                    .json_body(json!({ "data": { "content": "plain text" } }));
            })
            .await;

        let tool = FireCrawlTool::new("k").unwrap().with_base_url(server.url("/v0"));
        let page = tool.scrape("https://example.com/a").await.unwrap();
        assert_eq!(page.content, "plain text");
        assert_eq!(page.title, "");
        assert!(page.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_without_data_is_no_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/scrape");
                then.status(200).json_body(json!({ "success": false }));
            })
            .await;

        let tool = FireCrawlTool::new("k").unwrap().with_base_url(server.url("/v0"));
        let err = tool.scrape("https://example.com").await.unwrap_err();
        assert!(matches!(err, ToolError::NoData));
        assert_eq!(err.to_string(), "No data returned");
    }

    #[tokio::test]
    async fn test_scrape_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/scrape");
                then.status(402).body("Payment required");
            })
            .await;

        let tool = FireCrawlTool::new("k").unwrap().with_base_url(server.url("/v0"));
        assert!(matches!(
            tool.scrape("https://example.com").await,
            Err(ToolError::Status { tool: ToolKind::FireCrawl, status: 402, .. })
        ));
    }
}
