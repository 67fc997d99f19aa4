//! Web search tool backed by the Tavily search API

use super::{ensure_object_parameters, Tool, WEB_SEARCH_TOOL};
use crate::error::AdvisorError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const MAX_RESULTS: u32 = 3;

pub struct WebSearchTool {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: TAVILY_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .post(url)
            .json(&json!({
                "api_key": api_key,
                "query": query,
                "max_results": MAX_RESULTS,
                "search_depth": "advanced",
            }))
            .send()
            .await
            .map_err(|e| AdvisorError::Tool(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Tool(format!(
                "Search API returned {}: {}",
                status, body
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Tool(format!("Invalid search response: {}", e)))?;

        Ok(body.results)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Ranked results as plain text for the model
fn render_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n{}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content.trim()
        ));
    }
    out.trim_end().to_string()
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        WEB_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Search the web and return the top ranked results as text."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AdvisorError::Config("TAVILY_API_KEY is not configured".to_string())
        })?;

        ensure_object_parameters(input)?;
        let query = input
            .parameters
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                AdvisorError::InvalidToolInput("Expected 'query' for this tool".to_string())
            })?;

        info!(query, "Running web search");
        let results = self.search(api_key, query).await?;
        debug!(results = results.len(), "Web search returned");

        if results.is_empty() {
            return Err(AdvisorError::Tool(format!("No search results for '{}'", query)));
        }

        Ok(ToolOutput {
            success: true,
            data: Value::String(render_results(&results)),
            error: None,
        })
    }
}
