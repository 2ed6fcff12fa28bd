//! Web search tool.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Snippet limits for normal and deep searches.
const NORMAL_LIMIT: usize = 5;
const DEEP_LIMIT: usize = 10;

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    /// Whether this hit is a placeholder from a search backend running
    /// without credentials. Placeholder hits must not be cited to the user.
    pub fn is_placeholder(&self) -> bool {
        self.source == "example.com" || self.snippet.to_lowercase().contains("mock search result")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Web search via the configured search backend.
///
/// # Parameters
///
/// - `query` (required): The search query.
///
/// The snippet limit comes from the turn context: deep searches fetch
/// ten results, normal searches five.
pub struct WebSearch {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl WebSearch {
    /// Create a search tool with explicit configuration.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Read configuration from `SEARCH_API_URL` and `SEARCH_API_KEY`.
    pub fn from_env() -> Result<Self, ToolError> {
        let api_url = env::var("SEARCH_API_URL")
            .map_err(|_| ToolError::ExecutionFailed("SEARCH_API_URL not set".to_string()))?;
        let api_key = env::var("SEARCH_API_KEY").unwrap_or_default();
        Self::new(api_url, api_key)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError> {
        debug!("Searching web for '{}' (limit {})", query, limit);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "query": query, "limit": limit }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Search backend returned {}", status);
            return Err(ToolError::ExecutionFailed(format!(
                "search backend returned status {status}"
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().take(limit).collect())
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Performs a real-time web search and returns titled snippets."
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.get_string("query")?;
        let limit = if args.deep_search { DEEP_LIMIT } else { NORMAL_LIMIT };

        let results = self.search(&query, limit).await?;
        let placeholder = results.is_empty() || results.iter().all(|r| r.is_placeholder());

        let content = results
            .iter()
            .map(|r| format!("{} ({}): {}", r.title, r.source, r.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::success(content).with_payload(json!({
            "results": results,
            "placeholder": placeholder,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        let mock_source = SearchResult {
            title: "Example".to_string(),
            link: "https://example.com/a".to_string(),
            source: "example.com".to_string(),
            snippet: "anything".to_string(),
        };
        assert!(mock_source.is_placeholder());

        let mock_snippet = SearchResult {
            title: "Example".to_string(),
            link: String::new(),
            source: "news.site".to_string(),
            snippet: "This is a Mock Search Result for testing".to_string(),
        };
        assert!(mock_snippet.is_placeholder());

        let real = SearchResult {
            title: "Rust 1.80 released".to_string(),
            link: "https://blog.rust-lang.org".to_string(),
            source: "blog.rust-lang.org".to_string(),
            snippet: "The Rust team has published a new release.".to_string(),
        };
        assert!(!real.is_placeholder());
    }

    #[tokio::test]
    async fn test_missing_query() {
        let tool = WebSearch::new("http://localhost:1", "k").unwrap();
        let result = tool.execute(ToolArgs::new(Default::default())).await;
        assert!(matches!(result, Err(ToolError::MissingParameter(_))));
    }
}
