//! Search tool capability and the daedra-backed web search implementation
//!
//! The coordinator never talks to the network itself. Each agent hands it a
//! [`SearchTool`]; the coordinator decides when (and whether) to call it.

use crate::types::{AppError, Result};
use async_trait::async_trait;

/// Something that can answer a search query with text.
///
/// Failures must be reported as `Err`, never as an empty string.
#[async_trait]
pub trait SearchTool: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, query: &str) -> Result<String>;
}

/// Web search tool powered by daedra (DuckDuckGo backend)
pub struct WebSearchTool {
    num_results: usize,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self { num_results: 5 }
    }

    /// Limit the number of hits rendered into the returned text
    pub fn with_num_results(num_results: usize) -> Self {
        Self {
            num_results: num_results.max(1),
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn execute(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Missing search query".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.num_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(render_hits(
            query,
            response.data.iter().map(|r| {
                (r.title.as_str(), r.url.as_str(), r.description.as_str())
            }),
        ))
    }
}

/// Render `(title, url, description)` hits as blank-line separated blocks.
///
/// Zero hits is a successful answer and renders as an explicit notice.
fn render_hits<'a>(
    query: &str,
    hits: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
) -> String {
    let blocks: Vec<String> = hits
        .into_iter()
        .map(|(title, url, description)| format!("{}\n{}\n{}", title, url, description))
        .collect();

    if blocks.is_empty() {
        format!("No web results found for '{}'", query)
    } else {
        blocks.join("\n\n")
    }
}
