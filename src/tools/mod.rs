//! Search Tools
//!
//! The coordinator depends on a single capability, [`SearchTool`]: take an
//! enhanced query string, return text or an error. Agents supply their own
//! implementation per call.
//!
//! # Available Tools
//!
//! ## Web Search
//! [`WebSearchTool`] queries DuckDuckGo through daedra and renders the hits
//! as plain text blocks:
//! ```ignore
//! let tool = WebSearchTool::with_num_results(3);
//! let text = tool.execute("site:fda.gov ibuprofen warnings").await?;
//! ```

/// Search capability trait and web search tool.
pub mod search;

pub use search::{SearchTool, WebSearchTool};
