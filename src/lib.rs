//! # rxcoord - Search Coordination for Pharmacy Agents
//!
//! Specialist agents answering pharmaceutical questions (dosage, side
//! effects, interactions, verification) tend to search the same handful of
//! authoritative sites for the same drugs. rxcoord sits between those agents
//! and their search tool so that overlapping queries are served once and
//! reused.
//!
//! ## Overview
//!
//! rxcoord can be used in two ways:
//!
//! 1. **As a library** - build one [`SearchCoordinator`] and share it with
//!    every agent
//! 2. **As a CLI** - run the `rxcoord` binary to inspect the catalog or run
//!    coordinated web searches
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use rxcoord::{CoordinatorConfig, SearchCoordinator, WebSearchTool};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Arc::new(SearchCoordinator::new(&CoordinatorConfig::default())?);
//!     let tool = WebSearchTool::new();
//!
//!     let results = coordinator
//!         .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
//!         .await?;
//!     for (source, result) in &results {
//!         println!("{} -> success: {}", source, result.success);
//!     }
//!
//!     println!("{:?}", coordinator.get_cache_stats());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordination`] - cache, source catalog, selection, rate limiting
//! - [`tools`] - the search tool capability and a web search implementation
//! - [`types`] - domain types and error handling
//! - [`utils`] - TOML configuration
//! - [`cli`] - command-line interface used by the binary

#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface for the rxcoord binary.
pub mod cli;
/// Search coordination: cache, catalog, selection and rate limiting.
pub mod coordination;
/// Search tool capability and implementations.
pub mod tools;
/// Core types (specialties, results, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use coordination::{CacheStats, CoordinationStatus, SearchCoordinator};
pub use tools::{SearchTool, WebSearchTool};
pub use types::{AppError, Result, SearchResult, SourcePriority, Specialty};
pub use utils::toml_config::{ConfigError, CoordinatorConfig};
