//! Search Coordination
//!
//! This module lets several specialist agents share one view of the external
//! information sources they search. Repeated or overlapping queries are
//! answered from a shared cache, each agent is routed to the sources that
//! serve its specialty, and sources are protected by per-source rate limits
//! and a cooldown after failures.
//!
//! # Architecture
//!
//! - [`catalog`] - static registry of sources (priority, specialties, rate limit)
//! - [`cache`] - TTL-checked, bounded result cache keyed by (query, source, specialty)
//! - [`selector`] - priority-ordered source selection and failure cooldown
//! - [`rate_limit`] - process-wide request spacing per source
//! - [`stats`] - monitoring records
//! - [`coordinator`] - [`SearchCoordinator`], the component agents talk to
//!
//! # Usage
//!
//! ```ignore
//! use rxcoord::coordination::SearchCoordinator;
//! use rxcoord::tools::WebSearchTool;
//! use rxcoord::utils::toml_config::CoordinatorConfig;
//! use std::sync::Arc;
//!
//! let coordinator = Arc::new(SearchCoordinator::new(&CoordinatorConfig::default())?);
//! let tool = WebSearchTool::new();
//!
//! let results = coordinator
//!     .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
//!     .await?;
//! for (source, result) in &results {
//!     println!("{}: success={}", source, result.success);
//! }
//!
//! // Later, a verifying agent reuses what the others found
//! let shared = coordinator.get_shared_results("ibuprofen", "ValidatorAgent");
//! ```

/// Result cache and key derivation.
pub mod cache;
/// Source catalog.
pub mod catalog;
/// Injectable time source.
pub mod clock;
/// The search coordinator.
pub mod coordinator;
/// Per-source rate limiting.
pub mod rate_limit;
/// Source selection and failure tracking.
pub mod selector;
/// Cache statistics and status records.
pub mod stats;

pub use cache::cache_key;
pub use catalog::{SourceCatalog, SourceSpec};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::SearchCoordinator;
pub use stats::{AgentStats, CacheStats, CoordinationStatus};
