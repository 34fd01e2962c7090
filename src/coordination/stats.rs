//! Monitoring records derived from coordinator state.

use serde::Serialize;
use std::collections::BTreeMap;

/// Success/failure tally for one agent's cached results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub success: usize,
    pub failed: usize,
}

/// Snapshot of cache contents and coordination counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_cached_results: usize,
    pub successful_searches: usize,
    pub failed_searches: usize,
    /// Successful share of cached entries, e.g. "66.7%" ("0%" when empty)
    pub cache_hit_rate: String,
    /// Per-agent breakdown, keyed by agent name
    pub agent_statistics: BTreeMap<String, AgentStats>,
    /// Sources currently cooling down after a failure
    pub failed_sources: Vec<String>,
    pub cache_ttl_hours: f64,
    /// Lookups answered from cache
    pub lookup_hits: u64,
    /// Lookups that needed a tool invocation
    pub lookup_misses: u64,
    pub evictions: u64,
    pub tool_invocations: u64,
}

/// Format the successful share of `total` as a percentage string
pub fn format_hit_rate(successful: usize, total: usize) -> String {
    if total == 0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", successful as f64 / total as f64 * 100.0)
    }
}

/// Overall coordination report for dashboards and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinationStatus {
    pub status: String,
    pub metrics: CacheStats,
    pub agents_coordinated: usize,
    pub sources: usize,
    pub coordination_features: Vec<String>,
}

pub(crate) const COORDINATION_FEATURES: [&str; 5] = [
    "Search result caching",
    "Source priority selection",
    "Per-source rate limiting",
    "Failed source cooldown",
    "Cross-agent result sharing",
];
