use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::cache::{cache_key, SearchCache};
use super::catalog::{SourceCatalog, SourceSpec};
use super::clock::{Clock, SystemClock};
use super::rate_limit::RateLimiter;
use super::selector::{select_sources, FailureTracker};
use super::stats::{
    format_hit_rate, AgentStats, CacheStats, CoordinationStatus, COORDINATION_FEATURES,
};
use crate::tools::SearchTool;
use crate::types::{AppError, Result, SearchResult, Specialty};
use crate::utils::toml_config::{ConfigError, CoordinatorConfig, QueryTemplates};

/// Cache and failure state change together, so they share one lock
struct CoordinatorState {
    cache: SearchCache,
    failures: FailureTracker,
}

/// Shared search front door for all specialist agents.
///
/// Build one per process and hand every agent an `Arc` to it. The
/// coordinator deduplicates queries through its cache, routes each agent to
/// the sources serving its specialty, spaces requests per source and keeps
/// failing sources out of rotation for a cooldown window.
pub struct SearchCoordinator {
    catalog: SourceCatalog,
    agents: BTreeMap<String, Specialty>,
    templates: QueryTemplates,
    default_max_sources: usize,
    cooldown: Duration,
    state: Mutex<CoordinatorState>,
    rate_limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    tool_invocations: AtomicU64,
}

impl SearchCoordinator {
    /// Create a coordinator on the system clock
    pub fn new(config: &CoordinatorConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a coordinator reading time from `clock`
    pub fn with_clock(config: &CoordinatorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let catalog = SourceCatalog::from_config(&config.sources)?;
        let max_entries = NonZeroUsize::new(config.cache.max_entries).ok_or_else(|| {
            ConfigError::ValidationError("cache.max_entries must be greater than zero".to_string())
        })?;

        info!(
            sources = catalog.len(),
            agents = config.agents.len(),
            ttl_secs = config.cache.ttl_secs,
            "Search coordinator initialized"
        );

        Ok(Self {
            catalog,
            agents: config.agents.clone(),
            templates: config.query_templates.clone(),
            default_max_sources: config.default_max_sources,
            cooldown: config.failure.cooldown(),
            state: Mutex::new(CoordinatorState {
                cache: SearchCache::new(config.cache.ttl(), max_entries),
                failures: FailureTracker::new(),
            }),
            rate_limiter: RateLimiter::new(),
            clock,
            tool_invocations: AtomicU64::new(0),
        })
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn default_max_sources(&self) -> usize {
        self.default_max_sources
    }

    /// Configured agent names and their specialties, sorted by name
    pub fn agents(&self) -> impl Iterator<Item = (&str, Specialty)> {
        self.agents
            .iter()
            .map(|(name, specialty)| (name.as_str(), *specialty))
    }

    /// Specialty for an agent; unknown agents are treated as `general`
    pub fn specialty_for(&self, agent_name: &str) -> Specialty {
        self.agents
            .get(agent_name)
            .copied()
            .unwrap_or(Specialty::General)
    }

    /// Sources that would be consulted right now for `specialty`
    pub fn select_sources(&self, specialty: Specialty, limit: usize) -> Vec<String> {
        let state = self.state.lock();
        select_sources(
            &self.catalog,
            &state.failures,
            specialty,
            limit,
            self.clock.now(),
            self.cooldown,
        )
    }

    /// Compose the source-scoped query text sent to the tool
    pub fn enhance_query(&self, query: &str, source: &SourceSpec, specialty: Specialty) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(hint) = source.scope_hint() {
            parts.push(hint);
        }
        parts.push(query.trim().to_string());
        if let Some(keywords) = self.templates.keywords(specialty) {
            parts.push(keywords.to_string());
        }
        parts.join(" ")
    }

    /// Search the best available sources for the agent's specialty.
    ///
    /// Cached results are reused as-is. Otherwise the source's rate limit is
    /// honoured and `search_tool` is invoked with an enhanced query. A failing
    /// source shows up in the returned map as an unsuccessful result and
    /// enters cooldown; it does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] for an empty query or a zero
    /// `max_sources`.
    pub async fn coordinated_search(
        &self,
        agent_name: &str,
        query: &str,
        search_tool: &dyn SearchTool,
        max_sources: usize,
    ) -> Result<HashMap<String, SearchResult>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Search query must not be empty".to_string()));
        }
        if max_sources == 0 {
            return Err(AppError::InvalidInput(
                "max_sources must be at least 1".to_string(),
            ));
        }

        let specialty = self.specialty_for(agent_name);
        let sources = self.select_sources(specialty, max_sources);
        debug!(agent = agent_name, %specialty, ?sources, "Selected sources");

        let mut results = HashMap::with_capacity(sources.len());

        for source_name in sources {
            let Some(source) = self.catalog.get(&source_name) else {
                continue;
            };
            let key = cache_key(query, &source_name, specialty);

            let cached = {
                let mut state = self.state.lock();
                state.cache.get_if_valid(&key, self.clock.now())
            };
            if let Some(result) = cached {
                info!("Cache hit for {}: {} from {}", agent_name, query, source_name);
                results.insert(source_name, result);
                continue;
            }

            let wait = self
                .rate_limiter
                .reserve(&source_name, source.rate_limit, self.clock.now());
            if !wait.is_zero() {
                warn!(
                    "Rate limit hit for {}. Waiting {:.1}s",
                    source_name,
                    wait.as_secs_f64()
                );
                self.clock.sleep(wait).await;
            }

            let enhanced_query = self.enhance_query(query, source, specialty);
            info!(
                tool = search_tool.name(),
                "New search for {}: {} from {}",
                agent_name,
                enhanced_query,
                source_name
            );
            self.tool_invocations.fetch_add(1, Ordering::Relaxed);

            let outcome = search_tool.execute(&enhanced_query).await;
            let now = self.clock.now();

            let result = match outcome {
                Ok(content) => {
                    let result = SearchResult::success(
                        enhanced_query,
                        source_name.as_str(),
                        content,
                        now,
                        agent_name,
                        specialty,
                    );
                    let mut state = self.state.lock();
                    state.cache.put(key, result.clone());
                    if state.failures.record_success(&source_name) {
                        info!("Source {} recovered, cooldown cleared", source_name);
                    }
                    result
                }
                Err(e) => {
                    error!("Search failed for {} on {}: {}", agent_name, source_name, e);
                    self.state.lock().failures.record_failure(&source_name, now);
                    SearchResult::failure(
                        query,
                        source_name.as_str(),
                        now,
                        agent_name,
                        specialty,
                        e.to_string(),
                    )
                }
            };

            results.insert(source_name, result);
        }

        Ok(results)
    }

    /// Successful cached results from other agents whose query contains `query`.
    ///
    /// Matching is a case-insensitive substring test on the stored query
    /// text. Each source's list keeps cache write order.
    pub fn get_shared_results(
        &self,
        query: &str,
        requesting_agent: &str,
    ) -> HashMap<String, Vec<SearchResult>> {
        let needle = query.to_lowercase();
        let state = self.state.lock();

        let mut shared: HashMap<String, Vec<SearchResult>> = HashMap::new();
        for result in state.cache.iter() {
            if result.agent_name != requesting_agent
                && result.success
                && result.query.to_lowercase().contains(&needle)
            {
                shared
                    .entry(result.source.clone())
                    .or_default()
                    .push(result.clone());
            }
        }
        shared
    }

    /// Statistics over the current cache contents
    pub fn get_cache_stats(&self) -> CacheStats {
        let now = self.clock.now();
        let state = self.state.lock();

        let mut agent_statistics: BTreeMap<String, AgentStats> = BTreeMap::new();
        let mut successful = 0;
        for result in state.cache.iter() {
            let entry = agent_statistics
                .entry(result.agent_name.clone())
                .or_default();
            if result.success {
                successful += 1;
                entry.success += 1;
            } else {
                entry.failed += 1;
            }
        }

        let total = state.cache.len();
        let counters = state.cache.counters();

        CacheStats {
            total_cached_results: total,
            successful_searches: successful,
            failed_searches: total - successful,
            cache_hit_rate: format_hit_rate(successful, total),
            agent_statistics,
            failed_sources: state.failures.cooling_down(&self.catalog, now, self.cooldown),
            cache_ttl_hours: state.cache.ttl().as_secs_f64() / 3600.0,
            lookup_hits: counters.hits,
            lookup_misses: counters.misses,
            evictions: counters.evictions,
            tool_invocations: self.tool_invocations.load(Ordering::Relaxed),
        }
    }

    /// Status report combining stats with the coordinator's shape
    pub fn coordination_status(&self) -> CoordinationStatus {
        CoordinationStatus {
            status: "active".to_string(),
            metrics: self.get_cache_stats(),
            agents_coordinated: self.agents.len(),
            sources: self.catalog.len(),
            coordination_features: COORDINATION_FEATURES.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Drop every cached result and failure record.
    ///
    /// Rate-limit history is kept, so the next requests still respect the
    /// spacing since the last real invocation.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.failures.clear();
        info!("Search cache cleared");
    }
}
