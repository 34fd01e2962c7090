//! Source selection and failure cooldown.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

use super::catalog::SourceCatalog;
use super::clock::elapsed_since;
use crate::types::Specialty;

/// Most recent failure time per source.
#[derive(Debug, Default)]
pub struct FailureTracker {
    failures: HashMap<String, DateTime<Utc>>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, source: &str, at: DateTime<Utc>) {
        self.failures.insert(source.to_string(), at);
    }

    /// Forget a source's failure; returns whether one was recorded
    pub fn record_success(&mut self, source: &str) -> bool {
        self.failures.remove(source).is_some()
    }

    pub fn in_cooldown(&self, source: &str, now: DateTime<Utc>, cooldown: Duration) -> bool {
        self.failures
            .get(source)
            .is_some_and(|failed_at| elapsed_since(now, *failed_at) < cooldown)
    }

    /// Sources still cooling down at `now`, in catalog order
    pub fn cooling_down(
        &self,
        catalog: &SourceCatalog,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Vec<String> {
        let mut names: Vec<&String> = self
            .failures
            .keys()
            .filter(|name| self.in_cooldown(name, now, cooldown))
            .collect();
        let rank = |name: &str| catalog.position(name).unwrap_or(usize::MAX);
        names.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));
        names.into_iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.failures.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pick up to `limit` sources for `specialty` that are usable at `now`.
///
/// Candidates are ranked by priority (catalog order breaks ties) and sources
/// in cooldown are skipped. Returning fewer than `limit`, or none, is normal.
pub fn select_sources(
    catalog: &SourceCatalog,
    failures: &FailureTracker,
    specialty: Specialty,
    limit: usize,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Vec<String> {
    catalog
        .serving(specialty)
        .into_iter()
        .filter(|source| !failures.in_cooldown(&source.name, now, cooldown))
        .take(limit)
        .map(|source| source.name.clone())
        .collect()
}
