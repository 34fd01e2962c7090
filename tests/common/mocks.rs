//! Mock implementations for testing.
//!
//! Provides a scripted search tool and a small two-source catalog that the
//! integration tests share.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rxcoord::coordination::{Clock, ManualClock};
use rxcoord::types::{AppError, Result, SourcePriority, Specialty};
use rxcoord::utils::toml_config::{CoordinatorConfig, SourceConfig};
use rxcoord::SearchTool;
use std::collections::BTreeMap;

/// Search tool that records every query it receives.
///
/// Queries containing one of the configured failure markers return an error;
/// everything else returns the canned response.
pub struct MockSearchTool {
    response: String,
    fail_when_contains: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, DateTime<Utc>)>>,
    clock: Option<ManualClock>,
}

impl MockSearchTool {
    /// Create a tool that always succeeds with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail_when_contains: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            clock: None,
        }
    }

    /// Stamp invocations with `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fail every query containing `marker`.
    pub fn fail_when_contains(self, marker: &str) -> Self {
        self.fail_when_contains.lock().push(marker.to_string());
        self
    }

    /// Stop failing any query.
    pub fn recover(&self) {
        self.fail_when_contains.lock().clear();
    }

    pub fn invocation_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(q, _)| q.clone()).collect()
    }

    /// Invocation times for queries containing `marker`
    pub fn call_times(&self, marker: &str) -> Vec<DateTime<Utc>> {
        self.calls
            .lock()
            .iter()
            .filter(|(q, _)| q.contains(marker))
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl SearchTool for MockSearchTool {
    fn name(&self) -> &str {
        "mock_search"
    }

    async fn execute(&self, query: &str) -> Result<String> {
        let now = self
            .clock
            .as_ref()
            .map(|clock| clock.now())
            .unwrap_or_else(Utc::now);
        self.calls.lock().push((query.to_string(), now));

        let failing = self
            .fail_when_contains
            .lock()
            .iter()
            .any(|marker| query.contains(marker.as_str()));
        if failing {
            return Err(AppError::Search(format!("connection reset for '{}'", query)));
        }
        Ok(self.response.clone())
    }
}

/// Two dosage sources: A (primary, a.example) and B (secondary, b.example),
/// both limited to one request per second.
pub fn two_source_config() -> CoordinatorConfig {
    let source = |name: &str, domain: &str, priority| SourceConfig {
        name: name.to_string(),
        display_name: None,
        url_pattern: domain.to_string(),
        priority,
        specialties: vec![Specialty::Dosage],
        rate_limit_secs: 1.0,
    };

    let agents: BTreeMap<String, Specialty> = [
        ("DosageAgent", Specialty::Dosage),
        ("NurseAgent", Specialty::Dosage),
        ("ValidatorAgent", Specialty::Verification),
    ]
    .into_iter()
    .map(|(name, specialty)| (name.to_string(), specialty))
    .collect();

    CoordinatorConfig {
        sources: vec![
            source("A", "a.example", SourcePriority::Primary),
            source("B", "b.example", SourcePriority::Secondary),
        ],
        agents,
        ..CoordinatorConfig::default()
    }
}
