//! Integration tests for the search coordinator
//!
//! These tests drive `SearchCoordinator` end to end with a scripted search
//! tool and a manual clock:
//! - cache reuse across calls and across agents
//! - failure handling and cooldown
//! - per-source rate limiting
//! - shared results, statistics and administrative reset

mod common;

use chrono::TimeDelta;
use common::mocks::{two_source_config, MockSearchTool};
use rxcoord::coordination::{Clock, ManualClock, SearchCoordinator};
use rxcoord::utils::toml_config::MAX_RATE_LIMIT_SECS;
use rxcoord::{AppError, ConfigError, Specialty};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (SearchCoordinator, ManualClock) {
    let clock = ManualClock::default();
    let coordinator =
        SearchCoordinator::with_clock(&two_source_config(), Arc::new(clock.clone())).unwrap();
    (coordinator, clock)
}

fn keys<V>(map: &std::collections::HashMap<String, V>) -> HashSet<&str> {
    map.keys().map(String::as_str).collect()
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn test_search_then_repeat_is_served_from_cache() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    let first = coordinator
        .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
        .await
        .unwrap();

    assert_eq!(keys(&first), HashSet::from(["A", "B"]));
    assert!(first.values().all(|r| r.success && r.content == "dose info"));
    assert_eq!(tool.invocation_count(), 2);
    assert_eq!(coordinator.get_cache_stats().total_cached_results, 2);

    let second = coordinator
        .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
        .await
        .unwrap();

    assert_eq!(tool.invocation_count(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_enhanced_queries_sent_to_tool() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock);

    let results = coordinator
        .coordinated_search("DosageAgent", "  Ibuprofen dose ", &tool, 2)
        .await
        .unwrap();

    assert_eq!(
        tool.queries(),
        vec![
            "site:a.example Ibuprofen dose dosage dose administration",
            "site:b.example Ibuprofen dose dosage dose administration",
        ]
    );
    assert_eq!(
        results["A"].query,
        "site:a.example Ibuprofen dose dosage dose administration"
    );
    assert_eq!(results["A"].specialty, Specialty::Dosage);
    assert_eq!(results["A"].agent_name, "DosageAgent");
}

#[tokio::test]
async fn test_cache_is_shared_between_agents_and_normalized() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock);

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
        .await
        .unwrap();
    let reused = coordinator
        .coordinated_search("NurseAgent", "  IBUPROFEN Dose", &tool, 2)
        .await
        .unwrap();

    assert_eq!(tool.invocation_count(), 2);
    // Cache hits are returned unchanged, including the issuing agent
    assert!(reused.values().all(|r| r.agent_name == "DosageAgent"));

    let stats = coordinator.get_cache_stats();
    assert_eq!(stats.lookup_hits, 2);
    assert_eq!(stats.lookup_misses, 2);
}

#[tokio::test]
async fn test_cache_entry_expires_after_ttl() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 1)
        .await
        .unwrap();

    clock.advance(Duration::from_secs(3599));
    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 1)
        .await
        .unwrap();
    assert_eq!(tool.invocation_count(), 1);

    clock.advance(Duration::from_secs(2));
    let refreshed = coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 1)
        .await
        .unwrap();
    assert_eq!(tool.invocation_count(), 2);
    assert_eq!(refreshed["A"].timestamp, clock.now());
    assert_eq!(coordinator.get_cache_stats().total_cached_results, 1);
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_max_sources_truncates_in_priority_order() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock);

    let results = coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 1)
        .await
        .unwrap();

    assert_eq!(keys(&results), HashSet::from(["A"]));
}

#[tokio::test]
async fn test_unknown_agent_falls_back_to_general() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock);

    assert_eq!(coordinator.specialty_for("PharmacistBot"), Specialty::General);

    // The test catalog has no general sources: empty map, not an error
    let results = coordinator
        .coordinated_search("PharmacistBot", "ibuprofen", &tool, 3)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(tool.invocation_count(), 0);
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected() {
    let (coordinator, _clock) = setup();
    let tool = MockSearchTool::new("dose info");

    let empty = coordinator
        .coordinated_search("DosageAgent", "   ", &tool, 2)
        .await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let zero = coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 0)
        .await;
    assert!(matches!(zero, Err(AppError::InvalidInput(_))));

    assert_eq!(tool.invocation_count(), 0);
}

// =============================================================================
// Failures and cooldown
// =============================================================================

#[tokio::test]
async fn test_failing_source_is_reported_and_cooled_down() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock.clone())
        .fail_when_contains("site:a.example");

    let results = coordinator
        .coordinated_search("DosageAgent", "ibuprofen dose", &tool, 2)
        .await
        .unwrap();

    let failed = &results["A"];
    assert!(!failed.success);
    assert!(failed.content.is_empty());
    assert_eq!(failed.query, "ibuprofen dose");
    assert!(failed
        .error_message
        .as_deref()
        .is_some_and(|msg| msg.contains("connection reset")));
    assert!(results["B"].success);

    // Failures are not cached
    let stats = coordinator.get_cache_stats();
    assert_eq!(stats.total_cached_results, 1);
    assert_eq!(stats.failed_sources, vec!["A"]);

    assert_eq!(coordinator.select_sources(Specialty::Dosage, 2), vec!["B"]);

    clock.advance(Duration::from_secs(299));
    assert_eq!(coordinator.select_sources(Specialty::Dosage, 2), vec!["B"]);

    clock.advance(Duration::from_secs(1));
    assert_eq!(coordinator.select_sources(Specialty::Dosage, 2), vec!["A", "B"]);
}

#[tokio::test]
async fn test_cooled_down_source_is_skipped_by_search() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock.clone())
        .fail_when_contains("site:a.example");

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    let calls_after_first = tool.invocation_count();

    clock.advance(Duration::from_secs(5));
    let results = coordinator
        .coordinated_search("DosageAgent", "naproxen", &tool, 2)
        .await
        .unwrap();

    assert_eq!(keys(&results), HashSet::from(["B"]));
    assert_eq!(tool.invocation_count(), calls_after_first + 1);
}

#[tokio::test]
async fn test_success_after_cooldown_clears_failure() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock.clone())
        .fail_when_contains("site:a.example");

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    assert_eq!(coordinator.get_cache_stats().failed_sources, vec!["A"]);

    clock.advance(Duration::from_secs(300));
    tool.recover();

    let results = coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();

    assert!(results["A"].success);
    assert!(coordinator.get_cache_stats().failed_sources.is_empty());
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_spaces_requests_across_agents() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    coordinator
        .coordinated_search("NurseAgent", "naproxen", &tool, 2)
        .await
        .unwrap();

    for marker in ["site:a.example", "site:b.example"] {
        let times = tool.call_times(marker);
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= TimeDelta::seconds(1));
    }
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn test_cache_hits_do_not_touch_rate_limit() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    for _ in 0..3 {
        coordinator
            .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
            .await
            .unwrap();
    }

    assert!(clock.sleeps().is_empty());
    assert_eq!(tool.invocation_count(), 2);
}

#[tokio::test]
async fn test_failed_invocations_still_count_for_rate_limit() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock.clone())
        .fail_when_contains("site:b.example");

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    coordinator.clear_cache();
    tool.recover();

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();

    let b_times = tool.call_times("site:b.example");
    assert_eq!(b_times.len(), 2);
    assert!(b_times[1] - b_times[0] >= TimeDelta::seconds(1));
}

#[tokio::test]
async fn test_longest_rate_limit_waits_without_overflow() {
    let mut config = two_source_config();
    config.sources[0].rate_limit_secs = MAX_RATE_LIMIT_SECS;
    let clock = ManualClock::default();
    let coordinator = SearchCoordinator::with_clock(&config, Arc::new(clock.clone())).unwrap();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    for query in ["ibuprofen", "naproxen", "aspirin"] {
        let results = coordinator
            .coordinated_search("DosageAgent", query, &tool, 1)
            .await
            .unwrap();
        assert!(results["A"].success);
    }

    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(86_400), Duration::from_secs(86_400)]
    );
}

#[test]
fn test_unrepresentable_rate_limit_is_rejected() {
    let mut config = two_source_config();
    config.sources[0].rate_limit_secs = 1.0e13;

    let result = SearchCoordinator::with_clock(&config, Arc::new(ManualClock::default()));
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::ValidationError(_)))
    ));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_coordinator() {
    let clock = ManualClock::default();
    let coordinator = Arc::new(
        SearchCoordinator::with_clock(&two_source_config(), Arc::new(clock.clone())).unwrap(),
    );
    let tool = Arc::new(MockSearchTool::new("dose info").with_clock(clock.clone()));

    let handles: Vec<_> = ["ibuprofen", "naproxen", "acetaminophen"]
        .into_iter()
        .map(|query| {
            let coordinator = Arc::clone(&coordinator);
            let tool = Arc::clone(&tool);
            tokio::spawn(async move {
                coordinator
                    .coordinated_search("DosageAgent", query, tool.as_ref(), 1)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let results = handle.await.unwrap().unwrap();
        assert!(results["A"].success);
    }

    let mut times = tool.call_times("site:a.example");
    times.sort();
    assert_eq!(times.len(), 3);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= TimeDelta::seconds(1));
    }
}

// =============================================================================
// Shared results, stats, reset
// =============================================================================

#[tokio::test]
async fn test_shared_results_exclude_requester_and_match_substring() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    coordinator
        .coordinated_search("DosageAgent", "Ibuprofen dose", &tool, 2)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(2));
    coordinator
        .coordinated_search("DosageAgent", "ibuprofen children", &tool, 2)
        .await
        .unwrap();

    let shared = coordinator.get_shared_results("IBUPROFEN", "ValidatorAgent");
    assert_eq!(keys(&shared), HashSet::from(["A", "B"]));
    let a_queries: Vec<&str> = shared["A"].iter().map(|r| r.query.as_str()).collect();
    assert_eq!(
        a_queries,
        vec![
            "site:a.example Ibuprofen dose dosage dose administration",
            "site:a.example ibuprofen children dosage dose administration",
        ]
    );

    assert!(coordinator
        .get_shared_results("ibuprofen", "DosageAgent")
        .is_empty());
    assert!(coordinator
        .get_shared_results("warfarin", "ValidatorAgent")
        .is_empty());

    let narrowed = coordinator.get_shared_results("children", "ValidatorAgent");
    assert_eq!(narrowed["B"].len(), 1);
}

#[tokio::test]
async fn test_shared_results_skip_failures() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock)
        .fail_when_contains("site:a.example");

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();

    let shared = coordinator.get_shared_results("ibuprofen", "ValidatorAgent");
    assert_eq!(keys(&shared), HashSet::from(["B"]));
    assert!(shared["B"].iter().all(|r| r.success));
}

#[tokio::test]
async fn test_stats_report_per_agent_breakdown() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock.clone());

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(1));
    coordinator
        .coordinated_search("NurseAgent", "naproxen", &tool, 1)
        .await
        .unwrap();

    let stats = coordinator.get_cache_stats();
    assert_eq!(stats.total_cached_results, 3);
    assert_eq!(stats.successful_searches, 3);
    assert_eq!(stats.failed_searches, 0);
    assert_eq!(stats.cache_hit_rate, "100.0%");
    assert_eq!(stats.agent_statistics["DosageAgent"].success, 2);
    assert_eq!(stats.agent_statistics["NurseAgent"].success, 1);
    assert_eq!(stats.tool_invocations, 3);
    assert_eq!(stats.cache_ttl_hours, 1.0);

    let status = coordinator.coordination_status();
    assert_eq!(status.status, "active");
    assert_eq!(status.agents_coordinated, 3);
    assert_eq!(status.sources, 2);
    assert_eq!(status.metrics, stats);
}

#[tokio::test]
async fn test_clear_cache_resets_cache_and_failures_but_not_rate_limits() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info")
        .with_clock(clock.clone())
        .fail_when_contains("site:a.example");

    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();
    coordinator.clear_cache();

    let stats = coordinator.get_cache_stats();
    assert_eq!(stats.total_cached_results, 0);
    assert!(stats.failed_sources.is_empty());
    assert_eq!(coordinator.select_sources(Specialty::Dosage, 2), vec!["A", "B"]);

    tool.recover();
    coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 2)
        .await
        .unwrap();

    // Both sources were invoked a moment ago, so the repeat had to wait
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    assert_eq!(tool.invocation_count(), 4);
}

#[tokio::test]
async fn test_serialized_result_shape() {
    let (coordinator, clock) = setup();
    let tool = MockSearchTool::new("dose info").with_clock(clock);

    let results = coordinator
        .coordinated_search("DosageAgent", "ibuprofen", &tool, 1)
        .await
        .unwrap();

    let value = serde_json::to_value(&results["A"]).unwrap();
    assert_eq!(value["source"], "A");
    assert_eq!(value["specialty"], "dosage");
    assert_eq!(value["success"], true);
    assert!(value.get("error_message").is_none());
}
