//! Search Result Cache
//!
//! Stores the most recent [`SearchResult`] per (query, source, specialty)
//! triple so that agents asking overlapping questions share one tool
//! invocation.
//!
//! # Cache Key Strategy
//!
//! Keys are SHA-256 digests of `normalized query | source | specialty`, where
//! the query is trimmed and lowercased. The requesting agent is deliberately
//! not part of the key: two agents issuing the same query for the same
//! specialty hit the same entry.
//!
//! # Expiry and Capacity
//!
//! Entries older than the TTL are ignored at lookup time but not removed.
//! The cache is bounded by `max_entries`; once full, the least recently
//! written entry is evicted. Lookups never reorder entries, so iteration
//! order is always write order.

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::Duration;

use super::clock::elapsed_since;
use crate::types::{SearchResult, Specialty};

/// Derive the cache key for a (query, source, specialty) triple
pub fn cache_key(query: &str, source: &str, specialty: Specialty) -> String {
    let normalized = query.trim().to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"|");
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(specialty.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lookup counters kept alongside the entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LookupCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded in-memory result cache with lazy TTL expiry
pub struct SearchCache {
    entries: LruCache<String, SearchResult>,
    ttl: Duration,
    counters: LookupCounters,
}

impl SearchCache {
    pub fn new(ttl: Duration, max_entries: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(max_entries),
            ttl,
            counters: LookupCounters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the stored result if it is younger than the TTL at `now`.
    ///
    /// Stale entries behave as misses and stay in place.
    pub fn get_if_valid(&mut self, key: &str, now: DateTime<Utc>) -> Option<SearchResult> {
        let fresh = self
            .entries
            .peek(key)
            .filter(|result| elapsed_since(now, result.timestamp) < self.ttl)
            .cloned();

        match fresh {
            Some(_) => self.counters.hits += 1,
            None => self.counters.misses += 1,
        }
        fresh
    }

    /// Store `result` under `key`, replacing any previous entry
    pub fn put(&mut self, key: String, result: SearchResult) {
        if let Some((displaced, _)) = self.entries.push(key.clone(), result) {
            if displaced != key {
                self.counters.evictions += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached results, oldest write first
    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.entries.iter().rev().map(|(_, result)| result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counters(&self) -> LookupCounters {
        self.counters
    }
}
