//! Static registry of information sources.

use serde::Serialize;
use std::time::Duration;

use crate::types::{SourcePriority, Specialty};
use crate::utils::toml_config::{ConfigError, SourceConfig};

/// One catalog entry. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSpec {
    pub name: String,
    pub display_name: String,
    pub url_pattern: String,
    pub priority: SourcePriority,
    pub specialties: Vec<Specialty>,
    /// Minimum spacing between two requests to this source
    pub rate_limit: Duration,
}

impl SourceSpec {
    pub fn serves(&self, specialty: Specialty) -> bool {
        self.specialties.contains(&specialty)
    }

    /// `site:` hint prepended to enhanced queries, if the source has a domain
    pub fn scope_hint(&self) -> Option<String> {
        let pattern = self.url_pattern.trim();
        if pattern.is_empty() {
            None
        } else {
            Some(format!("site:{}", pattern))
        }
    }
}

impl TryFrom<&SourceConfig> for SourceSpec {
    type Error = ConfigError;

    fn try_from(config: &SourceConfig) -> Result<Self, Self::Error> {
        let rate_limit = Duration::try_from_secs_f64(config.rate_limit_secs).map_err(|e| {
            ConfigError::ValidationError(format!(
                "source '{}' has invalid rate_limit_secs: {}",
                config.name, e
            ))
        })?;

        Ok(Self {
            name: config.name.clone(),
            display_name: config
                .display_name
                .clone()
                .unwrap_or_else(|| config.name.clone()),
            url_pattern: config.url_pattern.clone(),
            priority: config.priority,
            specialties: config.specialties.clone(),
            rate_limit,
        })
    }
}

/// Ordered, read-only set of sources.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<SourceSpec>,
}

impl SourceCatalog {
    pub fn new(sources: Vec<SourceSpec>) -> Self {
        Self { sources }
    }

    /// Build the catalog from configuration, keeping declaration order
    pub fn from_config(sources: &[SourceConfig]) -> Result<Self, ConfigError> {
        let sources = sources
            .iter()
            .map(SourceSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sources))
    }

    pub fn get(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|source| source.name == name)
    }

    /// Declaration index of a source
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|source| source.name == name)
    }

    /// Sources serving `specialty`, best priority first.
    ///
    /// The sort is stable, so equal tiers keep declaration order.
    pub fn serving(&self, specialty: Specialty) -> Vec<&SourceSpec> {
        let mut matching: Vec<&SourceSpec> = self
            .sources
            .iter()
            .filter(|source| source.serves(specialty))
            .collect();
        matching.sort_by_key(|source| source.priority);
        matching
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceSpec> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
