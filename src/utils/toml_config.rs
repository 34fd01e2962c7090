//! TOML-based configuration for rxcoord
//!
//! This module provides declarative configuration for the source catalog,
//! agent specializations, query templates and cache policy via a TOML file
//! (`rxcoord.toml`). Every section is optional; missing sections fall back to
//! the built-in pharmacy deployment.
//!
//! Configuration is read once when the coordinator is built and is not
//! reloaded at runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{SourcePriority, Specialty};

/// Root configuration structure loaded from rxcoord.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Sources consulted per search when the caller does not say otherwise
    #[serde(default = "default_max_sources")]
    pub default_max_sources: usize,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub failure: FailureConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Source catalog; declaration order breaks priority ties
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Agent name to specialty mapping, kept sorted by name
    #[serde(default = "default_agents")]
    pub agents: BTreeMap<String, Specialty>,

    #[serde(default)]
    pub query_templates: QueryTemplates,
}

fn default_max_sources() -> usize {
    2
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_max_sources: default_max_sources(),
            cache: CacheConfig::default(),
            failure: FailureConfig::default(),
            logging: LoggingConfig::default(),
            sources: default_sources(),
            agents: default_agents(),
            query_templates: QueryTemplates::default(),
        }
    }
}

// ============= Cache Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of cached results in seconds (default: 1 hour)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached results before the oldest write is evicted
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// ============= Failure Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureConfig {
    /// Seconds a failed source stays out of selection (default: 5 minutes)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_cooldown_secs() -> u64 {
    300
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl FailureConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= Source Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Catalog key, reported in result maps
    pub name: String,

    /// Human readable name (defaults to the key)
    #[serde(default)]
    pub display_name: Option<String>,

    /// Domain used for `site:` scoping; empty disables the hint
    #[serde(default)]
    pub url_pattern: String,

    pub priority: SourcePriority,

    pub specialties: Vec<Specialty>,

    /// Minimum seconds between two requests to this source
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: f64,
}

fn default_rate_limit_secs() -> f64 {
    1.0
}

/// Longest accepted spacing between two requests to one source (one day)
pub const MAX_RATE_LIMIT_SECS: f64 = 86_400.0;

impl SourceConfig {
    fn new(
        name: &str,
        display_name: &str,
        url_pattern: &str,
        priority: SourcePriority,
        specialties: &[Specialty],
        rate_limit_secs: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name: Some(display_name.to_string()),
            url_pattern: url_pattern.to_string(),
            priority,
            specialties: specialties.to_vec(),
            rate_limit_secs,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    use SourcePriority::*;
    use Specialty::*;

    vec![
        SourceConfig::new(
            "FDA",
            "FDA.gov",
            "fda.gov",
            Primary,
            &[Warnings, Interactions, Verification],
            2.0,
        ),
        SourceConfig::new(
            "MedlinePlus",
            "MedlinePlus",
            "medlineplus.gov",
            Primary,
            &[Dosage, SideEffects, General],
            1.5,
        ),
        SourceConfig::new(
            "MayoClinic",
            "Mayo Clinic",
            "mayoclinic.org",
            Primary,
            &[Dosage, SideEffects, Verification],
            1.5,
        ),
        SourceConfig::new(
            "Drugs",
            "Drugs.com",
            "drugs.com",
            Secondary,
            &[Dosage, SideEffects, Interactions],
            1.0,
        ),
        SourceConfig::new(
            "Medscape",
            "Medscape",
            "medscape.com",
            Secondary,
            &[Interactions, Warnings, Verification],
            1.0,
        ),
        SourceConfig::new("WHO", "WHO", "who.int", Tertiary, &[Warnings, General], 2.0),
        SourceConfig::new(
            "PubMed",
            "PubMed",
            "pubmed.ncbi.nlm.nih.gov",
            Tertiary,
            &[Verification, General],
            1.0,
        ),
    ]
}

fn default_agents() -> BTreeMap<String, Specialty> {
    [
        ("DosageAgent", Specialty::Dosage),
        ("SideEffectsAgent", Specialty::SideEffects),
        ("WebSearchAgent", Specialty::Interactions),
        ("ValidatorAgent", Specialty::Verification),
    ]
    .into_iter()
    .map(|(name, specialty)| (name.to_string(), specialty))
    .collect()
}

// ============= Query Templates =============

/// Optional per-specialty keyword overrides for enhanced queries.
///
/// An unset field uses [`Specialty::default_keywords`]; an empty string
/// disables the suffix for that specialty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryTemplates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<String>,
}

impl QueryTemplates {
    /// Keyword suffix for a specialty, if any
    pub fn keywords(&self, specialty: Specialty) -> Option<&str> {
        let configured = match specialty {
            Specialty::Dosage => self.dosage.as_deref(),
            Specialty::SideEffects => self.side_effects.as_deref(),
            Specialty::Interactions => self.interactions.as_deref(),
            Specialty::Warnings => self.warnings.as_deref(),
            Specialty::General => self.general.as_deref(),
            Specialty::Verification => self.verification.as_deref(),
        };

        match configured {
            Some(keywords) if keywords.trim().is_empty() => None,
            Some(keywords) => Some(keywords.trim()),
            None => specialty.default_keywords(),
        }
    }
}

// ============= Errors =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CoordinatorConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        info!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            sources = config.sources.len(),
            agents = config.agents.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Logging section of the file at `path`, or the defaults.
    ///
    /// Read before the tracing subscriber exists, so it never logs and never
    /// fails; a broken file is reported later by [`CoordinatorConfig::load`].
    pub fn logging_settings<P: AsRef<Path>>(path: P) -> LoggingConfig {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str::<CoordinatorConfig>(&content).ok())
            .map(|config| config.logging)
            .unwrap_or_default()
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be greater than zero".to_string(),
            ));
        }

        if self.default_max_sources == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_sources must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "source name must not be empty".to_string(),
                ));
            }

            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate source '{}'",
                    source.name
                )));
            }

            if source.specialties.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "source '{}' serves no specialties",
                    source.name
                )));
            }

            if !(0.0..=MAX_RATE_LIMIT_SECS).contains(&source.rate_limit_secs) {
                return Err(ConfigError::ValidationError(format!(
                    "source '{}' has invalid rate_limit_secs {} (expected 0 to {})",
                    source.name, source.rate_limit_secs, MAX_RATE_LIMIT_SECS
                )));
            }
        }

        if let Some(agent) = self.agents.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "agent name '{}' must not be blank",
                agent
            )));
        }

        Ok(())
    }
}
