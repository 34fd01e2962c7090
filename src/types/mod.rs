use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::toml_config::ConfigError;

// ============= Source Types =============

/// Authority tier of an information source.
///
/// Declaration order is preference order: the derived `Ord` ranks
/// `Primary` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePriority {
    /// Regulators and reference sites (FDA, MedlinePlus, Mayo Clinic)
    Primary,
    /// Professional drug references (Drugs.com, Medscape)
    Secondary,
    /// Supporting literature (WHO, PubMed)
    Tertiary,
}

impl fmt::Display for SourcePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourcePriority::Primary => "primary",
            SourcePriority::Secondary => "secondary",
            SourcePriority::Tertiary => "tertiary",
        };
        f.write_str(label)
    }
}

// ============= Specialty =============

/// Category of medical information a query is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Dosage,
    SideEffects,
    Interactions,
    Warnings,
    General,
    Verification,
}

impl Specialty {
    /// Every specialty, in declaration order
    pub const ALL: [Specialty; 6] = [
        Specialty::Dosage,
        Specialty::SideEffects,
        Specialty::Interactions,
        Specialty::Warnings,
        Specialty::General,
        Specialty::Verification,
    ];

    /// Wire name, also used when deriving cache keys
    pub fn as_str(self) -> &'static str {
        match self {
            Specialty::Dosage => "dosage",
            Specialty::SideEffects => "side_effects",
            Specialty::Interactions => "interactions",
            Specialty::Warnings => "warnings",
            Specialty::General => "general",
            Specialty::Verification => "verification",
        }
    }

    /// Keywords appended to enhanced queries when no override is configured
    pub fn default_keywords(self) -> Option<&'static str> {
        match self {
            Specialty::Dosage => Some("dosage dose administration"),
            Specialty::SideEffects => Some("side effects adverse reactions"),
            Specialty::Interactions => Some("drug interactions warnings"),
            Specialty::Warnings => Some("warnings precautions contraindications"),
            Specialty::Verification => Some("clinical information facts"),
            Specialty::General => None,
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Specialty::ALL
            .into_iter()
            .find(|specialty| specialty.as_str() == normalized)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown specialty: {}", s)))
    }
}

// ============= Search Results =============

/// Outcome of one query against one source.
///
/// Results are immutable once built; the cache hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Query text sent to the tool (the caller's raw query for failures)
    pub query: String,
    /// Catalog key of the source
    pub source: String,
    /// Returned content, empty on failure
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Agent that issued the search
    pub agent_name: String,
    /// Specialty the result was filed under
    pub specialty: Specialty,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SearchResult {
    /// Build a successful result
    pub fn success(
        query: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        agent_name: impl Into<String>,
        specialty: Specialty,
    ) -> Self {
        Self {
            query: query.into(),
            source: source.into(),
            content: content.into(),
            timestamp,
            agent_name: agent_name.into(),
            specialty,
            success: true,
            error_message: None,
        }
    }

    /// Build a failed result carrying the failure message
    pub fn failure(
        query: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        agent_name: impl Into<String>,
        specialty: Specialty,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            source: source.into(),
            content: String::new(),
            timestamp,
            agent_name: agent_name.into(),
            specialty,
            success: false,
            error_message: Some(error_message.into()),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AppError>;
