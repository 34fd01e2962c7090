//! Init command implementation
//!
//! Writes a starter `rxcoord.toml` containing the built-in source catalog and
//! agent mapping, ready to be edited.

use super::output::Output;
use crate::utils::toml_config::CoordinatorConfig;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Configuration written
    Success,
    /// rxcoord.toml already exists and --force was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

const HEADER: &str = "\
# rxcoord configuration
#
# Sources are consulted in priority order (primary, secondary, tertiary);
# sources sharing a tier keep the order they are declared in below.
# Agents not listed under [agents] search with the `general` specialty.

";

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing rxcoord configuration");

    let config_path = config.path.join("rxcoord.toml");
    if config_path.exists() && !config.force {
        output.warning("rxcoord.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !config.path.exists() {
        if let Err(e) = fs::create_dir_all(&config.path) {
            output.error(&format!("Failed to create {}: {}", config.path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    let content = match generate_config() {
        Ok(content) => content,
        Err(e) => {
            output.error(&format!("Failed to render configuration: {}", e));
            return InitResult::Error(e);
        }
    };

    if let Err(e) = fs::write(&config_path, content) {
        output.error(&format!("Failed to create rxcoord.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    info!(force = config.force, "Wrote {:?}", config_path);
    output.created("config", &config_path.display().to_string());
    output.success("Configuration ready");
    output.hint("Try: rxcoord search \"ibuprofen dose\" --agent DosageAgent");

    InitResult::Success
}

fn generate_config() -> Result<String, String> {
    let body = CoordinatorConfig::default()
        .to_toml_string()
        .map_err(|e| e.to_string())?;
    Ok(format!("{}{}", HEADER, body))
}
