//! CLI module for rxcoord
//!
//! Provides command-line interface parsing for the rxcoord binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rxcoord - search coordination for pharmacy specialist agents
///
/// Deduplicates searches across agents, routes each agent to the sources
/// serving its specialty, rate-limits sources and cools down failing ones.
#[derive(Parser, Debug)]
#[command(
    name = "rxcoord",
    version,
    about = "rxcoord - search coordination for pharmacy specialist agents",
    long_about = "Deduplicates web searches issued by specialist agents, routes each agent to\n\
                  authoritative sources for its specialty, enforces per-source rate limits\n\
                  and keeps failing sources in cooldown.",
    after_help = "EXAMPLES:\n    \
                  rxcoord init                                  # Write a default rxcoord.toml\n    \
                  rxcoord sources --specialty dosage            # Sources an agent would use\n    \
                  rxcoord search \"ibuprofen dose\" --agent DosageAgent --agent ValidatorAgent"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "rxcoord.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default rxcoord.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing rxcoord.toml
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration information
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// List the source catalog
    Sources {
        /// Only show sources serving this specialty, in selection order
        #[arg(short, long)]
        specialty: Option<String>,
    },

    /// Run a coordinated web search on behalf of one or more agents
    Search {
        /// Search query
        query: String,

        /// Agent issuing the query; repeat to simulate several agents
        #[arg(short, long = "agent", default_value = "DosageAgent")]
        agents: Vec<String>,

        /// Maximum number of sources per agent (defaults to the configured value)
        #[arg(short, long)]
        max_sources: Option<usize>,

        /// Agent whose view of shared results is printed afterwards
        #[arg(long)]
        verifier: Option<String>,

        /// Number of web hits kept per source
        #[arg(long, default_value = "5")]
        num_results: usize,

        /// Print results and statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
