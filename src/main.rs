use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use rxcoord::cli::init::{self, InitConfig, InitResult};
use rxcoord::cli::output::Output;
use rxcoord::cli::{Cli, Commands};
use rxcoord::utils::toml_config::{LogFormat, LoggingConfig};
use rxcoord::{CoordinatorConfig, SearchCoordinator, SearchResult, Specialty, WebSearchTool};
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };
    init_tracing(
        &CoordinatorConfig::logging_settings(&cli.config),
        cli.verbose,
        !cli.no_color,
    );

    match cli.command {
        Commands::Init { path, force } => match init::run(InitConfig { path, force }, &output) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => bail!(e),
        },

        Commands::Config { validate } => {
            let config = CoordinatorConfig::load(&cli.config)
                .with_context(|| format!("Invalid configuration {}", cli.config.display()))?;
            if validate {
                output.success(&format!("{} is valid", cli.config.display()));
                return Ok(());
            }
            show_config(&config, &output)
        }

        Commands::Sources { specialty } => {
            let config = load_or_default(&cli.config, &output)?;
            let coordinator = SearchCoordinator::new(&config)?;
            let specialty = specialty.map(|s| s.parse::<Specialty>()).transpose()?;
            show_sources(&coordinator, specialty, &output);
            Ok(())
        }

        Commands::Search {
            query,
            agents,
            max_sources,
            verifier,
            num_results,
            json,
        } => {
            let config = load_or_default(&cli.config, &output)?;

            let coordinator = Arc::new(SearchCoordinator::new(&config)?);
            let tool = WebSearchTool::with_num_results(num_results);
            let max_sources = max_sources.unwrap_or(coordinator.default_max_sources());

            let mut searches = Vec::with_capacity(agents.len());
            for agent in &agents {
                let results = coordinator
                    .coordinated_search(agent, &query, &tool, max_sources)
                    .await?;
                if !json {
                    output.header(&format!(
                        "{} ({})",
                        agent,
                        coordinator.specialty_for(agent)
                    ));
                    if results.is_empty() {
                        output.warning("No eligible sources");
                    }
                    for result in ordered(&coordinator, &results) {
                        output.search_result(result);
                    }
                }
                searches.push(json!({
                    "agent": agent,
                    "specialty": coordinator.specialty_for(agent),
                    "results": results,
                }));
            }

            let shared = verifier
                .as_deref()
                .map(|name| (name, coordinator.get_shared_results(&query, name)));
            let status = coordinator.coordination_status();

            if json {
                let report = json!({
                    "searches": searches,
                    "shared": shared.as_ref().map(|(name, results)| json!({
                        "agent": name,
                        "results": results,
                    })),
                    "status": status,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            if let Some((name, results)) = &shared {
                output.subheader(&format!("Shared results visible to {}", name));
                if results.is_empty() {
                    output.list_item("none");
                }
                for (source, found) in results {
                    output.kv(source, &format!("{} result(s)", found.len()));
                }
            }

            let stats = &status.metrics;
            output.subheader("Coordination stats");
            output.kv("cached results", &stats.total_cached_results.to_string());
            output.kv("successful", &stats.successful_searches.to_string());
            output.kv("failed", &stats.failed_searches.to_string());
            output.kv("hit rate", &stats.cache_hit_rate);
            output.kv("tool invocations", &stats.tool_invocations.to_string());
            output.kv(
                "cache lookups",
                &format!("{} hit / {} miss", stats.lookup_hits, stats.lookup_misses),
            );
            if !stats.failed_sources.is_empty() {
                output.kv("cooling down", &stats.failed_sources.join(", "));
            }
            Ok(())
        }
    }
}

/// Load the config file, falling back to built-in defaults when it is absent
fn load_or_default(path: &Path, output: &Output) -> anyhow::Result<CoordinatorConfig> {
    if path.exists() {
        CoordinatorConfig::load(path)
            .with_context(|| format!("Invalid configuration {}", path.display()))
    } else {
        output.hint(&format!(
            "{} not found, using built-in defaults (run `rxcoord init` to create one)",
            path.display()
        ));
        Ok(CoordinatorConfig::default())
    }
}

/// Install the global subscriber; called once before any command runs
fn init_tracing(logging: &LoggingConfig, verbose: bool, ansi: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rxcoord={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(ansi)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Results in catalog declaration order
fn ordered<'a>(
    coordinator: &SearchCoordinator,
    results: &'a HashMap<String, SearchResult>,
) -> Vec<&'a SearchResult> {
    let mut ordered: Vec<&SearchResult> = results.values().collect();
    ordered.sort_by_key(|result| {
        coordinator
            .catalog()
            .position(&result.source)
            .unwrap_or(usize::MAX)
    });
    ordered
}

fn show_config(config: &CoordinatorConfig, output: &Output) -> anyhow::Result<()> {
    output.header("Configuration");
    output.kv("cache ttl", &format!("{}s", config.cache.ttl_secs));
    output.kv("cache capacity", &config.cache.max_entries.to_string());
    output.kv("failure cooldown", &format!("{}s", config.failure.cooldown_secs));
    output.kv("default max sources", &config.default_max_sources.to_string());
    output.kv("sources", &config.sources.len().to_string());

    output.subheader("Agents");
    for (name, specialty) in &config.agents {
        output.kv(name, specialty.as_str());
    }

    output.subheader("Effective TOML");
    println!("{}", config.to_toml_string()?);
    Ok(())
}

fn show_sources(coordinator: &SearchCoordinator, specialty: Option<Specialty>, output: &Output) {
    let catalog = coordinator.catalog();
    let sources: Vec<_> = match specialty {
        Some(specialty) => {
            output.header(&format!("Sources for {} (selection order)", specialty));
            catalog.serving(specialty)
        }
        None => {
            output.header("Source catalog");
            catalog.iter().collect()
        }
    };

    output.table_header(&["Name", "Display name", "Priority", "Rate limit", "Domain"]);
    for source in sources {
        let rate_limit = format!("{:.1}s", source.rate_limit.as_secs_f64());
        let priority = source.priority.to_string();
        output.table_row(&[
            source.name.as_str(),
            source.display_name.as_str(),
            priority.as_str(),
            rate_limit.as_str(),
            source.url_pattern.as_str(),
        ]);
    }
}
