//! Cached Fetch CLI application
//!
//! Command-line interface for fetching JSON resources through the
//! cancellable, cache-aware fetch controller.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use cached_fetch::cli::{handle_cache, handle_get, handle_init_config, Cli, CommandContext, Commands};
use cached_fetch::config::{AppConfig, LoggingConfig};
use cached_fetch::constants::logging;
use cached_fetch::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let config = AppConfig::load(cli.global.config.clone()).await?;
    init_logging(&cli, &config.logging);

    info!("Cached Fetch v{} starting", env!("CARGO_PKG_VERSION"));

    let ctx = CommandContext {
        config,
        cache_dir: cli.global.cache_dir.clone(),
        quiet: cli.global.quiet,
    };

    match cli.command {
        Commands::Get(args) => {
            debug!("Executing get command");
            handle_get(args, &ctx).await
        }
        Commands::Cache(args) => {
            debug!("Executing cache command");
            handle_cache(args, &ctx).await
        }
        Commands::InitConfig => {
            debug!("Executing init-config command");
            handle_init_config(&ctx).await
        }
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, config: &LoggingConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("{}={}", logging::TARGET, level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(config.show_target)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
