//! Command handlers for the Cached Fetch CLI
//!
//! Each handler wires the library pieces together: configuration, the
//! cache store, the HTTP transport and a [`FetchController`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::app::{
    CacheEntry, CacheKey, Capabilities, Clock, FetchController, FetchPhase, FetchRequest,
    FetchState, HttpTransport, RequestOptions, ResponseTransform, StringHash, SystemClock,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

use super::args::{parse_header, CacheAction, CacheArgs, CacheTarget, GetArgs};

/// Settings shared by all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: AppConfig,
    /// Cache directory override from the command line
    pub cache_dir: Option<PathBuf>,
    /// Suppress non-essential output
    pub quiet: bool,
}

/// Build the request described by `get` arguments and configuration defaults
pub fn build_request(args: &GetArgs, config: &AppConfig) -> Result<FetchRequest<serde_json::Value>> {
    let mut options = RequestOptions::default().with_method(args.method.clone());
    for header in config.request.headers.iter().chain(&args.headers) {
        let (name, value) = parse_header(header)
            .ok_or_else(|| AppError::generic(format!("Invalid header: {}", header)))?;
        options = options.with_header(name, value);
    }
    if let Some(body) = &args.data {
        options = options.with_body(body.clone());
    }
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    let ttl_secs = args.ttl.unwrap_or(config.request.ttl_secs);
    let transform = if args.jsonp {
        ResponseTransform::Jsonp
    } else {
        ResponseTransform::None
    };

    let mut request = FetchRequest::new(args.url.clone(), serde_json::Value::Null)
        .with_expiry_secs(ttl_secs)
        .with_transform(transform)
        .with_options(options);
    if let Some(key) = &args.cache_key {
        request = request.with_cache_key(key.clone());
    }
    Ok(request)
}

/// Handle the get command
pub async fn handle_get(args: GetArgs, ctx: &CommandContext) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let request = build_request(&args, &ctx.config)?;
    let store = ctx.config.cache_config(ctx.cache_dir.clone()).open_store()?;
    let transport = HttpTransport::with_config(&ctx.config.client_config())?;
    let capabilities = Capabilities::new(Arc::new(transport), store);

    info!("Fetching {}", args.url);
    let controller = FetchController::new(request, capabilities);

    let spinner = (!ctx.quiet && atty::is(atty::Stream::Stderr)).then(|| create_spinner(&args.url));

    let state = tokio::select! {
        state = controller.settled() => state,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, aborting request");
            controller.abort();
            controller.settled().await
        }
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    report_state(&args.url, &state)
}

fn report_state(url: &str, state: &FetchState<serde_json::Value>) -> Result<()> {
    match state.phase() {
        FetchPhase::Success => {
            let rendered = serde_json::to_string_pretty(&state.data)
                .map_err(|e| AppError::generic(format!("Failed to render response: {}", e)))?;
            println!("{}", rendered);
            Ok(())
        }
        FetchPhase::Failed => {
            let reason = state
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            Err(AppError::generic(format!("Fetching {} failed: {}", url, reason)))
        }
        FetchPhase::Canceled => Err(AppError::generic(format!("Fetching {} was canceled", url))),
        FetchPhase::Loading => Err(AppError::generic(format!(
            "Fetching {} did not complete",
            url
        ))),
    }
}

fn create_spinner(url: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Fetching {}", url));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Resolve the cache key a target refers to
pub fn resolve_key(target: &CacheTarget) -> Result<CacheKey> {
    match (&target.key, &target.url) {
        (Some(key), _) => Ok(CacheKey::explicit(key.clone())),
        (None, Some(url)) => Ok(CacheKey::from_locator(url, &StringHash)),
        (None, None) => Err(AppError::generic("Specify --key or --url")),
    }
}

/// Handle cache management commands
pub async fn handle_cache(args: CacheArgs, ctx: &CommandContext) -> Result<()> {
    let store = ctx.config.cache_config(ctx.cache_dir.clone()).open_store()?;

    match args.action {
        CacheAction::Show(target) => {
            let key = resolve_key(&target)?;
            match CacheEntry::load(store.as_ref(), &key)? {
                Some(entry) => {
                    let age = entry.age_secs(SystemClock.now_millis());
                    println!("Key:   {}", key);
                    println!("Age:   {:.1}s", age);
                    println!("Value: {}", entry.value);
                }
                None => println!("No cached entry for {}", key),
            }
        }
        CacheAction::Clear(target) => {
            let key = resolve_key(&target)?;
            CacheEntry::remove(store.as_ref(), &key)?;
            debug!("Removed cache slots for {}", key);
            if !ctx.quiet {
                println!("Cleared cache entry {}", key);
            }
        }
    }
    Ok(())
}

/// Handle the init-config command
pub async fn handle_init_config(ctx: &CommandContext) -> Result<()> {
    let path = AppConfig::initialize_first_run().await?;
    if !ctx.quiet {
        println!("Configuration file: {}", path.display());
    }
    Ok(())
}
