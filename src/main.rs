//! # Awful Predictions
//!
//! Mines a blog's monthly archives for forward-looking predictions made by
//! the blog's author, keeping only those with an explicit time frame and a
//! second, independent confirmation from the model.
//!
//! ## Usage
//!
//! ```sh
//! READER_API_KEY=jina_... awful_predictions -o ./validated_predictions.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Listing**: Read the date-archives index and collect monthly archive URLs
//! 2. **Extraction**: Ask the LLM for dated author predictions in each month
//! 3. **Validation**: Ask the LLM to confirm each prediction against its source
//! 4. **Output**: Write the confirmed predictions to a JSON file
//!
//! Every reader response, extraction and verdict is cached under the cache
//! directory, so an interrupted run picks up where it stopped.

use awful_aj::{config, config_dir};
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod archive;
mod cache;
mod cli;
mod extractor;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod prompts;
#[cfg(test)]
mod test_support;
mod utils;
mod validator;

use api::{extraction_template, validation_template, with_backoff};
use archive::ArchiveSite;
use cache::ContentCache;
use cli::Cli;
use extractor::Extractor;
use fetcher::{Fetcher, RateLimitPolicy, ReaderClient};
use utils::ensure_writable_dir;
use validator::Validator;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_predictions starting up");

    let args = Cli::parse();
    debug!(?args.output, ?args.cache_dir, ?args.site_root, "Parsed CLI arguments");

    // Early check: the cache must be writable before any paid call is made
    let cache_dir = PathBuf::from(&args.cache_dir);
    if let Err(e) = ensure_writable_dir(&cache_dir).await {
        error!(
            path = %cache_dir.display(),
            error = %e,
            "Cache directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let cache = ContentCache::new(cache_dir);
    info!(cache_dir = %cache.root().display(), "Content cache ready");

    let site = ArchiveSite::new(&args.site_root, &args.archive_section, &args.index_path)?;
    info!(index = %site.index_url(), section = site.section(), "Archive site configured");

    // ---- Load model config & templates ----
    let conf_file = match &args.config {
        Some(path) => PathBuf::from(path),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = conf_file.to_str().ok_or("Not a valid config filename")?;
    let config = config::load_config(config_path)?;
    info!(config_path, "Loaded configuration");

    let extraction_template = extraction_template()?;
    let validation_template = validation_template()?;

    // ---- Wire components ----
    let reader = ReaderClient::new(args.reader_base_url.clone(), args.reader_api_key.clone());
    let policy = RateLimitPolicy {
        delay: Duration::from_secs(args.rate_limit_delay_secs),
        max_attempts: args.max_rate_limit_attempts,
    };
    let fetcher = Fetcher::new(reader, cache.clone(), policy);
    debug!(reader = ?fetcher.service(), ?policy, "Reader configured");
    let extractor = Extractor::new(
        &fetcher,
        cache.clone(),
        with_backoff(&config, &extraction_template),
        &site,
    );
    let validator = Validator::new(
        &fetcher,
        cache.clone(),
        with_backoff(&config, &validation_template),
    );

    let summary = pipeline::run(&fetcher, &site, &extractor, &validator, Path::new(&args.output)).await?;

    let elapsed = start_time.elapsed();
    info!(
        months = summary.months,
        candidates = summary.candidates,
        validated = summary.validated,
        output = %args.output,
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
