//! Command-line interface definitions for Awful Predictions.
//!
//! Every option has a default, so a bare invocation mines Marginal Revolution
//! into `validated_predictions.json` using the cache under `.cache/`.

use clap::Parser;

/// Command-line arguments for the Awful Predictions application.
///
/// # Examples
///
/// ```sh
/// # Defaults: Marginal Revolution, ./.cache, ./validated_predictions.json
/// awful_predictions
///
/// # With a reader API key and a different output file
/// READER_API_KEY=jina_... awful_predictions -o ./out/predictions.json
///
/// # Another blog with the same archive layout
/// awful_predictions --site-root https://example.com --archive-section blog --index-path archives
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the JSON file receiving the validated predictions
    #[arg(short, long, default_value = "validated_predictions.json")]
    pub output: String,

    /// Directory holding cached reader responses, extractions and verdicts
    #[arg(long, default_value = ".cache")]
    pub cache_dir: String,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Root URL of the blog
    #[arg(long, default_value = "https://marginalrevolution.com")]
    pub site_root: String,

    /// Path segment under which monthly archives live
    #[arg(long, default_value = "marginalrevolution")]
    pub archive_section: String,

    /// Path of the page listing every monthly archive
    #[arg(long, default_value = "date-archives")]
    pub index_path: String,

    /// Base URL of the reader service that turns pages into text
    #[arg(long, default_value = "https://r.jina.ai")]
    pub reader_base_url: String,

    /// Bearer token for the reader service
    #[arg(long, env = "READER_API_KEY", hide_env_values = true)]
    pub reader_api_key: Option<String>,

    /// Seconds to wait after the reader service rate limits a request
    #[arg(long, default_value_t = 10)]
    pub rate_limit_delay_secs: u64,

    /// Requests allowed per page before giving up on a rate-limited URL
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rate_limit_attempts: u32,
}
