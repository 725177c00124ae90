//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use etag_cache::cache::{FetchOptions, parse_duration};

#[derive(clap::Parser, Debug)]
#[command(
    name = "fetch",
    version,
    about = "Fetch JSON over HTTP(S) with ETag caching"
)]
pub struct Cli {
    /// URL to fetch (must start with http: or https:)
    pub url: String,

    /// Write the JSON to this file instead of standard output
    pub output_file: Option<PathBuf>,

    /// Custom cache directory (default: $ETAG_CACHE_DIR or .http-cache)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Request timeout (e.g., "30s", "2m"); no timeout by default
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Log cache and protocol decisions to standard error
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build FetchOptions from command-line arguments.
    pub fn to_fetch_options(&self) -> FetchOptions {
        FetchOptions {
            cache_dir: self.cache_dir.clone(),
            request_timeout: self.timeout,
            ..Default::default()
        }
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}' (expected e.g. 30s, 5m, 1h)"))
}
