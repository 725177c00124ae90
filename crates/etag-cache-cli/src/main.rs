use clap::Parser;
use etag_cache::cache::fetch_with_options;
use tracing_subscriber::EnvFilter;

mod args;

use args::Cli;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let opts = cli.to_fetch_options();
    match fetch_with_options(&cli.url, cli.output_file.as_deref(), &opts) {
        Ok(outcome) => {
            tracing::debug!(resolution = ?outcome.resolution, key = %outcome.key, "done");
            if cli.output_file.is_none() {
                println!("{}", outcome.value);
            }
        }
        Err(e) => {
            eprintln!("Error fetching {}: {}", cli.url, e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr, quiet unless `-v` or `RUST_LOG` asks otherwise.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "etag_cache=debug,fetch=debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
