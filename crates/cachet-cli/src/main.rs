use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

const DEFAULT_FILTER: &str = "cachet=info,tower_http=info";
const VERBOSE_FILTER: &str = "cachet=debug,tower_http=debug";

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);
    commands::run_command(cli)
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the verbose default.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
