use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cachet_server::ServerConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cachet",
    about = "Cachet -- key/value cache with per-key TTL, served over HTTP and UDP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the cache server
    Serve(ServeArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Flags shared by every command that needs a [`ServerConfig`].
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// HTTP listen address
    #[arg(long)]
    pub http_addr: Option<SocketAddr>,
    /// UDP listen address
    #[arg(long)]
    pub udp_addr: Option<SocketAddr>,
    /// Interval between expiration sweeps (e.g. 30s, 1m)
    #[arg(long, value_parser = parse_interval)]
    pub cleanup_interval: Option<Duration>,
}

impl ConfigOverrides {
    /// Flags take precedence over file and environment values.
    pub fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(addr) = self.http_addr {
            config.http_addr = addr;
        }
        if let Some(addr) = self.udp_addr {
            config.udp_addr = addr;
        }
        if let Some(interval) = self.cleanup_interval {
            config.store.cleanup_interval = interval;
        }
    }
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let interval = cachet_types::duration::parse_duration(s).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be positive".into());
    }
    Ok(interval)
}
