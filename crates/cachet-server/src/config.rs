use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use cachet_protocol::MAX_DATAGRAM_SIZE;
use cachet_store::StoreConfig;
use cachet_types::duration::{parse_duration, serde_text};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Overrides the HTTP port.
pub const ENV_HTTP_PORT: &str = "PORT";
/// Overrides the UDP port.
pub const ENV_UDP_PORT: &str = "UDP_PORT";
/// Overrides the store's sweep interval (Go-style duration).
pub const ENV_CLEANUP_INTERVAL: &str = "CACHET_CLEANUP_INTERVAL";

/// Process configuration.
///
/// Sources, lowest precedence first: defaults, a TOML file, the
/// environment, then command-line flags (applied by the binary).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub udp_addr: SocketAddr,
    /// Deadline for a single HTTP request or datagram.
    #[serde(with = "serde_text")]
    pub request_timeout: Duration,
    /// Bound on UDP drain and store teardown at shutdown.
    #[serde(with = "serde_text")]
    pub shutdown_timeout: Duration,
    /// Receive buffer for one datagram; longer datagrams are truncated.
    pub udp_buffer_size: usize,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            udp_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            request_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(10),
            udp_buffer_size: 8 * 1024,
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then `path` if given, then the process environment.
    pub fn resolve(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_HTTP_PORT) {
            self.http_addr.set_port(parse_port(ENV_HTTP_PORT, &port)?);
        }
        if let Some(port) = lookup(ENV_UDP_PORT) {
            self.udp_addr.set_port(parse_port(ENV_UDP_PORT, &port)?);
        }
        if let Some(interval) = lookup(ENV_CLEANUP_INTERVAL) {
            self.store.cleanup_interval = parse_duration(interval.trim())
                .map_err(|e| ServerError::Config(format!("{ENV_CLEANUP_INTERVAL}: {e}")))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.request_timeout.is_zero() {
            return Err(ServerError::Config("request_timeout must be positive".into()));
        }
        if self.udp_buffer_size == 0 || self.udp_buffer_size > MAX_DATAGRAM_SIZE {
            return Err(ServerError::Config(format!(
                "udp_buffer_size must be between 1 and {MAX_DATAGRAM_SIZE}"
            )));
        }
        if self.store.cleanup_interval.is_zero() {
            return Err(ServerError::Config(
                "store.cleanup_interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> ServerResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| ServerError::Config(format!("{name}: invalid port {value:?}")))
}
