//! Network adapters for Cachet.
//!
//! Serves a [`TtlStore`](cachet_store::TtlStore) over an HTTP JSON API
//! (axum) and a JSON-over-UDP datagram protocol. Adapters only see the
//! store through [`KeyValueStore`](cachet_store::KeyValueStore).
//!
//! # Shutdown
//!
//! [`CacheServer::run`] stops HTTP gracefully, drains in-flight datagrams,
//! then closes the store, each step bounded by the configured
//! `shutdown_timeout`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod udp;

#[cfg(test)]
mod testing;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{ApiError, SharedStore};
pub use router::build_router;
pub use server::CacheServer;
pub use udp::{dispatch, UdpServer};
