//! Foundation types for Cachet.
//!
//! Shared by the store, the wire protocol, and the server. Nothing in this
//! crate touches the network or spawns tasks.
//!
//! # Key Types
//!
//! - [`Meta`] -- creation and modification timestamps of a stored entry
//! - [`Ttl`] -- non-negative time-to-live, parsed from Go-style duration
//!   strings or signed nanosecond counts
//! - [`duration`] -- parse/format helpers for the `300ms` / `1h30m` syntax

pub mod duration;
pub mod error;
pub mod meta;
pub mod ttl;

pub use error::TypeError;
pub use meta::Meta;
pub use ttl::Ttl;
