//! Wire formats for Cachet.
//!
//! Shared by the server and by clients. Describes what travels over the
//! wire and nothing else: no sockets, no store.
//!
//! - [`endpoints`] -- HTTP route paths under `/api/v1`
//! - [`http`] -- JSON bodies returned by the HTTP API
//! - [`envelope`] -- the one-datagram-per-request UDP format

pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;

pub use endpoint::{endpoints, HealthResponse};
pub use envelope::{Command, GetValue, Reply, Request, MAX_DATAGRAM_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use http::{messages, ErrorBody, GetBody, HasBody, MessageBody, SetQuery};
