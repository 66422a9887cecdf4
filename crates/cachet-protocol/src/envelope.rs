//! UDP envelope: one JSON object per datagram in each direction.
//!
//! Request: `{"cmd": "SET", "key": "k", "value": ..., "ttl": "10s"}`
//! Reply:   `{"cmd": "SET", "success": true, "value": ..., "error": ...}`

use std::fmt;
use std::str::FromStr;

use cachet_types::{Meta, Ttl};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Datagram commands. Parsed case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Set,
    Get,
    Delete,
    Has,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Get => "GET",
            Self::Delete => "DELETE",
            Self::Has => "HAS",
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Set, Self::Get, Self::Delete, Self::Has]
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request datagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub cmd: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Go-style duration string or signed nanosecond count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Ttl>,
}

impl Request {
    pub fn new(cmd: Command, key: impl Into<String>) -> Self {
        Self {
            cmd: cmd.as_str().to_string(),
            key: key.into(),
            value: None,
            ttl: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Parse a request from raw datagram bytes.
    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::MalformedRequest(e.to_string()))
    }

    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    pub fn command(&self) -> ProtocolResult<Command> {
        self.cmd.parse()
    }
}

/// `value` of a successful GET reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetValue {
    pub meta: Meta,
    pub data: Value,
}

/// A reply datagram. `cmd` echoes the request, or is empty when the
/// request could not be parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub cmd: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            success: true,
            value: None,
            error: None,
        }
    }

    pub fn with_value(cmd: impl Into<String>, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::ok(cmd)
        }
    }

    pub fn failure(cmd: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            cmd: cmd.into(),
            success: false,
            value: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::MalformedRequest(e.to_string()))
    }

    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}
