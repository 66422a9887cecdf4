//! JSON bodies of the HTTP API.

use cachet_types::{Meta, Ttl};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed strings the API answers with.
pub mod messages {
    pub const SUCCESS: &str = "success";
    pub const NOT_FOUND: &str = "not found";
    pub const INVALID_JSON_BODY: &str = "invalid json body";
    pub const INVALID_QUERY: &str = "invalid query parameters";
    pub const INTERNAL_ERROR: &str = "internal server error";
}

/// Query string of `POST /set/:key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct SetQuery {
    pub ttl: Ttl,
}

/// `{"message": ...}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn success() -> Self {
        Self {
            message: messages::SUCCESS.into(),
        }
    }
}

/// `{"error": ...}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of a successful `GET /get/:key`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetBody {
    pub meta: Meta,
    pub value: Value,
}

/// Body of `GET /has/:key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasBody {
    pub exists: bool,
}
