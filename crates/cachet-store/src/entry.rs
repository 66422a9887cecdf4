use std::sync::Arc;
use std::time::Instant;

use cachet_types::Meta;

/// A stored payload with its metadata and expiration instant.
#[derive(Debug, Clone)]
pub struct Entry {
    payload: Arc<[u8]>,
    meta: Meta,
    expires_at: Instant,
}

impl Entry {
    pub fn new(payload: Arc<[u8]>, meta: Meta, expires_at: Instant) -> Self {
        Self {
            payload,
            meta,
            expires_at,
        }
    }

    /// The encoded payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Shared handle to the payload (no copy).
    pub fn payload_shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.payload)
    }

    pub fn meta(&self) -> Meta {
        self.meta
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// An entry is expired from its expiration instant onwards.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}
