use cachet_codec::CodecError;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Keys must be non-empty strings.
    #[error("key must not be empty")]
    EmptyKey,

    /// The value cannot be serialized for storage.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The stored payload cannot be materialized into the requested shape.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// A background task died; the store refuses further work.
    #[error("store is unhealthy: background task `{0}` failed")]
    Unhealthy(String),

    /// Reported by `close()` when a background task had panicked.
    #[error("background task `{0}` panicked")]
    TaskFailed(String),

    /// Background tasks need a Tokio runtime to be spawned on.
    #[error("no Tokio runtime available for background tasks")]
    RuntimeUnavailable,
}

impl StoreError {
    /// Errors caused by the caller's input rather than by the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyKey | Self::Encoding(_))
    }
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encoding(msg) => Self::Encoding(msg),
            CodecError::Decoding(msg) => Self::Decoding(msg),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
