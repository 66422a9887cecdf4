use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value cannot be represented in the structured format.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The payload is corrupt, truncated, or does not fit the requested shape.
    #[error("decoding failed: {0}")]
    Decoding(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
