use thiserror::Error;

use crate::{
    codec::CodecError,
    pump::SinkError,
};

/// Unified terminal error for one decompressed stream.
/// - Every variant is fatal except `Config` and `InputAfterEnd`, which are
///   caller mistakes and leave the stream state untouched.
/// - `Clone` so a failed pump can hand back the same error on every later call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GunzipError {
    /// Codec session could not start; no output was produced.
    #[error("inflate init failed: {0}")]
    InitFailure(String),

    /// Codec rejected the byte stream. Output already forwarded is not retracted.
    #[error("malformed gzip input: {0}")]
    MalformedInput(String),

    /// Body ended before the codec reported stream end (truncated or corrupted input).
    #[error("inflate returned {0} on body end")]
    PrematureEnd(String),

    /// Downstream collaborator reported an error.
    #[error("forwarding failed: {0}")]
    ForwardingFailure(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Data arrived after the logical body had already ended.
    #[error("input supplied after end of stream")]
    InputAfterEnd,
}

impl GunzipError {
    /// Whether this error moved (or would move) the pump into `Failed`.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GunzipError::Config(_) | GunzipError::InputAfterEnd)
    }
}

impl From<CodecError> for GunzipError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::InitFailure(msg) => GunzipError::InitFailure(msg),
            CodecError::Malformed(msg) => GunzipError::MalformedInput(msg),
            CodecError::NotStarted => GunzipError::InitFailure("codec session not started".into()),
        }
    }
}

impl From<SinkError> for GunzipError {
    fn from(e: SinkError) -> Self {
        GunzipError::ForwardingFailure(e.to_string())
    }
}
