use std::fmt;
use thiserror::Error;

/// How the pump wants the current input treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    #[default]
    None,
    /// Emit everything decodable so far; the stream continues.
    Sync,
    /// No input follows the current span.
    Finish,
}

impl fmt::Display for FlushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushMode::None   => "none",
            FlushMode::Sync   => "sync",
            FlushMode::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Codec-level outcome of one `feed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecStatus {
    /// Progress made; more input and output space may both still be used.
    Ok,
    /// Current member is complete (trailer verified).
    StreamEnd,
    /// All input was consumed and nothing more can be produced without more.
    NeedMoreInput,
    /// Output span is full; call again with fresh space.
    NeedMoreOutputSpace,
}

impl fmt::Display for CodecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecStatus::Ok                  => "ok",
            CodecStatus::StreamEnd           => "stream-end",
            CodecStatus::NeedMoreInput       => "need-input",
            CodecStatus::NeedMoreOutputSpace => "need-output",
        };
        f.write_str(name)
    }
}

/// Bytes moved by one `feed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub consumed: usize,
    pub produced: usize,
    pub status: CodecStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("codec init failed: {0}")]
    InitFailure(String),
    #[error("{0}")]
    Malformed(String),
    #[error("codec session not started")]
    NotStarted,
}

/// Streaming decompression capability over byte spans.
///
/// Contract:
/// - `start` before the first `feed`; `finish` exactly once at the end,
///   and it must be safe on a session that already failed.
/// - `feed` decodes as much as fits: on return either the output span is
///   full, the input span is spent, or the member has ended.
/// - After `StreamEnd`, further `feed` calls report `StreamEnd` without
///   consuming until `reset_for_next_member`.
pub trait InflateCodec {
    fn start(&mut self) -> Result<(), CodecError>;

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: FlushMode) -> Result<Progress, CodecError>;

    fn reset_for_next_member(&mut self) -> Result<(), CodecError>;

    fn finish(&mut self) -> Result<(), CodecError>;
}
