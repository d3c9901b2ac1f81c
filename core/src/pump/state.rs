//! pump/state.rs
//! Lifecycle of one decompressed stream.

use std::fmt;

/// `Idle -> Started -> {AwaitingInput | AwaitingOutputBuffer | Draining | Flushed}* -> Finished`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PumpState {
    /// No `advance` call yet; codec not started.
    #[default]
    Idle,
    /// Codec session live, nothing decoded yet in this call.
    Started,
    /// Pending input is spent; waiting for the next chunk.
    AwaitingInput,
    /// Pool at budget; waiting for downstream to drain busy buffers.
    AwaitingOutputBuffer,
    /// Output produced and being forwarded.
    Draining,
    /// A sync-flush boundary was just forwarded.
    Flushed,
    /// Logical body ended; codec torn down.
    Finished,
    /// Fatal error; codec torn down.
    Failed,
}

impl PumpState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PumpState::Finished | PumpState::Failed)
    }

    pub fn is_started(self) -> bool {
        !matches!(self, PumpState::Idle)
    }
}

impl fmt::Display for PumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PumpState::Idle                 => "idle",
            PumpState::Started              => "started",
            PumpState::AwaitingInput        => "awaiting-input",
            PumpState::AwaitingOutputBuffer => "awaiting-output-buffer",
            PumpState::Draining             => "draining",
            PumpState::Flushed              => "flushed",
            PumpState::Finished             => "finished",
            PumpState::Failed               => "failed",
        };
        f.write_str(name)
    }
}
