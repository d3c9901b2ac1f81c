//! gunzip-core
//!
//! Streaming gzip decompression for chunked request/response bodies.
//! Bounded output memory, caller-driven suspension, no I/O of its own.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Building blocks
pub mod buffer;
pub mod codec;
pub mod telemetry;

// Engine and per-stream entry point
pub mod pump;
pub mod filter;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::{BufFlags, Buffer, OutputView};
    pub use crate::codec::{GzipInflater, InflateCodec};
    pub use crate::config::{BufferBudget, GunzipConfig};
    pub use crate::filter::{wants_decompression, GunzipFilter};
    pub use crate::pump::{Advance, BodySink, Blocked, Direction, ForwardStatus, Pump, PumpState, Scope, SinkError};
    pub use crate::types::GunzipError;
}
