//! pump/mod.rs
//! Decompression engine: drives the codec across buffer boundaries under a
//! bounded output budget and forwards results downstream.

pub mod state;
pub mod sink;
pub mod engine;

pub use state::PumpState;
pub use sink::{BodySink, ForwardStatus, SinkError, VecSink};
pub use engine::{Advance, Blocked, Direction, Pump, Scope};
