//! telemetry/counters.rs
//! Mutable counters collected while one body streams through the pump.
//!
//! Summary: byte and event counts per stream. Converted into an immutable
//! `TelemetrySnapshot` on demand.
use std::ops::AddAssign;
use serde::{Deserialize, Serialize};

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub bytes_compressed: u64,
    pub bytes_decompressed: u64,
    pub members: u64,
    pub flush_boundaries: u64,
    pub codec_steps: u64,
    pub forwards: u64,
    pub backpressure_events: u64,
    pub pool_exhausted: u64,
    pub buffers_allocated: u64,
}

impl TelemetryCounters {
    /// Record one codec step.
    ///
    /// - `consumed`: compressed bytes taken from the input span
    /// - `produced`: decompressed bytes written to the output span
    pub fn add_step(&mut self, consumed: usize, produced: usize) {
        self.codec_steps += 1;
        self.bytes_compressed += consumed as u64;
        self.bytes_decompressed += produced as u64;
    }

    /// A gzip member ended with a verified trailer.
    pub fn add_member(&mut self) {
        self.members += 1;
    }

    pub fn add_flush(&mut self) {
        self.flush_boundaries += 1;
    }

    /// One call into the downstream sink; `backpressure` if it held output back.
    pub fn add_forward(&mut self, backpressure: bool) {
        self.forwards += 1;
        if backpressure {
            self.backpressure_events += 1;
        }
    }

    pub fn add_pool_exhausted(&mut self) {
        self.pool_exhausted += 1;
    }

    /// High-water mark of pooled buffers.
    pub fn note_allocated(&mut self, allocated: usize) {
        self.buffers_allocated = self.buffers_allocated.max(allocated as u64);
    }

    // Per-stream counters are merged, never shared, when a host aggregates
    // many streams.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_decompressed += other.bytes_decompressed;
        self.members += other.members;
        self.flush_boundaries += other.flush_boundaries;
        self.codec_steps += other.codec_steps;
        self.forwards += other.forwards;
        self.backpressure_events += other.backpressure_events;
        self.pool_exhausted += other.pool_exhausted;
        self.buffers_allocated = self.buffers_allocated.max(other.buffers_allocated);
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
