//! telemetry/snapshot.rs
//!
//! Immutable per-stream telemetry view.
//!
//! Design notes:
//! - Built from live counters and the timer at any point; the pump keeps going.
//! - `expansion_ratio` is decompressed / compressed (>= 1.0 for typical bodies).
//! - Serializable so hosts can ship it as JSON.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub bytes_compressed: u64,
    pub bytes_decompressed: u64,
    pub members: u64,
    pub flush_boundaries: u64,
    pub codec_steps: u64,
    pub forwards: u64,
    pub backpressure_events: u64,
    pub pool_exhausted: u64,
    pub buffers_allocated: u64,
    pub expansion_ratio: f64,
    pub throughput_decompressed_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let expansion_ratio = if counters.bytes_compressed > 0 {
            counters.bytes_decompressed as f64 / counters.bytes_compressed as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_decompressed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            bytes_compressed: counters.bytes_compressed,
            bytes_decompressed: counters.bytes_decompressed,
            members: counters.members,
            flush_boundaries: counters.flush_boundaries,
            codec_steps: counters.codec_steps,
            forwards: counters.forwards,
            backpressure_events: counters.backpressure_events,
            pool_exhausted: counters.pool_exhausted,
            buffers_allocated: counters.buffers_allocated,
            expansion_ratio,
            throughput_decompressed_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times,
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// Invariants that must hold for any well-formed stream:
    /// - stage times fit inside elapsed
    /// - a completed member implies decoded bytes were consumed
    pub fn sanity_check(&self) -> bool {
        self.total_stage_time() <= self.elapsed
            && (self.members == 0 || self.bytes_compressed > 0)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
