//! telemetry/timers.rs
//! Stage timers for one decompressed stream.
//!
//! Summary: the pump charges every codec `feed` to `Inflate` and every sink
//! call to `Forward`; the stream clock stops when the body ends or fails.

use std::fmt;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Codec `feed` calls.
    Inflate,
    /// Downstream `forward` calls.
    Forward,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Inflate => "inflate",
            Stage::Forward => "forward",
        };
        f.write_str(name)
    }
}

/// Wall time and call count for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTime {
    pub total: Duration,
    pub calls: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimes {
    pub inflate: StageTime,
    pub forward: StageTime,
}

impl StageTimes {
    pub fn add(&mut self, stage: Stage, dur: Duration) {
        let slot = match stage {
            Stage::Inflate => &mut self.inflate,
            Stage::Forward => &mut self.forward,
        };
        slot.total += dur;
        slot.calls += 1;
    }

    pub fn stage(&self, stage: Stage) -> StageTime {
        match stage {
            Stage::Inflate => self.inflate,
            Stage::Forward => self.forward,
        }
    }

    pub fn get(&self, stage: Stage) -> Duration {
        self.stage(stage).total
    }

    pub fn total(&self) -> Duration {
        self.inflate.total + self.forward.total
    }

    /// Whether every stage in `expected` ran at least once.
    pub fn has_all(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|&s| self.stage(s).calls > 0)
    }
}

/// Stream clock plus per-stage accumulators.
#[derive(Clone, Debug)]
pub struct TelemetryTimer {
    pub start_time: Instant,
    pub end_time: Option<Instant>,
    pub stage_times: StageTimes,
}

impl Default for TelemetryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryTimer {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            stage_times: StageTimes::default(),
        }
    }

    /// Stop the stream clock. Later calls keep the first end time.
    pub fn finish(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn add_stage_time(&mut self, stage: Stage, dur: Duration) {
        self.stage_times.add(stage, dur);
    }

    pub fn elapsed(&self) -> Duration {
        self.end_time
            .unwrap_or_else(Instant::now)
            .duration_since(self.start_time)
    }
}
