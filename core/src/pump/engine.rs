//! pump/engine.rs
//!
//! Incremental decompression pump.
//!
//! Design notes:
//! - Input chunks are owned by the pump from `advance` until fully consumed;
//!   output buffers live in the pool arena and move out -> busy -> free by handle.
//! - One call runs an outer "forward while there is something to forward"
//!   loop around an inner "feed and drain" loop.
//! - Pool exhaustion is backpressure, never an error: the pump remembers it
//!   (`nomem`) and forwards busy buffers first on the next call.
//! - The decompressed byte counter follows codec-reported output per step.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use tracing::{debug, error, trace, warn};

use crate::buffer::{BufFlags, Buffer, BufferChain, BufferId, BufferPool};
use crate::codec::{CodecStatus, FlushMode, GzipInflater, InflateCodec};
use crate::config::BufferBudget;
use crate::pump::sink::{BodySink, ForwardStatus};
use crate::pump::state::PumpState;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::GunzipError;

/// Which body the pump decompresses. Only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    RequestBody,
    ResponseBody,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::RequestBody  => "request",
            Direction::ResponseBody => "response",
        };
        f.write_str(name)
    }
}

/// Whether the stream is the whole logical body or a piece of a larger one.
///
/// The final output buffer always carries `LAST_IN_CHAIN`; only `Main`
/// streams also mark it `LAST_BUF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Main,
    Subrequest,
}

/// Why `advance` returned without finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// All pending input is decoded and forwarded; call again with more input.
    Input,
    /// Downstream still holds unread output; call again once it drains.
    Downstream,
}

/// Result of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Logical body ended and every output buffer was drained downstream.
    Finished,
    AgainLater(Blocked),
}

enum AddData {
    Ready,
    Skip,
    Exhausted,
}

enum Step {
    Again,
    Break,
}

/// Streaming gunzip engine for one body.
pub struct Pump<C: InflateCodec = GzipInflater> {
    codec: C,
    codec_live: bool,
    pool: BufferPool,
    direction: Direction,
    scope: Scope,
    state: PumpState,

    input: VecDeque<Buffer>,
    in_buf: Option<Buffer>,
    out_buf: Option<BufferId>,
    out: BufferChain,

    flush: FlushMode,
    redo: bool,
    nomem: bool,
    done: bool,

    decompressed: u64,
    error: Option<GunzipError>,

    counters: TelemetryCounters,
    timer: TelemetryTimer,
}

impl Pump<GzipInflater> {
    /// # Errors
    /// - `Config` if `budget` has no buffers or an out-of-range buffer size.
    pub fn new(budget: BufferBudget, direction: Direction) -> Result<Self, GunzipError> {
        Self::with_codec(GzipInflater::new(), budget, direction)
    }
}

impl<C: InflateCodec> Pump<C> {
    /// # Errors
    /// - `Config` if `budget` has no buffers or an out-of-range buffer size.
    pub fn with_codec(codec: C, budget: BufferBudget, direction: Direction) -> Result<Self, GunzipError> {
        budget.validate()?;
        Ok(Self {
            codec,
            codec_live: false,
            pool: BufferPool::new(budget),
            direction,
            scope: Scope::Main,
            state: PumpState::Idle,
            input: VecDeque::new(),
            in_buf: None,
            out_buf: None,
            out: BufferChain::new(),
            flush: FlushMode::None,
            redo: false,
            nomem: false,
            done: false,
            decompressed: 0,
            error: None,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
        })
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Hand over new input and push as much decompressed output downstream as
    /// the buffer budget and the sink allow.
    ///
    /// `input` may be empty to request a flush-only pass (e.g. after the sink
    /// drained some busy buffers).
    ///
    /// # Errors
    /// - Any fatal error moves the pump to `Failed`; every later call returns
    ///   the same error.
    /// - `InputAfterEnd` for non-empty input once the body has ended; the pump
    ///   stays `Finished`.
    pub fn advance<I, S>(&mut self, input: I, sink: &mut S) -> Result<Advance, GunzipError>
    where
        I: IntoIterator<Item = Buffer>,
        S: BodySink + ?Sized,
    {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        if self.done {
            if input.into_iter().any(|b| !b.is_empty()) {
                warn!(direction = %self.direction, "gunzip: input after end of body");
                return Err(GunzipError::InputAfterEnd);
            }
            if self.pool.has_busy() {
                if let Err(e) = self.forward(sink) {
                    return Err(self.fail(e));
                }
            }
            return Ok(self.finished_status());
        }

        let before = self.input.len();
        self.input.extend(input);
        debug!(
            direction = %self.direction,
            state = %self.state,
            chunks = self.input.len() - before,
            "gunzip: advance"
        );

        if self.state == PumpState::Idle {
            if let Err(e) = self.start() {
                return Err(self.fail(e));
            }
        }

        match self.run(sink) {
            Ok(advance) => Ok(advance),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn start(&mut self) -> Result<(), GunzipError> {
        self.codec.start()?;
        self.codec_live = true;
        self.state = PumpState::Started;
        trace!(direction = %self.direction, budget = %self.pool.budget(), "gunzip: codec started");
        Ok(())
    }

    fn run<S: BodySink + ?Sized>(&mut self, sink: &mut S) -> Result<Advance, GunzipError> {
        let mut flush = if self.nomem {
            // Relieve backpressure before asking the pool again.
            self.forward(sink)?;
            self.nomem = false;
            false
        } else {
            self.pool.has_busy()
        };

        loop {
            self.fill()?;

            if self.out.is_empty() && !flush {
                let blocked = if self.pool.has_busy() { Blocked::Downstream } else { Blocked::Input };
                trace!(direction = %self.direction, ?blocked, state = %self.state, "gunzip: again later");
                return Ok(Advance::AgainLater(blocked));
            }

            if !self.done && self.state != PumpState::Flushed {
                self.state = PumpState::Draining;
            }
            self.forward(sink)?;
            self.nomem = false;
            flush = false;

            if self.done {
                return Ok(self.finished_status());
            }
        }
    }

    /// Inner loop: feed pending input to the codec until input runs out, the
    /// pool is exhausted, a flush boundary is queued, or the body ends.
    fn fill(&mut self) -> Result<(), GunzipError> {
        loop {
            match self.add_data() {
                AddData::Exhausted => {
                    self.state = PumpState::AwaitingInput;
                    return Ok(());
                }
                AddData::Skip => continue,
                AddData::Ready => {}
            }

            let Some(id) = self.get_buf() else {
                return Ok(());
            };

            match self.inflate(id)? {
                Step::Again => {}
                Step::Break => return Ok(()),
            }
        }
    }

    fn add_data(&mut self) -> AddData {
        let unread = self.in_buf.as_ref().map_or(0, Buffer::remaining);
        if unread > 0 || self.flush != FlushMode::None || self.redo {
            return AddData::Ready;
        }

        let Some(buf) = self.input.pop_front() else {
            return AddData::Exhausted;
        };

        self.flush = if buf.is_last() {
            FlushMode::Finish
        } else if buf.is_flush() {
            FlushMode::Sync
        } else {
            FlushMode::None
        };
        let empty = buf.is_empty();

        trace!(
            direction = %self.direction,
            len = buf.remaining(),
            flush = %self.flush,
            "gunzip: in"
        );
        self.in_buf = Some(buf);

        if empty && self.flush == FlushMode::None {
            return AddData::Skip;
        }
        AddData::Ready
    }

    fn get_buf(&mut self) -> Option<BufferId> {
        if let Some(id) = self.out_buf {
            return Some(id);
        }

        match self.pool.acquire() {
            Ok(id) => {
                self.counters.note_allocated(self.pool.allocated());
                self.out_buf = Some(id);
                Some(id)
            }
            Err(e) => {
                debug!(direction = %self.direction, %e, "gunzip: no free output buffer");
                self.counters.add_pool_exhausted();
                self.nomem = true;
                self.state = PumpState::AwaitingOutputBuffer;
                None
            }
        }
    }

    /// One codec step into the current output buffer `id`.
    fn inflate(&mut self, id: BufferId) -> Result<Step, GunzipError> {
        let input: &[u8] = match &self.in_buf {
            Some(b) => b.readable(),
            None => &[],
        };
        let out = self.pool.get_mut(id);

        let t = Instant::now();
        let progress = self.codec.feed(input, out.spare_mut(), self.flush);
        self.timer.add_stage_time(Stage::Inflate, t.elapsed());
        let progress = progress?;

        out.commit(progress.produced);
        let out_full = out.free_space() == 0;
        if let Some(b) = self.in_buf.as_mut() {
            b.consume(progress.consumed);
        }
        let avail_in = self.in_buf.as_ref().map_or(0, Buffer::remaining);

        self.decompressed += progress.produced as u64;
        self.counters.add_step(progress.consumed, progress.produced);

        trace!(
            direction = %self.direction,
            consumed = progress.consumed,
            produced = progress.produced,
            avail_in,
            out_full,
            status = %progress.status,
            flush = %self.flush,
            "gunzip: inflate"
        );

        if out_full {
            // The codec likely has more to emit from the same input.
            self.enqueue_out();
            self.redo = true;
            return Ok(Step::Again);
        }
        self.redo = false;

        // Bytes left after a member end precede any boundary this buffer carries.
        if progress.status == CodecStatus::StreamEnd && avail_in > 0 {
            self.codec.reset_for_next_member()?;
            self.counters.add_member();
            self.redo = true;
            debug!(direction = %self.direction, avail_in, "gunzip: next member");
            return Ok(Step::Again);
        }

        if self.flush == FlushMode::Sync && avail_in == 0 {
            self.flush = FlushMode::None;
            let flushed = if self.pool.get(id).is_empty() {
                self.pool.marker(BufFlags::FLUSH)
            } else {
                self.out_buf = None;
                self.pool.get_mut(id).flags |= BufFlags::FLUSH;
                id
            };
            self.out.push_back(flushed);
            self.counters.add_flush();
            self.state = PumpState::Flushed;
            return Ok(Step::Break);
        }

        if self.flush == FlushMode::Finish && avail_in == 0 {
            if progress.status != CodecStatus::StreamEnd {
                return Err(GunzipError::PrematureEnd(progress.status.to_string()));
            }
            self.inflate_end()?;
            return Ok(Step::Break);
        }

        if progress.consumed == 0 && progress.produced == 0 && avail_in > 0 {
            return Err(GunzipError::MalformedInput("inflate made no progress".into()));
        }

        if avail_in == 0 && self.input.is_empty() {
            if !self.pool.get(id).is_empty() {
                self.enqueue_out();
            }
            return Ok(Step::Break);
        }

        Ok(Step::Again)
    }

    fn inflate_end(&mut self) -> Result<(), GunzipError> {
        self.codec_live = false;
        self.codec.finish()?;
        self.counters.add_member();

        let id = match self.out_buf.take() {
            Some(id) if !self.pool.get(id).is_empty() => id,
            Some(id) => {
                self.pool.retire(id);
                self.pool.marker(BufFlags::empty())
            }
            None => self.pool.marker(BufFlags::empty()),
        };

        let mut flags = BufFlags::LAST_IN_CHAIN;
        if self.scope == Scope::Main {
            flags |= BufFlags::LAST_BUF;
        }
        self.pool.get_mut(id).flags |= flags;
        self.out.push_back(id);

        self.flush = FlushMode::None;
        self.in_buf = None;
        self.done = true;
        self.state = PumpState::Finished;
        self.timer.finish();

        debug!(
            direction = %self.direction,
            decompressed_len = self.decompressed,
            members = self.counters.members,
            "gunzip: inflate end"
        );
        Ok(())
    }

    fn enqueue_out(&mut self) {
        if let Some(id) = self.out_buf.take() {
            self.out.push_back(id);
        }
    }

    /// Offer undrained busy buffers plus the new out chain to `sink`, then
    /// recycle whatever it fully read.
    fn forward<S: BodySink + ?Sized>(&mut self, sink: &mut S) -> Result<(), GunzipError> {
        let queued = self.out.len();

        let t = Instant::now();
        let result = {
            let mut view = self.pool.view(&self.out);
            sink.forward(&mut view)
        };
        self.timer.add_stage_time(Stage::Forward, t.elapsed());

        let status = result?;
        self.counters.add_forward(status == ForwardStatus::Backpressure);

        let recycled = self.pool.release(&mut self.out);
        debug!(
            direction = %self.direction,
            queued,
            ?status,
            recycled,
            busy = self.pool.busy_len(),
            "gunzip: forwarded"
        );
        Ok(())
    }

    fn finished_status(&self) -> Advance {
        if self.pool.has_busy() {
            Advance::AgainLater(Blocked::Downstream)
        } else {
            Advance::Finished
        }
    }

    fn fail(&mut self, err: GunzipError) -> GunzipError {
        error!(direction = %self.direction, state = %self.state, error = %err, "gunzip: failed");
        self.state = PumpState::Failed;
        self.teardown();

        self.input.clear();
        self.in_buf = None;
        self.out_buf = None;
        self.out.clear();
        self.pool.clear();
        self.timer.finish();

        self.error = Some(err.clone());
        err
    }

    /// Release the codec session if it is still live. Runs at most once.
    fn teardown(&mut self) {
        if !self.codec_live {
            return;
        }
        self.codec_live = false;
        if let Err(e) = self.codec.finish() {
            warn!(direction = %self.direction, error = %e, "gunzip: codec teardown failed");
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Terminal error, if the pump has failed.
    pub fn error(&self) -> Option<&GunzipError> {
        self.error.as_ref()
    }

    /// Decompressed bytes produced so far.
    pub fn bytes_produced(&self) -> u64 {
        self.decompressed
    }

    /// True decompressed length, known once the body has ended.
    pub fn decompressed_len(&self) -> Option<u64> {
        self.done.then_some(self.decompressed)
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn counters(&self) -> &TelemetryCounters {
        &self.counters
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }
}

impl<C: InflateCodec> Drop for Pump<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C: InflateCodec> fmt::Debug for Pump<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pump")
            .field("direction", &self.direction)
            .field("scope", &self.scope)
            .field("state", &self.state)
            .field("pending_input", &self.input.len())
            .field("out", &self.out.len())
            .field("busy", &self.pool.busy_len())
            .field("decompressed", &self.decompressed)
            .finish()
    }
}
