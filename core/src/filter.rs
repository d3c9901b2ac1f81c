//! filter.rs
//! Per-stream filter context: the entry point the body pipeline calls with
//! each new chunk.
//!
//! Summary: decides from config and headers whether a body gets decompressed,
//! then owns the pump and the downstream sink for that one body.

use tracing::debug;

use crate::buffer::Buffer;
use crate::codec::{GzipInflater, InflateCodec};
use crate::config::GunzipConfig;
use crate::constants::{CONTENT_ENCODING, GZIP_CODING};
use crate::pump::{Advance, BodySink, Direction, Pump, PumpState, Scope};
use crate::telemetry::TelemetrySnapshot;
use crate::types::GunzipError;

/// Whether a body travelling in `direction` with these headers should be
/// decompressed.
///
/// True when the role is enabled (`request_body` for requests, `enable` for
/// responses) and `Content-Encoding` is exactly `gzip`, ignoring ASCII case.
/// Codings lists such as `gzip, br` do not match.
pub fn wants_decompression<I, K, V>(config: &GunzipConfig, direction: Direction, headers: I) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let enabled = match direction {
        Direction::RequestBody => config.request_body,
        Direction::ResponseBody => config.enable,
    };
    if !enabled {
        return false;
    }

    headers.into_iter().any(|(name, value)| {
        name.as_ref().eq_ignore_ascii_case(CONTENT_ENCODING)
            && value.as_ref().eq_ignore_ascii_case(GZIP_CODING)
    })
}

/// One body being decompressed on its way to `sink`.
pub struct GunzipFilter<S, C: InflateCodec = GzipInflater> {
    pump: Pump<C>,
    sink: S,
}

impl<S: BodySink> GunzipFilter<S, GzipInflater> {
    /// # Errors
    /// - `Config` if the buffer budget is invalid.
    pub fn new(config: &GunzipConfig, direction: Direction, sink: S) -> Result<Self, GunzipError> {
        Self::with_codec(GzipInflater::new(), config, direction, sink)
    }

    /// Filter for this body if its headers and the config call for one.
    ///
    /// # Errors
    /// - `Config` if decompression applies but the buffer budget is invalid.
    pub fn for_headers<I, K, V>(
        config: &GunzipConfig,
        direction: Direction,
        headers: I,
        sink: S,
    ) -> Result<Option<Self>, GunzipError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if !wants_decompression(config, direction, headers) {
            debug!(%direction, "gunzip: not applicable");
            return Ok(None);
        }
        Self::new(config, direction, sink).map(Some)
    }
}

impl<S: BodySink, C: InflateCodec> GunzipFilter<S, C> {
    pub fn with_codec(codec: C, config: &GunzipConfig, direction: Direction, sink: S) -> Result<Self, GunzipError> {
        Ok(Self {
            pump: Pump::with_codec(codec, config.buffers, direction)?,
            sink,
        })
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.pump = self.pump.with_scope(scope);
        self
    }

    /// Feed the next chunks of the compressed body. An empty iterator asks
    /// for a flush-only pass.
    pub fn on_chunk<I>(&mut self, input: I) -> Result<Advance, GunzipError>
    where
        I: IntoIterator<Item = Buffer>,
    {
        self.pump.advance(input, &mut self.sink)
    }

    /// Decompressed body length, once the body has ended. Replaces the
    /// compressed `Content-Length` for whoever reads the body next.
    pub fn content_length(&self) -> Option<u64> {
        self.pump.decompressed_len()
    }

    pub fn state(&self) -> PumpState {
        self.pump.state()
    }

    pub fn pump(&self) -> &Pump<C> {
        &self.pump
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.pump.snapshot()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Drop the pump (tearing the codec down if still live) and return the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
