//! codec/gzip.rs
//!
//! gzip member decoder over `flate2`'s raw deflate inflater.
//!
//! Design notes:
//! - Header and trailer framing are handled here; `flate2::Decompress` only
//!   ever sees the deflate body, so the backend does not need gzip support.
//! - The inflater is always driven with `FlushDecompress::None`. Inflate emits
//!   output eagerly, so sync and finish requests need no backend-side flush;
//!   end-of-body checks belong to the pump.
//! - Trailer CRC-32 and ISIZE are verified per member.
//! - `reset_for_next_member` reuses the inflater allocation for concatenated members.

use crc32fast::Hasher;
use flate2::{Decompress, FlushDecompress, Status};
use tracing::trace;

use crate::codec::header::{HeaderInfo, HeaderParser};
use crate::codec::types::{CodecError, CodecStatus, FlushMode, InflateCodec, Progress};
use crate::constants::gzip;

#[derive(Debug)]
enum Phase {
    Header(HeaderParser),
    Body,
    Trailer { buf: [u8; gzip::TRAILER_LEN], have: usize },
    Done,
}

/// Streaming gzip decoder.
/// - Holds one inflater for the whole session.
/// - Implements `InflateCodec` for the pump.
pub struct GzipInflater {
    inflater: Option<Decompress>,
    phase: Phase,
    crc: Hasher,
    member_len: u32,
    header: Option<HeaderInfo>,
    members: u64,
    finished: bool,
}

impl Default for GzipInflater {
    fn default() -> Self {
        Self::new()
    }
}

impl GzipInflater {
    pub fn new() -> Self {
        Self {
            inflater: None,
            phase: Phase::Header(HeaderParser::new()),
            crc: Hasher::new(),
            member_len: 0,
            header: None,
            members: 0,
            finished: false,
        }
    }

    /// Members whose trailer has been verified.
    pub fn members_completed(&self) -> u64 {
        self.members
    }

    /// Header of the member currently being decoded, once parsed.
    pub fn header(&self) -> Option<HeaderInfo> {
        self.header
    }

    pub fn is_started(&self) -> bool {
        self.inflater.is_some()
    }
}

impl InflateCodec for GzipInflater {
    fn start(&mut self) -> Result<(), CodecError> {
        if self.finished {
            return Err(CodecError::InitFailure("session already finished".into()));
        }
        self.inflater = Some(Decompress::new(false));
        self.phase = Phase::Header(HeaderParser::new());
        self.crc = Hasher::new();
        self.member_len = 0;
        Ok(())
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: FlushMode) -> Result<Progress, CodecError> {
        let Self { inflater, phase, crc, member_len, header, members, .. } = self;
        let inflater = inflater.as_mut().ok_or(CodecError::NotStarted)?;

        let mut consumed = 0;
        let mut produced = 0;

        loop {
            match phase {
                Phase::Header(parser) => {
                    consumed += parser.push(&input[consumed..])?;
                    if !parser.is_complete() {
                        break;
                    }
                    let info = parser.info();
                    trace!(len = info.len, flags = info.flags, os = info.os, "gzip: member header");
                    *header = Some(info);
                    *phase = Phase::Body;
                }
                Phase::Body => {
                    let before_in = inflater.total_in();
                    let before_out = inflater.total_out();

                    let status = inflater
                        .decompress(&input[consumed..], &mut output[produced..], FlushDecompress::None)
                        .map_err(|e| CodecError::Malformed(e.to_string()))?;

                    let c = (inflater.total_in() - before_in) as usize;
                    let p = (inflater.total_out() - before_out) as usize;

                    crc.update(&output[produced..produced + p]);
                    *member_len = member_len.wrapping_add(p as u32);
                    consumed += c;
                    produced += p;

                    match status {
                        Status::StreamEnd => {
                            *phase = Phase::Trailer { buf: [0u8; gzip::TRAILER_LEN], have: 0 };
                        }
                        Status::Ok | Status::BufError => {
                            if (c == 0 && p == 0) || produced == output.len() {
                                break;
                            }
                        }
                    }
                }
                Phase::Trailer { buf, have } => {
                    let n = (gzip::TRAILER_LEN - *have).min(input.len() - consumed);
                    buf[*have..*have + n].copy_from_slice(&input[consumed..consumed + n]);
                    *have += n;
                    consumed += n;
                    if *have < gzip::TRAILER_LEN {
                        break;
                    }

                    let expected_crc = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                    let expected_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
                    if expected_crc != crc.clone().finalize() {
                        return Err(CodecError::Malformed("incorrect data check".into()));
                    }
                    if expected_len != *member_len {
                        return Err(CodecError::Malformed("incorrect length check".into()));
                    }

                    *members += 1;
                    *phase = Phase::Done;
                }
                Phase::Done => break,
            }
        }

        let status = match phase {
            Phase::Done => CodecStatus::StreamEnd,
            _ if !output.is_empty() && produced == output.len() => CodecStatus::NeedMoreOutputSpace,
            _ if consumed == input.len() => CodecStatus::NeedMoreInput,
            _ => CodecStatus::Ok,
        };

        trace!(consumed, produced, %flush, %status, "gzip: feed");
        Ok(Progress { consumed, produced, status })
    }

    fn reset_for_next_member(&mut self) -> Result<(), CodecError> {
        let inflater = self.inflater.as_mut().ok_or(CodecError::NotStarted)?;
        inflater.reset(false);
        self.phase = Phase::Header(HeaderParser::new());
        self.crc = Hasher::new();
        self.member_len = 0;
        self.header = None;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        // Safe to repeat: the inflater is only dropped once.
        self.inflater = None;
        self.finished = true;
        Ok(())
    }
}
