//! codec/header.rs
//! Incremental gzip member header parser (RFC 1952 §2.3).
//!
//! Bytes may arrive split at any point; `push` consumes what it can and
//! remembers where it stopped. Optional fields are skipped, not stored, so a
//! hostile FNAME/FEXTRA cannot grow memory.

use std::fmt;
use crc32fast::Hasher;

use crate::codec::types::CodecError;
use crate::constants::{gzip, gzip_flags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Fixed,
    ExtraLen,
    Extra,
    Name,
    Comment,
    HeaderCrc,
    Done,
}

/// Fixed fields of a parsed member header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderInfo {
    pub flags: u8,
    pub mtime: u32,
    pub xfl: u8,
    pub os: u8,
    /// Total header length in bytes, optional fields included.
    pub len: usize,
}

#[derive(Clone)]
pub struct HeaderParser {
    stage: Stage,
    fixed: [u8; gzip::HEADER_LEN],
    scratch: [u8; 2],
    have: usize,
    extra_left: usize,
    crc: Hasher,
    info: HeaderInfo,
}

impl fmt::Debug for HeaderParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderParser")
            .field("stage", &self.stage)
            .field("info", &self.info)
            .finish()
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderParser {
    pub fn new() -> Self {
        Self {
            stage: Stage::Fixed,
            fixed: [0u8; gzip::HEADER_LEN],
            scratch: [0u8; 2],
            have: 0,
            extra_left: 0,
            crc: Hasher::new(),
            info: HeaderInfo::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn info(&self) -> HeaderInfo {
        self.info
    }

    /// Consume header bytes from `input`. Returns how many were used; stops
    /// early once the header is complete.
    ///
    /// # Errors
    /// - `Malformed` on bad magic, unknown method, reserved flags, or FHCRC mismatch.
    pub fn push(&mut self, input: &[u8]) -> Result<usize, CodecError> {
        let mut used = 0;

        while used < input.len() && self.stage != Stage::Done {
            let rest = &input[used..];
            let n = match self.stage {
                Stage::Fixed => {
                    let n = rest.len().min(gzip::HEADER_LEN - self.have);
                    self.fixed[self.have..self.have + n].copy_from_slice(&rest[..n]);
                    self.have += n;
                    if self.have == gzip::HEADER_LEN {
                        self.check_fixed()?;
                        self.have = 0;
                        self.stage = self.next_stage(Stage::Fixed);
                    }
                    n
                }
                Stage::ExtraLen => {
                    let n = rest.len().min(2 - self.have);
                    self.scratch[self.have..self.have + n].copy_from_slice(&rest[..n]);
                    self.have += n;
                    if self.have == 2 {
                        self.extra_left = u16::from_le_bytes(self.scratch) as usize;
                        self.have = 0;
                        self.stage = if self.extra_left == 0 {
                            self.next_stage(Stage::Extra)
                        } else {
                            Stage::Extra
                        };
                    }
                    n
                }
                Stage::Extra => {
                    let n = rest.len().min(self.extra_left);
                    self.extra_left -= n;
                    if self.extra_left == 0 {
                        self.stage = self.next_stage(Stage::Extra);
                    }
                    n
                }
                Stage::Name | Stage::Comment => match rest.iter().position(|&b| b == 0) {
                    Some(end) => {
                        self.stage = self.next_stage(self.stage);
                        end + 1
                    }
                    None => rest.len(),
                },
                Stage::HeaderCrc => {
                    let n = rest.len().min(2 - self.have);
                    self.scratch[self.have..self.have + n].copy_from_slice(&rest[..n]);
                    self.have += n;
                    if self.have == 2 {
                        let expected = u16::from_le_bytes(self.scratch);
                        let actual = (self.crc.clone().finalize() & 0xffff) as u16;
                        if expected != actual {
                            return Err(CodecError::Malformed("header crc mismatch".into()));
                        }
                        self.have = 0;
                        self.stage = Stage::Done;
                    }
                    // The header CRC does not cover itself.
                    self.info.len += n;
                    used += n;
                    continue;
                }
                Stage::Done => 0,
            };

            self.crc.update(&rest[..n]);
            self.info.len += n;
            used += n;
        }

        Ok(used)
    }

    fn check_fixed(&mut self) -> Result<(), CodecError> {
        let h = &self.fixed;
        if h[0..2] != gzip::MAGIC {
            return Err(CodecError::Malformed("incorrect header check".into()));
        }
        if h[2] != gzip::CM_DEFLATE {
            return Err(CodecError::Malformed(format!("unknown compression method: {}", h[2])));
        }
        if h[3] & gzip_flags::RESERVED != 0 {
            return Err(CodecError::Malformed(format!("unknown header flags set: 0x{:02x}", h[3])));
        }

        self.info.flags = h[3];
        self.info.mtime = u32::from_le_bytes([h[4], h[5], h[6], h[7]]);
        self.info.xfl = h[8];
        self.info.os = h[9];
        Ok(())
    }

    /// First optional field after `from` whose flag is set, else `Done`.
    fn next_stage(&self, from: Stage) -> Stage {
        const OPTIONAL: [(Stage, u8); 4] = [
            (Stage::ExtraLen, gzip_flags::FEXTRA),
            (Stage::Name, gzip_flags::FNAME),
            (Stage::Comment, gzip_flags::FCOMMENT),
            (Stage::HeaderCrc, gzip_flags::FHCRC),
        ];
        OPTIONAL
            .iter()
            .filter(|(stage, _)| *stage > from)
            .find(|(_, bit)| self.info.flags & bit != 0)
            .map(|(stage, _)| *stage)
            .unwrap_or(Stage::Done)
    }
}
