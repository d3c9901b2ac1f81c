//! config.rs
//! Per-location gunzip settings: enable flags and the output buffer budget.
//!
//! Loading is the host's job; this module only holds, parses and validates values.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::types::GunzipError;

/// Output buffer budget: at most `count` buffers of `size` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferBudget {
    pub count: usize,
    pub size: usize,
}

impl Default for BufferBudget {
    fn default() -> Self {
        Self { count: DEFAULT_BUFFER_COUNT, size: DEFAULT_BUFFER_SIZE }
    }
}

impl BufferBudget {
    pub fn new(count: usize, size: usize) -> Self {
        Self { count, size }
    }

    pub fn validate(&self) -> Result<(), GunzipError> {
        if self.count == 0 {
            return Err(GunzipError::Config("buffer count must be positive".into()));
        }
        if self.size == 0 || self.size > MAX_BUFFER_SIZE {
            return Err(GunzipError::Config(format!(
                "invalid buffer size: {}, must be in 1..={}",
                self.size, MAX_BUFFER_SIZE
            )));
        }
        Ok(())
    }

    /// Upper bound on pooled output memory.
    pub fn total_bytes(&self) -> usize {
        self.count * self.size
    }
}

/// Directive syntax: `"<count> <size>"`, size with an optional `k`/`m` suffix.
impl FromStr for BufferBudget {
    type Err = GunzipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (count, size) = match (parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(s), None) => (c, s),
            _ => return Err(GunzipError::Config(format!("expected \"<count> <size>\", got {s:?}"))),
        };

        let count = count
            .parse::<usize>()
            .map_err(|_| GunzipError::Config(format!("invalid buffer count: {count:?}")))?;
        let size = parse_size(size)?;

        let budget = Self { count, size };
        budget.validate()?;
        Ok(budget)
    }
}

impl fmt::Display for BufferBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.count, self.size)
    }
}

fn parse_size(raw: &str) -> Result<usize, GunzipError> {
    let (digits, scale) = match raw.as_bytes().last() {
        Some(b'k' | b'K') => (&raw[..raw.len() - 1], 1024),
        Some(b'm' | b'M') => (&raw[..raw.len() - 1], 1024 * 1024),
        _ => (raw, 1),
    };
    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| GunzipError::Config(format!("invalid buffer size: {raw:?}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunzipConfig {
    /// Decompress gzip-encoded response bodies.
    pub enable: bool,

    /// Output buffer budget shared by both directions of one stream.
    pub buffers: BufferBudget,

    /// Decompress gzip-encoded request bodies.
    pub request_body: bool,
}

impl Default for GunzipConfig {
    fn default() -> Self {
        Self {
            enable: false,
            buffers: BufferBudget::default(),
            request_body: false,
        }
    }
}

impl GunzipConfig {
    pub fn new(enable: bool, buffers: BufferBudget, request_body: bool) -> Self {
        Self { enable, buffers, request_body }
    }

    /// Request-body decompression only, with the given budget.
    pub fn request_body(buffers: BufferBudget) -> Self {
        Self { enable: false, buffers, request_body: true }
    }

    pub fn validate(&self) -> Result<(), GunzipError> {
        self.buffers.validate()
    }

    /// Parse and validate a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, GunzipError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GunzipError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
