//! codec/mod.rs
//! Decompression codec adapter: span-in, span-out, explicit progress.
//!
//! The pump depends only on `InflateCodec`; `GzipInflater` is the shipped
//! implementation.

pub mod types;
pub mod header;
pub mod gzip;

pub use types::*;
pub use header::{HeaderInfo, HeaderParser};
pub use gzip::GzipInflater;
