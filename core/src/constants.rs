//! constants.rs
//! Defaults and sanity bounds shared by the config, pool and codec layers.

/// Page size used to derive the default output buffer geometry.
pub const PAGE_SIZE: usize = 4096;

/// Defaults when the directive is not configured:
/// `128 KiB / page` buffers of one page each.
pub const DEFAULT_BUFFER_SIZE: usize = PAGE_SIZE;
pub const DEFAULT_BUFFER_COUNT: usize = (128 * 1024) / PAGE_SIZE;

/// Max output buffer size sanity bound (32 MiB).
pub const MAX_BUFFER_SIZE: usize = 32 * 1024 * 1024;

/// gzip member framing (RFC 1952).
pub mod gzip {
    pub const MAGIC: [u8; 2] = [0x1f, 0x8b];
    pub const CM_DEFLATE: u8 = 8;

    /// Fixed header: magic(2) cm(1) flg(1) mtime(4) xfl(1) os(1).
    pub const HEADER_LEN: usize = 10;
    /// Trailer: crc32(4) isize(4), both little endian.
    pub const TRAILER_LEN: usize = 8;
}

/// Header flag bitmask (FLG byte).
pub mod gzip_flags {
    pub const FTEXT: u8    = 0x01;
    pub const FHCRC: u8    = 0x02;
    pub const FEXTRA: u8   = 0x04;
    pub const FNAME: u8    = 0x08;
    pub const FCOMMENT: u8 = 0x10;
    /// Bits 5..7 must be zero.
    pub const RESERVED: u8 = 0xe0;
}

/// Header that marks a compressed body.
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const GZIP_CODING: &str = "gzip";
