use std::fmt;
use bytes::Bytes;

bitflags::bitflags! {
    /// ## Buffer flags (explicit, extensible)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufFlags: u8 {
        /// Last chunk of the entire logical body
        const LAST_BUF = 0b0000_0001;

        /// Last chunk this producer will hand over (set on subrequest bodies too)
        const LAST_IN_CHAIN = 0b0000_0010;

        /// Producer requested a flush at this point
        const FLUSH = 0b0000_0100;

        /// Zero-length marker carrying flags only; never pooled
        const SYNTHETIC = 0b0000_1000;
    }
}

/// Backing memory of a buffer.
/// - `Shared`: read-only input chunk handed over by the upstream producer.
/// - `Owned`: fixed-size writable region owned by the pool.
#[derive(Clone)]
enum Region {
    Empty,
    Shared(Bytes),
    Owned(Box<[u8]>),
}

impl Region {
    fn as_slice(&self) -> &[u8] {
        match self {
            Region::Empty => &[],
            Region::Shared(b) => b,
            Region::Owned(b) => b,
        }
    }
}

/// Typed view over a byte region `[0, capacity)` with a read cursor `pos`
/// and a write cursor `last`.
///
/// Invariant: `pos <= last <= capacity`.
#[derive(Clone)]
pub struct Buffer {
    region: Region,
    pos: usize,
    last: usize,
    pub flags: BufFlags,
}

impl Buffer {
    /// Writable buffer of `size` bytes, empty.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            region: Region::Owned(vec![0u8; size].into_boxed_slice()),
            pos: 0,
            last: 0,
            flags: BufFlags::empty(),
        }
    }

    /// Read-only buffer whose whole content is unread.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let last = data.len();
        Self {
            region: Region::Shared(data),
            pos: 0,
            last,
            flags: BufFlags::empty(),
        }
    }

    /// Zero-length buffer that only carries `flags`.
    pub fn marker(flags: BufFlags) -> Self {
        Self {
            region: Region::Empty,
            pos: 0,
            last: 0,
            flags: flags | BufFlags::SYNTHETIC,
        }
    }

    pub fn with_flags(mut self, flags: BufFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Final chunk of the logical body.
    pub fn last(data: impl Into<Bytes>) -> Self {
        Self::from_bytes(data).with_flags(BufFlags::LAST_BUF)
    }

    /// Chunk followed by a flush request.
    pub fn flush(data: impl Into<Bytes>) -> Self {
        Self::from_bytes(data).with_flags(BufFlags::FLUSH)
    }

    pub fn capacity(&self) -> usize {
        self.region.as_slice().len()
    }

    /// Unread bytes, `last - pos`.
    pub fn remaining(&self) -> usize {
        self.last - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Writable space after `last`. Zero for read-only regions.
    pub fn free_space(&self) -> usize {
        match self.region {
            Region::Owned(_) => self.capacity() - self.last,
            _ => 0,
        }
    }

    pub fn readable(&self) -> &[u8] {
        &self.region.as_slice()[self.pos..self.last]
    }

    /// Spare space after the write cursor.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let last = self.last;
        match &mut self.region {
            Region::Owned(b) => &mut b[last..],
            _ => &mut [],
        }
    }

    /// Mark `n` unread bytes as consumed.
    ///
    /// # Panics
    /// If `n` exceeds `remaining()`. Sinks must read at most what the
    /// buffer holds.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.remaining(), "consume past write cursor");
        self.pos += n;
    }

    /// Mark `n` spare bytes as written.
    ///
    /// # Panics
    /// If `n` exceeds `free_space()`.
    pub fn commit(&mut self, n: usize) {
        assert!(n <= self.free_space(), "commit past end of region");
        self.last += n;
    }

    /// Cursors back to empty, flags cleared. Memory is kept.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.last = 0;
        self.flags = BufFlags::empty();
    }

    pub fn is_last(&self) -> bool {
        self.flags.intersects(BufFlags::LAST_BUF | BufFlags::LAST_IN_CHAIN)
    }

    pub fn is_flush(&self) -> bool {
        self.flags.contains(BufFlags::FLUSH)
    }

    pub fn is_synthetic(&self) -> bool {
        self.flags.contains(BufFlags::SYNTHETIC)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("pos", &self.pos)
            .field("last", &self.last)
            .field("capacity", &self.capacity())
            .field("flags", &self.flags)
            .finish()
    }
}
