//! buffer/chain.rs
//! Handles into the buffer arena and the FIFO chains built from them.

use std::collections::VecDeque;

use crate::buffer::pool::BufferPool;
use crate::buffer::types::Buffer;

/// Handle to a buffer slot in the pool arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

/// Ordered FIFO of handles. A handle sits in at most one chain at a time.
pub type BufferChain = VecDeque<BufferId>;

/// Downstream's window onto the outstanding output: undrained busy buffers
/// first, then the newly produced chain, in stream order.
///
/// Buffers are pulled one at a time; a pulled buffer counts as delivered, and
/// only delivered, fully read buffers are ever recycled.
pub struct OutputView<'a> {
    pool: &'a mut BufferPool,
    ids: Vec<BufferId>,
    cursor: usize,
}

impl<'a> OutputView<'a> {
    pub(crate) fn new(pool: &'a mut BufferPool, ids: Vec<BufferId>) -> Self {
        Self { pool, ids, cursor: 0 }
    }

    /// Next buffer in stream order, or `None` when the view is exhausted.
    pub fn next_buffer(&mut self) -> Option<&mut Buffer> {
        let id = *self.ids.get(self.cursor)?;
        self.cursor += 1;
        self.pool.mark_delivered(id);
        Some(self.pool.get_mut(id))
    }

    /// Buffers not yet pulled.
    pub fn pending(&self) -> usize {
        self.ids.len() - self.cursor
    }

    /// Unread bytes across the whole view, pulled or not.
    pub fn remaining_bytes(&self) -> usize {
        self.ids.iter().map(|id| self.pool.get(*id).remaining()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
