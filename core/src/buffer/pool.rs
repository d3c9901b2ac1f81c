//! buffer/pool.rs
//! Arena-backed output buffer pool with free/busy lifecycles under a fixed budget.
//!
//! Summary: a buffer moves free -> (filled, forwarded) -> busy -> (drained) -> free.
//! Chains hold `BufferId` handles only; the arena owns the memory.

use thiserror::Error;
use tracing::trace;

use crate::buffer::chain::{BufferChain, BufferId, OutputView};
use crate::buffer::types::{BufFlags, Buffer};
use crate::config::BufferBudget;

/// Pool is at its budget and nothing is free. Recoverable backpressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer pool exhausted: {allocated} of {max} buffers in use")]
pub struct PoolExhausted {
    pub allocated: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Counted against the budget, recycled through `free`.
    Pooled,
    /// Flag-only marker, retired once drained.
    Synthetic,
}

#[derive(Debug)]
struct Slot {
    buf: Buffer,
    origin: Origin,
    delivered: bool,
}

#[derive(Debug)]
pub struct BufferPool {
    slots: Vec<Option<Slot>>,
    vacant: Vec<usize>,
    free: BufferChain,
    busy: BufferChain,
    allocated: usize,
    budget: BufferBudget,
}

impl BufferPool {
    pub fn new(budget: BufferBudget) -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            free: BufferChain::new(),
            busy: BufferChain::new(),
            allocated: 0,
            budget,
        }
    }

    /// Take a reusable buffer from `free`, else allocate one while under budget.
    ///
    /// # Errors
    /// - `PoolExhausted` when `free` is empty and the budget is spent; the caller
    ///   must stop producing until `release` recycles something.
    pub fn acquire(&mut self) -> Result<BufferId, PoolExhausted> {
        if let Some(id) = self.free.pop_front() {
            let slot = self.slot_mut(id);
            slot.buf.reset();
            slot.delivered = false;
            trace!(slot = id.0, "pool: reuse free buffer");
            return Ok(id);
        }

        if self.allocated < self.budget.count {
            let id = self.insert(Buffer::with_capacity(self.budget.size), Origin::Pooled);
            self.allocated += 1;
            trace!(slot = id.0, allocated = self.allocated, "pool: new buffer");
            return Ok(id);
        }

        Err(PoolExhausted { allocated: self.allocated, max: self.budget.count })
    }

    /// Zero-length marker buffer carrying `flags`. Not counted against the budget.
    pub fn marker(&mut self, flags: BufFlags) -> BufferId {
        self.insert(Buffer::marker(flags), Origin::Synthetic)
    }

    /// Drop a buffer from the arena and from pool accounting.
    pub fn retire(&mut self, id: BufferId) {
        if let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) {
            if slot.origin == Origin::Pooled {
                self.allocated -= 1;
            }
            self.vacant.push(id.0);
        }
    }

    /// Move a just-forwarded chain onto `busy`, then recycle every buffer at
    /// the front of `busy` that downstream has pulled and fully read.
    ///
    /// Stops at the first buffer still holding unread bytes so nothing behind
    /// it is reused while downstream may still look at it.
    ///
    /// Returns the number of buffers recycled or retired.
    pub fn release(&mut self, forwarded: &mut BufferChain) -> usize {
        self.busy.extend(forwarded.drain(..));

        let mut recycled = 0;
        while let Some(&id) = self.busy.front() {
            let (origin, drained) = {
                let slot = self.slot(id);
                (slot.origin, slot.delivered && slot.buf.remaining() == 0)
            };
            if !drained {
                break;
            }
            self.busy.pop_front();
            match origin {
                Origin::Pooled => {
                    let slot = self.slot_mut(id);
                    slot.buf.reset();
                    slot.delivered = false;
                    self.free.push_back(id);
                }
                Origin::Synthetic => self.retire(id),
            }
            recycled += 1;
        }

        trace!(recycled, busy = self.busy.len(), free = self.free.len(), "pool: release");
        recycled
    }

    /// View of undrained busy buffers followed by `out`.
    pub fn view(&mut self, out: &BufferChain) -> OutputView<'_> {
        let mut ids: Vec<BufferId> = self
            .busy
            .iter()
            .copied()
            .filter(|id| {
                let slot = self.slot(*id);
                !(slot.delivered && slot.buf.remaining() == 0)
            })
            .collect();
        ids.extend(out.iter().copied());
        OutputView::new(self, ids)
    }

    pub fn get(&self, id: BufferId) -> &Buffer {
        &self.slot(id).buf
    }

    pub fn get_mut(&mut self, id: BufferId) -> &mut Buffer {
        &mut self.slot_mut(id).buf
    }

    pub(crate) fn mark_delivered(&mut self, id: BufferId) {
        self.slot_mut(id).delivered = true;
    }

    /// Release all memory. Used on stream teardown.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
        self.free.clear();
        self.busy.clear();
        self.allocated = 0;
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn budget(&self) -> BufferBudget {
        self.budget
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn busy_len(&self) -> usize {
        self.busy.len()
    }

    pub fn has_busy(&self) -> bool {
        !self.busy.is_empty()
    }

    /// Unread bytes still held by downstream.
    pub fn busy_bytes(&self) -> usize {
        self.busy.iter().map(|id| self.get(*id).remaining()).sum()
    }

    /// Occupied arena slots (pooled + markers).
    pub fn live_slots(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    fn insert(&mut self, buf: Buffer, origin: Origin) -> BufferId {
        let slot = Some(Slot { buf, origin, delivered: false });
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = slot;
                BufferId(index)
            }
            None => {
                self.slots.push(slot);
                BufferId(self.slots.len() - 1)
            }
        }
    }

    fn slot(&self, id: BufferId) -> &Slot {
        match self.slots.get(id.0).and_then(Option::as_ref) {
            Some(slot) => slot,
            None => panic!("stale buffer handle {:?}", id),
        }
    }

    fn slot_mut(&mut self, id: BufferId) -> &mut Slot {
        match self.slots.get_mut(id.0).and_then(Option::as_mut) {
            Some(slot) => slot,
            None => panic!("stale buffer handle {:?}", id),
        }
    }
}
