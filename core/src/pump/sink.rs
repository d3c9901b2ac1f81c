//! pump/sink.rs
//! Downstream collaborator the pump forwards decompressed output to.

use thiserror::Error;

use crate::buffer::{BufFlags, OutputView};

/// Outcome of one `forward` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardStatus {
    /// Everything offered was read.
    Consumed,
    /// Some output was left unread; the pump keeps it busy and retries later.
    Backpressure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("downstream closed")]
    Closed,
    #[error("downstream write failed: {0}")]
    Write(String),
}

/// Next stage of the body pipeline.
///
/// Contract:
/// - Pull buffers from `view` in order and `consume` what was read.
/// - A pulled buffer may be left partially read; it stays busy and shows up
///   again at the front of the next view.
/// - Zero-length buffers still carry flags (`FLUSH`, `LAST_BUF`) and should
///   be pulled so the boundary is observed.
pub trait BodySink {
    fn forward(&mut self, view: &mut OutputView<'_>) -> Result<ForwardStatus, SinkError>;
}

impl<S: BodySink + ?Sized> BodySink for &mut S {
    fn forward(&mut self, view: &mut OutputView<'_>) -> Result<ForwardStatus, SinkError> {
        (**self).forward(view)
    }
}

/// Sink that copies every byte into a `Vec` and never pushes back.
#[derive(Debug, Default)]
pub struct VecSink {
    pub data: Vec<u8>,
    pub flushes: usize,
    pub finals: usize,
}

impl BodySink for VecSink {
    fn forward(&mut self, view: &mut OutputView<'_>) -> Result<ForwardStatus, SinkError> {
        while let Some(buf) = view.next_buffer() {
            let n = buf.remaining();
            self.data.extend_from_slice(buf.readable());
            buf.consume(n);
            if buf.is_flush() {
                self.flushes += 1;
            }
            if buf.flags.contains(BufFlags::LAST_BUF) {
                self.finals += 1;
            }
        }
        Ok(ForwardStatus::Consumed)
    }
}
