//! buffer/mod.rs
//! Byte buffers, handle chains and the bounded output pool.
//!
//! Notes:
//! - Input chunks are owned by the pump until consumed, then dropped.
//! - Output buffers live in the pool arena; chains move handles, never memory.

pub mod types;
pub mod chain;
pub mod pool;

pub use types::*;
pub use chain::*;
pub use pool::*;
