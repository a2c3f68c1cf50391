//! Consensus module - Block header codec, compact targets, and proof-of-work

mod block;
mod pow;
mod target;

pub use block::*;
pub use pow::*;
pub use target::*;
