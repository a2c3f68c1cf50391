//! Mining module - single-threaded search loop and the worker pool

mod miner;
mod pool;

pub use miner::*;
pub use pool::*;
