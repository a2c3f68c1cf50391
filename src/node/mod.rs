//! Node module - genesis block parameters and mining

mod genesis;

pub use genesis::*;
