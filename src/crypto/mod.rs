//! Cryptography module - double SHA-256 hashing and the digest type

mod hash;

pub use hash::*;
