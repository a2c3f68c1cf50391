//! Single-threaded proof-of-work search
//!
//! The loop the genesis tool runs: hash the header, compare against the
//! decoded target, advance the nonce (bumping the timestamp on wrap),
//! repeat until a satisfying digest is found.

use crate::consensus::{decode_target, BlockHeader, U256};
use crate::crypto::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Search configuration
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Clamp the decoded target to the proof-of-work limit
    /// (node behavior; the standalone tool decodes directly)
    pub clamp_to_pow_limit: bool,
    /// Attempts between progress observations; 0 disables them
    pub progress_interval: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            clamp_to_pow_limit: false,
            progress_interval: 100_000,
        }
    }
}

/// Progress observation emitted every `progress_interval` attempts
///
/// Observability only; emitting it never affects the search outcome.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Hashes attempted so far
    pub attempts: u64,
    /// Time since the search started
    pub elapsed: Duration,
    /// Derived hash rate in H/s
    pub hash_rate: f64,
    /// Digest of the most recent attempt
    pub current_hash: Hash,
}

/// A successful search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Winning nonce
    pub nonce: u32,
    /// Header timestamp at the winning attempt (may exceed the starting
    /// timestamp if the nonce space wrapped)
    pub time: u32,
    /// Winning digest
    pub hash: Hash,
    /// Total hashes computed, winning attempt included
    pub hashes: u64,
    /// Wall-clock search duration
    pub elapsed: Duration,
}

/// Result of a cancellable search
#[derive(Debug)]
pub enum SearchResult {
    /// A satisfying nonce was found
    Found(SearchOutcome),
    /// The stop flag was raised before a nonce was found
    Interrupted,
}

/// Run the search to completion. The loop has no termination other
/// than success.
pub fn search<F>(header: BlockHeader, params: SearchParams, progress: F) -> SearchOutcome
where
    F: FnMut(&Progress),
{
    match run(header, params, None, progress) {
        SearchResult::Found(outcome) => outcome,
        SearchResult::Interrupted => unreachable!("search without a stop flag cannot be interrupted"),
    }
}

/// Run the search until success or until `stop` is raised
pub fn search_cancellable<F>(
    header: BlockHeader,
    params: SearchParams,
    stop: &AtomicBool,
    progress: F,
) -> SearchResult
where
    F: FnMut(&Progress),
{
    run(header, params, Some(stop), progress)
}

fn run<F>(
    mut header: BlockHeader,
    params: SearchParams,
    stop: Option<&AtomicBool>,
    mut progress: F,
) -> SearchResult
where
    F: FnMut(&Progress),
{
    let target = decode_target(header.bits, params.clamp_to_pow_limit);
    let start = Instant::now();
    let mut hashes = 0u64;

    loop {
        if let Some(stop) = stop {
            if stop.load(Ordering::SeqCst) {
                return SearchResult::Interrupted;
            }
        }

        let hash = header.hash();
        hashes += 1;

        if U256::from_hash(&hash) <= target {
            return SearchResult::Found(SearchOutcome {
                nonce: header.nonce,
                time: header.time,
                hash,
                hashes,
                elapsed: start.elapsed(),
            });
        }

        if params.progress_interval > 0 && hashes % params.progress_interval == 0 {
            let elapsed = start.elapsed();
            let hash_rate = hashes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            progress(&Progress {
                attempts: hashes,
                elapsed,
                hash_rate,
                current_hash: hash,
            });
        }

        header.advance_nonce();
    }
}
