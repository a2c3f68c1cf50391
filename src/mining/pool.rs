//! Multi-threaded mining worker pool
//!
//! A fixed pool of OS threads. Workers claim disjoint nonce ranges from
//! a per-template counter, hash fresh copies of the current block
//! template, and race on a per-template solved flag so exactly one
//! solved header per template reaches the submission sink.

use crate::consensus::{decode_target, BlockHeader, U256};
use crate::crypto::{double_sha256, Hash};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Nonces claimed per worker batch. The stop flag is polled at every
/// batch boundary, so shutdown completes within one batch per worker.
pub const NONCE_BATCH: u32 = 1000;

/// Backoff when no template is available or a worker faulted
const WORKER_BACKOFF: Duration = Duration::from_secs(1);

/// Configuration errors reported before any worker starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mining address is required")]
    MissingAddress,
    #[error("thread count must be positive")]
    InvalidThreads,
}

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Number of worker threads
    pub threads: usize,
    /// Reward recipient for the coinbase template
    pub address: String,
    /// Clamp decoded targets to the proof-of-work limit
    pub clamp_to_pow_limit: bool,
}

impl MinerConfig {
    /// Create a config for the given reward address with default
    /// threads (hardware concurrency)
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            threads: default_threads(),
            address: address.into(),
            clamp_to_pow_limit: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        Ok(())
    }
}

/// Hardware concurrency, falling back to a single thread
pub fn default_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Block template source (external collaborator: the node side)
///
/// Returning `None` means no work is available; workers back off and
/// retry. The pool only ever reads template fields.
pub trait TemplateProvider: Send + Sync {
    fn current_template(&self) -> Option<BlockHeader>;
}

/// Accepts a solved header for validation and broadcast (external
/// collaborator). A `false` return is non-fatal; the pool logs it and
/// keeps searching on the next template.
pub trait BlockSink: Send + Sync {
    fn submit(&self, header: &BlockHeader, hash: &Hash) -> bool;
}

/// Aggregate mining statistics
///
/// Counters are relaxed: write-many from workers, read-occasionally for
/// reporting. They are eventually consistent, never linearized with the
/// hashing loop.
#[derive(Debug)]
pub struct MinerStats {
    hashes: AtomicU64,
    blocks_found: AtomicU64,
    start: Instant,
}

impl MinerStats {
    fn new() -> Self {
        Self {
            hashes: AtomicU64::new(0),
            blocks_found: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    /// Consistent-enough snapshot for reporting
    pub fn snapshot(&self) -> StatsSnapshot {
        let hashes = self.hashes.load(Ordering::Relaxed);
        let elapsed = self.start.elapsed();
        StatsSnapshot {
            hashes,
            blocks_found: self.blocks_found.load(Ordering::Relaxed),
            elapsed,
            hash_rate: hashes as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        }
    }
}

/// Point-in-time view of [`MinerStats`]
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub hashes: u64,
    pub blocks_found: u64,
    pub elapsed: Duration,
    pub hash_rate: f64,
}

/// State shared by all workers of one pool
struct Shared {
    stop: AtomicBool,
    ledger: WorkLedger,
    stats: MinerStats,
}

/// Templates remembered by the work ledger. Rotation keeps at most two
/// templates in flight; the slack covers workers lagging a rotation.
const SLOT_HISTORY: usize = 4;

/// Search state for one template, shared by every worker hashing it.
/// Clones are handles onto the same counters.
#[derive(Clone)]
struct WorkSlot {
    tag: u64,
    next_nonce: Arc<AtomicU32>,
    solved: Arc<AtomicBool>,
}

/// Bounded registry of per-template search state, keyed by template tag.
///
/// A worker observing a template always gets that template's own slot:
/// nonce claims keep advancing and a solved template stays solved, no
/// matter in which order the workers notice a rotation. A worker still
/// holding the previous template therefore cannot rewind the nonce
/// space or reopen the winner race of the current one.
struct WorkLedger {
    slots: Mutex<Vec<WorkSlot>>,
}

impl WorkLedger {
    fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Fetch the slot for `tag`, creating it with the template's base
    /// nonce on first observation. Most-recent slots are kept; anything
    /// older than [`SLOT_HISTORY`] templates is dropped.
    fn slot(&self, tag: u64, base_nonce: u32) -> WorkSlot {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.iter().find(|s| s.tag == tag) {
            return slot.clone();
        }
        let slot = WorkSlot {
            tag,
            next_nonce: Arc::new(AtomicU32::new(base_nonce)),
            solved: Arc::new(AtomicBool::new(false)),
        };
        slots.insert(0, slot.clone());
        slots.truncate(SLOT_HISTORY);
        slot
    }
}

/// Claim the next disjoint range of [`NONCE_BATCH`] nonces
///
/// Fetch-and-add semantics guarantee no two claims overlap (until the
/// 32-bit space wraps, at which point the template timestamp has moved
/// the search to fresh headers).
pub fn claim_nonce_range(counter: &AtomicU32) -> (u32, u32) {
    let start = counter.fetch_add(NONCE_BATCH, Ordering::SeqCst);
    (start, NONCE_BATCH)
}

/// Multi-threaded miner driving a template provider and a block sink
pub struct MinerPool {
    config: MinerConfig,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl MinerPool {
    /// Create a pool; fails on invalid configuration without starting
    /// any worker.
    pub fn new(config: MinerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                ledger: WorkLedger::new(),
                stats: MinerStats::new(),
            }),
            workers: Vec::new(),
        })
    }

    /// Spawn the worker threads
    pub fn start(&mut self, provider: Arc<dyn TemplateProvider>, sink: Arc<dyn BlockSink>) {
        if !self.workers.is_empty() {
            warn!("miner pool already running");
            return;
        }
        self.shared.stop.store(false, Ordering::SeqCst);

        for id in 0..self.config.threads {
            let provider = Arc::clone(&provider);
            let sink = Arc::clone(&sink);
            let shared = Arc::clone(&self.shared);
            let clamp = self.config.clamp_to_pow_limit;
            self.workers.push(thread::spawn(move || {
                worker_loop(id, provider, sink, shared, clamp);
            }));
        }
        info!(threads = self.config.threads, "miner pool started");
    }

    /// Raise the stop flag and join every worker
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shared.stop.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("mining worker exited with a panic");
            }
        }
        info!("miner pool stopped");
    }

    /// Current statistics snapshot
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Whether workers are currently running
    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }
}

impl Drop for MinerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

enum WorkStatus {
    /// No template available or an unsatisfiable target
    Idle,
    /// A nonce batch was processed
    Busy,
}

fn worker_loop(
    id: usize,
    provider: Arc<dyn TemplateProvider>,
    sink: Arc<dyn BlockSink>,
    shared: Arc<Shared>,
    clamp: bool,
) {
    debug!(worker = id, "mining worker started");

    while !shared.stop.load(Ordering::SeqCst) {
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            mine_batch(provider.as_ref(), sink.as_ref(), &shared, clamp)
        }));

        match attempt {
            Ok(WorkStatus::Busy) => {}
            Ok(WorkStatus::Idle) => thread::sleep(WORKER_BACKOFF),
            Err(_) => {
                // Transient fault: isolate it to this attempt, never
                // take down the process or the other workers.
                warn!(worker = id, "mining attempt panicked, backing off");
                thread::sleep(WORKER_BACKOFF);
            }
        }
    }

    debug!(worker = id, "mining worker stopped");
}

/// Hash one claimed nonce batch against the current template
fn mine_batch(
    provider: &dyn TemplateProvider,
    sink: &dyn BlockSink,
    shared: &Shared,
    clamp: bool,
) -> WorkStatus {
    let Some(template) = provider.current_template() else {
        return WorkStatus::Idle;
    };

    let slot = shared
        .ledger
        .slot(template_tag(&template), template.nonce);

    // Template already solved: stand down until fresh work arrives.
    if slot.solved.load(Ordering::SeqCst) {
        return WorkStatus::Idle;
    }

    let target = decode_target(template.bits, clamp);
    if target.is_zero() {
        return WorkStatus::Idle;
    }

    let (start, count) = claim_nonce_range(&slot.next_nonce);
    for offset in 0..count {
        if slot.solved.load(Ordering::Relaxed) || shared.stop.load(Ordering::Relaxed) {
            return WorkStatus::Busy;
        }

        // Fresh copy per attempt; no header state is shared across
        // concurrent hash attempts.
        let mut header = template;
        header.nonce = start.wrapping_add(offset);
        let hash = header.hash();
        shared.stats.hashes.fetch_add(1, Ordering::Relaxed);

        if U256::from_hash(&hash) <= target {
            // First observed winner submits; everyone else stands down.
            if slot
                .solved
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                if sink.submit(&header, &hash) {
                    shared.stats.blocks_found.fetch_add(1, Ordering::Relaxed);
                    info!(nonce = header.nonce, hash = %hash, "block found");
                } else {
                    warn!(hash = %hash, "block submission rejected");
                }
            }
            return WorkStatus::Busy;
        }
    }

    WorkStatus::Busy
}

/// Timed search against an effectively unreachable target, measuring
/// raw hash throughput. Used by the `-benchmark` flag.
pub fn run_benchmark(threads: usize, duration: Duration) -> Result<StatsSnapshot, ConfigError> {
    struct BenchTemplate(BlockHeader);

    impl TemplateProvider for BenchTemplate {
        fn current_template(&self) -> Option<BlockHeader> {
            Some(self.0)
        }
    }

    struct DiscardSink;

    impl BlockSink for DiscardSink {
        fn submit(&self, _header: &BlockHeader, _hash: &Hash) -> bool {
            true
        }
    }

    // target of 1: no digest will satisfy it within the run
    let template = BlockHeader::new(1, Hash::zero(), Hash::zero(), 0, 0x03000001, 0);

    let mut config = MinerConfig::new("benchmark");
    config.threads = threads;
    let mut pool = MinerPool::new(config)?;
    pool.start(Arc::new(BenchTemplate(template)), Arc::new(DiscardSink));
    thread::sleep(duration);
    pool.stop();
    Ok(pool.stats())
}

/// Identity of a template, nonce excluded, for the winner race
fn template_tag(template: &BlockHeader) -> u64 {
    let mut bytes = template.to_bytes();
    bytes[76..80].fill(0);
    let digest = double_sha256(&bytes);
    let mut tag = [0u8; 8];
    tag.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::check_proof_of_work;
    use std::collections::HashSet;

    struct FixedTemplate(BlockHeader);

    impl TemplateProvider for FixedTemplate {
        fn current_template(&self) -> Option<BlockHeader> {
            Some(self.0)
        }
    }

    struct NoTemplate;

    impl TemplateProvider for NoTemplate {
        fn current_template(&self) -> Option<BlockHeader> {
            None
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        submitted: Mutex<Vec<BlockHeader>>,
    }

    impl BlockSink for RecordingSink {
        fn submit(&self, header: &BlockHeader, _hash: &Hash) -> bool {
            self.submitted.lock().unwrap().push(*header);
            true
        }
    }

    fn easy_template() -> BlockHeader {
        BlockHeader::new(1, Hash::zero(), Hash::zero(), 1737933600, 0x207fffff, 0)
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            MinerConfig::new("").validate(),
            Err(ConfigError::MissingAddress)
        );

        let mut config = MinerConfig::new("cc1qminer");
        config.threads = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreads));

        assert!(MinerConfig::new("cc1qminer").validate().is_ok());
        assert!(MinerConfig::new("cc1qminer").threads >= 1);
    }

    #[test]
    fn test_pool_rejects_invalid_config() {
        assert!(MinerPool::new(MinerConfig::new("")).is_err());
    }

    #[test]
    fn test_claimed_ranges_are_disjoint() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                let mut claims = Vec::new();
                for _ in 0..256 {
                    claims.push(claim_nonce_range(&counter));
                }
                claims
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for (start, count) in handle.join().unwrap() {
                assert_eq!(count, NONCE_BATCH);
                for nonce in start..start + count {
                    assert!(seen.insert(nonce), "nonce {nonce} claimed twice");
                }
            }
        }
        assert_eq!(seen.len(), 4 * 256 * NONCE_BATCH as usize);
    }

    #[test]
    fn test_exactly_one_block_submitted_per_template() {
        let provider = Arc::new(FixedTemplate(easy_template()));
        let sink = Arc::new(RecordingSink::default());

        let mut config = MinerConfig::new("cc1qminer");
        config.threads = 4;
        let mut pool = MinerPool::new(config).unwrap();
        pool.start(provider, Arc::clone(&sink) as Arc<dyn BlockSink>);

        // The target is satisfiable within a handful of nonces; give the
        // workers ample time to race on it.
        for _ in 0..200 {
            if pool.stats().blocks_found >= 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        pool.stop();

        let submitted = sink.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1, "one winning block per template");
        assert!(check_proof_of_work(&submitted[0], true));
        assert_eq!(pool.stats().blocks_found, 1);
        assert!(pool.stats().hashes >= 1);
    }

    #[test]
    fn test_ledger_keeps_slot_state_per_template() {
        let ledger = WorkLedger::new();
        let slot = ledger.slot(1, 0);
        slot.next_nonce.fetch_add(NONCE_BATCH, Ordering::SeqCst);
        slot.solved.store(true, Ordering::SeqCst);

        // Other templates start fresh.
        let other = ledger.slot(2, 0);
        assert_eq!(other.next_nonce.load(Ordering::SeqCst), 0);
        assert!(!other.solved.load(Ordering::SeqCst));

        // A later observation of the first template sees its claims and
        // solved flag intact, never a reset.
        let again = ledger.slot(1, 0);
        assert!(Arc::ptr_eq(&slot.next_nonce, &again.next_nonce));
        assert_eq!(again.next_nonce.load(Ordering::SeqCst), NONCE_BATCH);
        assert!(again.solved.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ledger_caps_history() {
        let ledger = WorkLedger::new();
        for tag in 0..SLOT_HISTORY as u64 + 1 {
            ledger.slot(tag, 0);
        }
        let slots = ledger.slots.lock().unwrap();
        assert_eq!(slots.len(), SLOT_HISTORY);
        assert!(slots.iter().all(|s| s.tag != 0), "oldest slot evicted");
    }

    #[test]
    fn test_rotated_template_keeps_winner_closed() {
        let shared = Shared {
            stop: AtomicBool::new(false),
            ledger: WorkLedger::new(),
            stats: MinerStats::new(),
        };
        let sink = RecordingSink::default();

        let current = easy_template();
        let mut previous = easy_template();
        previous.time -= 1;

        let submissions_at = |time: u32| {
            sink.submitted
                .lock()
                .unwrap()
                .iter()
                .filter(|h| h.time == time)
                .count()
        };
        let mine = |template: BlockHeader| {
            let provider = FixedTemplate(template);
            for _ in 0..16 {
                mine_batch(&provider, &sink, &shared, true);
            }
        };

        // The regtest target is satisfied within the first batch.
        mine(current);
        assert_eq!(submissions_at(current.time), 1);

        // A worker still holding the previous template, then the current
        // one again: the solved template must not be submitted twice.
        mine(previous);
        mine(current);
        assert_eq!(submissions_at(current.time), 1);
        assert!(submissions_at(previous.time) <= 1);
    }

    #[test]
    fn test_idle_pool_stops_promptly() {
        let mut config = MinerConfig::new("cc1qminer");
        config.threads = 2;
        let mut pool = MinerPool::new(config).unwrap();
        pool.start(Arc::new(NoTemplate), Arc::new(RecordingSink::default()));
        assert!(pool.is_running());
        pool.stop();
        assert!(!pool.is_running());
        assert_eq!(pool.stats().blocks_found, 0);
    }

    #[test]
    fn test_benchmark_counts_hashes() {
        let snapshot = run_benchmark(2, Duration::from_millis(50)).unwrap();
        assert!(snapshot.hashes > 0);
        assert_eq!(snapshot.blocks_found, 0);
    }

    #[test]
    fn test_benchmark_rejects_zero_threads() {
        assert_eq!(
            run_benchmark(0, Duration::from_millis(1)).unwrap_err(),
            ConfigError::InvalidThreads
        );
    }

    #[test]
    fn test_stats_snapshot_rate() {
        let stats = MinerStats::new();
        stats.hashes.fetch_add(500, Ordering::Relaxed);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hashes, 500);
        assert!(snapshot.hash_rate > 0.0);
    }
}
