//! CustomCoin (CC) Node Miner
//!
//! Multi-threaded CPU miner driving the shared mining core. Flags use
//! the node's single-dash convention:
//!
//!   -address=<reward recipient>   required
//!   -threads=<n>                  worker threads, default hardware concurrency
//!   -benchmark                    30-second timed search, print hash rate
//!   -stats                        print statistics every 30 seconds

use cc_core::consensus::{check_proof_of_work, BlockHeader};
use cc_core::constants::{BLOCK_REWARD, CHAIN_FULL_NAME, CHAIN_NAME, TEMPLATE_BITS};
use cc_core::crypto::{double_sha256, Hash};
use cc_core::mining::{
    default_threads, run_benchmark, BlockSink, MinerConfig, MinerPool, TemplateProvider,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STATS_INTERVAL: Duration = Duration::from_secs(30);
const BENCHMARK_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct CliOptions {
    threads: Option<usize>,
    address: Option<String>,
    benchmark: bool,
    stats: bool,
}

fn parse_flags(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    for arg in args {
        if let Some(value) = arg.strip_prefix("-threads=") {
            let threads = value
                .parse::<usize>()
                .map_err(|_| format!("invalid -threads value: {value}"))?;
            if threads == 0 {
                return Err("thread count must be positive".to_string());
            }
            opts.threads = Some(threads);
        } else if let Some(value) = arg.strip_prefix("-address=") {
            if value.is_empty() {
                return Err("mining address must not be empty".to_string());
            }
            opts.address = Some(value.to_string());
        } else if arg == "-benchmark" {
            opts.benchmark = true;
        } else if arg == "-stats" {
            opts.stats = true;
        } else {
            return Err(format!("unknown option: {arg}"));
        }
    }
    Ok(opts)
}

/// Development block template source
///
/// Supplies a coinbase-only template for the configured reward address:
/// the merkle root commits to the address script placeholder and the
/// timestamp tracks the wall clock. Real transaction selection belongs
/// to the node, not the miner.
struct DevTemplateProvider {
    merkle_root: Hash,
}

impl DevTemplateProvider {
    fn new(address: &str) -> Self {
        Self {
            merkle_root: double_sha256(address.as_bytes()),
        }
    }
}

impl TemplateProvider for DevTemplateProvider {
    fn current_template(&self) -> Option<BlockHeader> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs() as u32;
        Some(BlockHeader::new(
            1,
            Hash::zero(),
            self.merkle_root,
            time,
            TEMPLATE_BITS,
            0,
        ))
    }
}

/// Submission sink that re-validates and logs accepted blocks
struct LoggingSink;

impl BlockSink for LoggingSink {
    fn submit(&self, header: &BlockHeader, hash: &Hash) -> bool {
        if !check_proof_of_work(header, true) {
            warn!(hash = %hash, "rejected submission: insufficient proof of work");
            return false;
        }
        let report = serde_json::json!({
            "chain": CHAIN_NAME,
            "hash": hash.to_hex(),
            "nonce": header.nonce,
            "time": header.time,
            "bits": format!("{:08x}", header.bits),
            "reward": BLOCK_REWARD,
        });
        info!(block = %report, "block accepted");
        true
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match parse_flags(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: cc-miner -address=<reward recipient> [-threads=<n>] [-benchmark] [-stats]");
            std::process::exit(1);
        }
    };

    let threads = opts.threads.unwrap_or_else(default_threads);

    if opts.benchmark {
        info!(threads, "running 30 second benchmark");
        match run_benchmark(threads, BENCHMARK_DURATION) {
            Ok(s) => {
                println!(
                    "Benchmark: {} hashes in {:.1}s, {:.0} H/s",
                    s.hashes,
                    s.elapsed.as_secs_f64(),
                    s.hash_rate
                );
                return;
            }
            Err(e) => {
                eprintln!("benchmark failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let Some(address) = opts.address else {
        eprintln!("mining address is required (-address=<reward recipient>)");
        std::process::exit(1);
    };

    let mut config = MinerConfig::new(address.clone());
    config.threads = threads;
    let mut pool = match MinerPool::new(config) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    info!(chain = CHAIN_FULL_NAME, threads, address = %address, "starting miner");
    pool.start(
        Arc::new(DevTemplateProvider::new(&address)),
        Arc::new(LoggingSink),
    );

    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    ticker.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, stopping miner");
                break;
            }
            _ = ticker.tick(), if opts.stats => {
                let s = pool.stats();
                info!(
                    hashes = s.hashes,
                    blocks_found = s.blocks_found,
                    hash_rate = format!("{:.0} H/s", s.hash_rate),
                    "mining statistics"
                );
            }
        }
    }

    pool.stop();
}
