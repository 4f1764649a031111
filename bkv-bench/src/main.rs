//! # Marshal Benchmark Harness
//!
//! Purpose: Provide a repeatable driver that measures put / get / increment
//! throughput through the connection handle, so marshaling cost can be
//! compared over time.
//!
//! ## Design Principles
//! 1. **Deterministic Workload**: Use a fixed PRNG seed for stable comparisons.
//! 2. **Allocation Control**: Pre-build keys and bin mappings to keep setup
//!    costs off the hot path.
//! 3. **Full Path**: Every operation goes through `ConnectionHandle`, so the
//!    numbers include encoding and decoding, not just the store.
//!
//! Usage: `bkv-bench [keys] [ops] [bins] [value_size]`
//! Set `RUST_LOG` to see client logging.

use std::env;
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bkv_client::{ClientConfig, ConnectionHandle};
use bkv_common::{DynamicMapping, DynamicValue};
use bkv_engine::{MemoryNode, MemoryStore};

const DEFAULT_KEY_COUNT: usize = 1 << 14;
const DEFAULT_OP_COUNT: usize = 200_000;
const DEFAULT_BIN_COUNT: usize = 8;
const DEFAULT_VALUE_SIZE: usize = 32;

const NAMESPACE: &str = "test";
const SET: &str = "bench";

struct BenchConfig {
    requested_keys: usize,
    key_count: usize,
    key_mask: usize,
    op_count: usize,
    bin_count: usize,
    value_size: usize,
}

impl BenchConfig {
    fn from_args() -> Self {
        let mut args = env::args().skip(1);
        let requested_keys = parse_usize(args.next(), DEFAULT_KEY_COUNT);
        let op_count = parse_usize(args.next(), DEFAULT_OP_COUNT);
        let bin_count = parse_usize(args.next(), DEFAULT_BIN_COUNT).max(1);
        let value_size = parse_usize(args.next(), DEFAULT_VALUE_SIZE);

        let key_count = requested_keys.max(1).next_power_of_two();
        let key_mask = key_count - 1;

        BenchConfig {
            requested_keys,
            key_count,
            key_mask,
            op_count,
            bin_count,
            value_size,
        }
    }
}

fn parse_usize(value: Option<String>, fallback: usize) -> usize {
    value.and_then(|raw| raw.parse().ok()).unwrap_or(fallback)
}

/// Tiny deterministic PRNG; keeps the workload reproducible.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    #[inline]
    fn next_index(&mut self, mask: usize) -> usize {
        (self.next_u64() as usize) & mask
    }
}

fn build_keys(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("key-{idx:08}")).collect()
}

// Alternates integer, float, string and list bins so every encode path runs.
fn build_mapping(bin_count: usize, value_size: usize, seed: u64) -> DynamicMapping {
    let mut mapping = DynamicMapping::with_capacity(bin_count);
    for idx in 0..bin_count {
        let salt = seed ^ (idx as u64);
        let value = match idx % 4 {
            0 => DynamicValue::Integer(salt as i64),
            1 => DynamicValue::Float((salt % 1_000) as f64 + 0.5),
            2 => DynamicValue::String("x".repeat(value_size)),
            _ => DynamicValue::List(vec![
                DynamicValue::Integer(idx as i64),
                DynamicValue::String("v".repeat(value_size.min(8))),
            ]),
        };
        mapping.insert(format!("bin{idx}"), value);
    }
    mapping
}

fn report(label: &str, ops: usize, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = (ops as f64) / secs;
    let nanos_per_op = (secs * 1e9) / (ops as f64);
    println!(
        "{label}: {ops} ops in {secs:.3}s ({ops_per_sec:.0} ops/s, {nanos_per_op:.1} ns/op)"
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("bkv-bench failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = BenchConfig::from_args();
    let client_config = ClientConfig::default();
    let node = MemoryNode::new(
        client_config.host.clone(),
        client_config.port,
        Arc::new(MemoryStore::new()),
    );
    let handle = ConnectionHandle::connect(&node, client_config).context("connect")?;

    let keys = build_keys(config.key_count);
    let mapping = build_mapping(config.bin_count, config.value_size, 0xA5A5_A5A5_A5A5_A5A5);
    let mut deltas = DynamicMapping::with_capacity(1);
    deltas.insert("hits", 1);

    info!(
        host = %handle.config().host,
        port = handle.config().port,
        requested = config.requested_keys,
        keys = config.key_count,
        ops = config.op_count,
        bins = config.bin_count,
        value_size = config.value_size,
        "starting benchmark"
    );

    let start = Instant::now();
    for key in &keys {
        handle
            .put(NAMESPACE, SET, key, &mapping)
            .with_context(|| format!("preload {key}"))?;
    }
    report("PUT", keys.len(), start.elapsed());

    let mut rng = XorShift64::new(0x1234_5678_9ABC_DEF0);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let idx = rng.next_index(config.key_mask);
        let record = handle.get(NAMESPACE, SET, &keys[idx]).context("get")?;
        black_box(record);
    }
    report("GET", config.op_count, start.elapsed());

    let mut rng = XorShift64::new(0x0FED_CBA9_8765_4321);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let idx = rng.next_index(config.key_mask);
        handle
            .increment(NAMESPACE, SET, &keys[idx], &deltas)
            .context("increment")?;
    }
    report("INCR", config.op_count, start.elapsed());

    info!(records = node.store().len(), "benchmark finished");
    handle.disconnect().context("disconnect")?;
    Ok(())
}
