//! # In-Memory Record Store
//!
//! Provide a sharded, in-process record store that speaks the same
//! get / put / operate contract as a cluster client.
//!
//! ## Usage
//!
//! - Use `MemoryStore::new()` for a default store serving the `test`
//!   namespace with a CPU-based shard count.
//! - Use `MemoryStore::with_config` to choose namespaces, shard count and the
//!   per-record bin limit.
//! - Wrap the store in an `Arc` and hand it to a `MemoryNode` to open
//!   connections against it.
//!
//! ## Design Principles
//!
//! 1. **Sharded Locks**: Per-shard locks reduce contention under concurrency.
//! 2. **Copy-Then-Swap Writes**: Writes build the new record on a copy and
//!    store it only when every bin applied, so a failed write changes nothing.
//! 3. **Generation Tracking**: Every successful write bumps the record's
//!    generation.
//!
//! ## Structure Overview
//!
//! ```text
//! MemoryStore
//!   └── shards: Vec<Shard>
//!         └── Shard
//!               └── inner: RwLock<ShardInner>
//!                     └── records: HashMap<RecordKey, StructuredRecord>
//! ```

use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bkv_common::{
    BinValue, MarshalError, OperationBatch, RecordKey, Status, StructuredRecord,
    ERR_BIN_INCOMPATIBLE_TYPE, ERR_NAMESPACE_NOT_FOUND, ERR_PARAM, ERR_RECORD_NOT_FOUND,
    ERR_RECORD_TOO_BIG, MAX_BINS,
};

/// Default shards = CPU count * multiplier to reduce lock contention.
const DEFAULT_SHARD_MULTIPLIER: usize = 4;
/// Upper bound on shards; larger requests are clamped.
const MAX_SHARDS: usize = 1 << 16;

/// Store settings.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Namespaces the store accepts requests for.
    pub namespaces: Vec<String>,
    /// Number of shards; 0 picks a count from available parallelism.
    /// Values above 65536 are clamped.
    pub shard_count: usize,
    /// Maximum distinct bins one record may hold.
    pub max_bins_per_record: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            namespaces: vec!["test".to_string()],
            shard_count: 0,
            max_bins_per_record: MAX_BINS,
        }
    }
}

#[derive(Debug)]
struct ShardInner {
    records: HashMap<RecordKey, StructuredRecord, RandomState>,
}

/// Per-shard lock wrapper.
#[derive(Debug)]
struct Shard {
    inner: RwLock<ShardInner>,
}

/// Sharded in-memory record store.
#[derive(Debug)]
pub struct MemoryStore {
    /// Per-shard storage.
    shards: Vec<Shard>,
    /// Bitmask for fast shard selection (power-of-two shard count).
    shard_mask: usize,
    /// Hash state used to pick shards deterministically.
    hash_state: RandomState,
    namespaces: Vec<String>,
    max_bins: usize,
    /// Live record count across shards.
    record_count: AtomicUsize,
}

impl MemoryStore {
    /// Creates a store with default settings.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a default store with a caller-provided shard count.
    pub fn with_shard_count(shards: usize) -> Self {
        Self::with_config(StoreConfig {
            shard_count: shards.max(1),
            ..StoreConfig::default()
        })
    }

    /// Creates a store from explicit settings.
    ///
    /// The shard count is clamped to `[1, 65536]` and normalized to the next
    /// power of two.
    pub fn with_config(config: StoreConfig) -> Self {
        let requested = if config.shard_count == 0 {
            let threads = std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1);
            threads.saturating_mul(DEFAULT_SHARD_MULTIPLIER)
        } else {
            config.shard_count
        };
        let shard_count = normalize_shard_count(requested);
        let hash_state = RandomState::new();
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Shard {
                inner: RwLock::new(ShardInner {
                    records: HashMap::with_hasher(hash_state.clone()),
                }),
            });
        }

        MemoryStore {
            shards,
            shard_mask: shard_count - 1,
            hash_state,
            namespaces: config.namespaces,
            max_bins: config.max_bins_per_record,
            record_count: AtomicUsize::new(0),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.record_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the record, generation included.
    ///
    /// Missing records fail with `ERR_RECORD_NOT_FOUND`.
    pub fn get(&self, key: &RecordKey) -> Result<StructuredRecord, Status> {
        self.check_namespace(key)?;
        let inner = self.shard_for(key).inner.read();
        inner
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| Status::new(ERR_RECORD_NOT_FOUND, format!("record {} not found", key)))
    }

    /// Creates or updates a record.
    ///
    /// Request bins replace stored bins of the same name, other stored bins
    /// are kept, and a `Nil` bin removes the stored bin. A record left without
    /// bins is deleted.
    pub fn put(&self, key: &RecordKey, record: &StructuredRecord) -> Result<(), Status> {
        self.check_namespace(key)?;
        let mut inner = self.shard_for(key).inner.write();
        let (mut merged, existed) = match inner.records.get(key) {
            Some(current) => (current.clone(), true),
            None => (StructuredRecord::with_capacity(self.max_bins), false),
        };

        for bin in record {
            match &bin.value {
                BinValue::Nil => {
                    merged.remove(bin.name.as_str());
                }
                value => merged
                    .set(bin.name.clone(), value.clone())
                    .map_err(|err| too_big(key, err))?,
            }
        }

        if merged.is_empty() {
            if existed {
                inner.records.remove(key);
                self.record_count.fetch_sub(1, Ordering::Relaxed);
                debug!(key = %key, "record deleted by put");
            }
            return Ok(());
        }

        self.store_record(&mut inner, key, merged, existed);
        Ok(())
    }

    /// Applies an increment batch atomically.
    ///
    /// Missing records and bins start from zero. A targeted bin holding a
    /// non-integer fails the whole batch with `ERR_BIN_INCOMPATIBLE_TYPE`.
    pub fn operate(&self, key: &RecordKey, ops: &OperationBatch) -> Result<(), Status> {
        if ops.is_empty() {
            return Err(Status::new(ERR_PARAM, "operation batch is empty"));
        }
        self.check_namespace(key)?;
        let mut inner = self.shard_for(key).inner.write();
        let (mut merged, existed) = match inner.records.get(key) {
            Some(current) => (current.clone(), true),
            None => (StructuredRecord::with_capacity(self.max_bins), false),
        };

        for op in ops {
            let next = match merged.get(op.bin.as_str()) {
                None => op.delta,
                Some(BinValue::Integer(current)) => current.wrapping_add(op.delta),
                Some(other) => {
                    return Err(Status::new(
                        ERR_BIN_INCOMPATIBLE_TYPE,
                        format!("bin {} holds {}, cannot increment", op.bin, other.tag()),
                    ));
                }
            };
            merged
                .set(op.bin.clone(), BinValue::Integer(next))
                .map_err(|err| too_big(key, err))?;
        }

        self.store_record(&mut inner, key, merged, existed);
        Ok(())
    }

    fn store_record(
        &self,
        inner: &mut ShardInner,
        key: &RecordKey,
        mut record: StructuredRecord,
        existed: bool,
    ) {
        let generation = record.generation().next();
        record.set_generation(generation);
        inner.records.insert(key.clone(), record);
        if !existed {
            self.record_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn check_namespace(&self, key: &RecordKey) -> Result<(), Status> {
        if self.namespaces.iter().any(|ns| ns == key.namespace()) {
            Ok(())
        } else {
            Err(Status::new(
                ERR_NAMESPACE_NOT_FOUND,
                format!("namespace {} not found", key.namespace()),
            ))
        }
    }

    /// Hashes a key to its owning shard index.
    fn shard_index(&self, key: &RecordKey) -> usize {
        let mut hasher = self.hash_state.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & self.shard_mask
    }

    /// Returns the shard responsible for a given key.
    fn shard_for(&self, key: &RecordKey) -> &Shard {
        &self.shards[self.shard_index(key)]
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn too_big(key: &RecordKey, err: MarshalError) -> Status {
    Status::new(ERR_RECORD_TOO_BIG, format!("record {}: {}", key, err))
}

/// Normalizes shard counts to a bounded power of two for fast masking.
fn normalize_shard_count(count: usize) -> usize {
    count
        .clamp(1, MAX_SHARDS)
        .checked_next_power_of_two()
        .unwrap_or(MAX_SHARDS)
}
