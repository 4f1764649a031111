// bkv-engine - In-process record store for BinKV
//
// This crate provides a sharded memory store and a node/connection pair that
// implement the store traits from bkv-common.

mod memory;
mod node;

pub use memory::{MemoryStore, StoreConfig};
pub use node::{MemoryConnection, MemoryNode};
