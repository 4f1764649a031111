//! # In-Process Node
//!
//! `MemoryNode` stands in for a cluster node at a fixed address. Connections
//! opened against it share the node's `MemoryStore`.

use std::sync::Arc;

use tracing::debug;

use bkv_common::{
    Connector, OperationBatch, RecordKey, Status, StoreClient, StructuredRecord, ERR_CLIENT,
    ERR_CONNECTION,
};

use crate::memory::MemoryStore;

/// Addressable front for a shared `MemoryStore`.
#[derive(Debug, Clone)]
pub struct MemoryNode {
    host: String,
    port: u16,
    store: Arc<MemoryStore>,
}

impl MemoryNode {
    pub fn new(host: impl Into<String>, port: u16, store: Arc<MemoryStore>) -> Self {
        MemoryNode {
            host: host.into(),
            port,
            store,
        }
    }

    #[inline]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Connector for MemoryNode {
    type Client = MemoryConnection;

    /// Fails with `ERR_CONNECTION` unless `host:port` is this node's address.
    fn connect(&self, host: &str, port: u16) -> Result<MemoryConnection, Status> {
        if host != self.host || port != self.port {
            return Err(Status::new(
                ERR_CONNECTION,
                format!("failed to connect to {}:{}", host, port),
            ));
        }
        debug!(host, port, "memory connection opened");
        Ok(MemoryConnection {
            store: Arc::clone(&self.store),
            open: true,
        })
    }
}

/// Session against a `MemoryNode`.
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    open: bool,
}

impl MemoryConnection {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn store(&self) -> Result<&MemoryStore, Status> {
        if self.open {
            Ok(self.store.as_ref())
        } else {
            Err(Status::new(ERR_CLIENT, "connection closed"))
        }
    }
}

impl StoreClient for MemoryConnection {
    // Closing twice is a no-op.
    fn close(&mut self) -> Result<(), Status> {
        if self.open {
            self.open = false;
            debug!("memory connection closed");
        }
        Ok(())
    }

    fn get(&self, key: &RecordKey) -> Result<StructuredRecord, Status> {
        self.store()?.get(key)
    }

    fn put(&self, key: &RecordKey, record: &StructuredRecord) -> Result<(), Status> {
        self.store()?.put(key, record)
    }

    fn operate(&self, key: &RecordKey, ops: &OperationBatch) -> Result<(), Status> {
        self.store()?.operate(key, ops)
    }
}
