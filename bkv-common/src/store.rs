//! # Store Boundary
//!
//! Purpose: Fix the contract between the marshaling layer and whatever record
//! store sits behind it.
//!
//! ## Design Principles
//!
//! 1. **Strategy Pattern**: `Connector`/`StoreClient` keep callers decoupled
//!    from the concrete store (cluster client, in-memory engine, test double).
//! 2. **Opaque Failures**: Every call fails with a `Status` that is passed
//!    through untouched.
//! 3. **Borrowed Payloads**: Records and batches are lent for the duration of
//!    one call; the store copies what it keeps.
//!
//! Retries, pooling, timeouts and topology are the store client's business.

use std::fmt;

use crate::error::EmptyKeyPart;
use crate::record::{OperationBatch, StructuredRecord};
use crate::status::Status;

/// Address of one record: namespace, set and user key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    namespace: String,
    set: String,
    user_key: String,
}

impl RecordKey {
    /// Creates a record key.
    ///
    /// # Errors
    /// Returns `EmptyKeyPart` naming the first empty part. No other
    /// validation happens here.
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        user_key: impl Into<String>,
    ) -> Result<Self, EmptyKeyPart> {
        let key = RecordKey {
            namespace: namespace.into(),
            set: set.into(),
            user_key: user_key.into(),
        };
        if key.namespace.is_empty() {
            return Err(EmptyKeyPart("namespace"));
        }
        if key.set.is_empty() {
            return Err(EmptyKeyPart("set"));
        }
        if key.user_key.is_empty() {
            return Err(EmptyKeyPart("key"));
        }
        Ok(key)
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn set(&self) -> &str {
        &self.set
    }

    #[inline]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.set, self.user_key)
    }
}

/// Opens store sessions.
pub trait Connector {
    /// Session type produced by this connector.
    type Client: StoreClient;

    /// Connects to the store seeded at `host:port`.
    fn connect(&self, host: &str, port: u16) -> Result<Self::Client, Status>;
}

/// One open store session.
///
/// A session is owned by a single caller at a time; sharing one across
/// threads needs external locking.
pub trait StoreClient {
    /// Closes the session. Later calls fail with a client-side status.
    fn close(&mut self) -> Result<(), Status>;

    /// Reads a whole record.
    fn get(&self, key: &RecordKey) -> Result<StructuredRecord, Status>;

    /// Writes the bins of `record`, creating the record if needed.
    fn put(&self, key: &RecordKey, record: &StructuredRecord) -> Result<(), Status>;

    /// Applies an increment batch, creating the record if needed.
    fn operate(&self, key: &RecordKey, ops: &OperationBatch) -> Result<(), Status>;
}
