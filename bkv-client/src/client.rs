//! # Connection Handle
//!
//! Purpose: Expose connect / disconnect / get / put / increment over any
//! `StoreClient`, marshaling dynamic mappings on the way in and out.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `ConnectionHandle` hides the encoder, decoder and
//!    store session behind five calls.
//! 2. **Explicit Lifecycle**: `disconnect` consumes the handle, so nothing can
//!    use a closed session. Dropping an open handle closes it as well.
//! 3. **Pass-Through Failures**: Store statuses are returned unchanged; the
//!    handle never retries.
//! 4. **Single Owner**: A handle belongs to one logical session; share it
//!    across threads only behind a lock.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use bkv_common::{
    Connector, DynamicMapping, DynamicValue, EmptyKeyPart, MarshalError, RecordKey, Status,
    StoreClient, ERR_PARAM, MAX_BINS,
};

use crate::decode::decode;
use crate::encode::{encode, BinKey};
use crate::incr::build_increments;

/// Result type for the connection handle.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the connection handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Payload could not be marshaled.
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),
    /// Namespace, set or key was empty.
    #[error("invalid key: {0}")]
    Key(#[from] EmptyKeyPart),
    /// Store rejected the call.
    #[error("store error: {0}")]
    Store(#[from] Status),
}

impl ClientError {
    /// Status pair for this error.
    ///
    /// Local errors report `ERR_PARAM`; store statuses pass through.
    pub fn status(&self) -> Status {
        match self {
            ClientError::Marshal(err) => Status::new(ERR_PARAM, err.to_string()),
            ClientError::Key(err) => Status::new(ERR_PARAM, err.to_string()),
            ClientError::Store(status) => status.clone(),
        }
    }
}

impl From<ClientError> for Status {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Store(status) => status,
            other => other.status(),
        }
    }
}

/// Connection settings.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Seed host, e.g. "127.0.0.1".
    pub host: String,
    /// Seed port.
    pub port: u16,
    /// Declared capacity for `put`/`increment` when none is given.
    pub max_bins: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_bins: MAX_BINS,
        }
    }
}

/// Open session against a record store.
pub struct ConnectionHandle<C: StoreClient> {
    client: C,
    config: ClientConfig,
    // Set by `disconnect` so drop does not close a second time.
    closed: bool,
}

impl<C: StoreClient> ConnectionHandle<C> {
    /// Connects through `connector` to the host and port in `config`.
    pub fn connect<N>(connector: &N, config: ClientConfig) -> ClientResult<Self>
    where
        N: Connector<Client = C>,
    {
        match connector.connect(&config.host, config.port) {
            Ok(client) => {
                debug!(host = %config.host, port = config.port, "connected");
                Ok(Self::from_client(client, config))
            }
            Err(status) => {
                debug!(
                    host = %config.host,
                    port = config.port,
                    code = status.code,
                    message = %status.message,
                    "connect failed"
                );
                Err(ClientError::Store(status))
            }
        }
    }

    /// Wraps an already-open store session.
    pub fn from_client(client: C, config: ClientConfig) -> Self {
        ConnectionHandle {
            client,
            config,
            closed: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Closes the session and consumes the handle.
    pub fn disconnect(mut self) -> ClientResult<()> {
        self.closed = true;
        self.client.close()?;
        debug!(host = %self.config.host, port = self.config.port, "disconnected");
        Ok(())
    }

    /// Reads a record and decodes its mapped bins.
    pub fn get(&self, namespace: &str, set: &str, key: &str) -> ClientResult<DynamicMapping> {
        let key = RecordKey::new(namespace, set, key)?;
        let record = self.client.get(&key).map_err(|status| {
            debug!(key = %key, code = status.code, "get failed");
            status
        })?;
        Ok(decode(&record))
    }

    /// Writes `bins`, declaring `ClientConfig::max_bins` as the capacity.
    pub fn put<'a, K, I>(&self, namespace: &str, set: &str, key: &str, bins: I) -> ClientResult<()>
    where
        K: BinKey + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
    {
        self.put_with_capacity(namespace, set, key, bins, self.config.max_bins)
    }

    /// Writes `bins` into a record declaring `capacity` bins.
    pub fn put_with_capacity<'a, K, I>(
        &self,
        namespace: &str,
        set: &str,
        key: &str,
        bins: I,
        capacity: usize,
    ) -> ClientResult<()>
    where
        K: BinKey + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
    {
        let key = RecordKey::new(namespace, set, key)?;
        let record = encode(bins, capacity)?;
        debug!(key = %key, bins = record.len(), "put");
        self.client.put(&key, &record).map_err(|status| {
            debug!(key = %key, code = status.code, "put failed");
            ClientError::Store(status)
        })
    }

    /// Adds each integer in `bins` to the matching bin, declaring
    /// `ClientConfig::max_bins` as the capacity.
    pub fn increment<'a, K, I>(
        &self,
        namespace: &str,
        set: &str,
        key: &str,
        bins: I,
    ) -> ClientResult<()>
    where
        K: BinKey + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
    {
        self.increment_with_capacity(namespace, set, key, bins, self.config.max_bins)
    }

    /// Adds each integer in `bins` to the matching bin.
    pub fn increment_with_capacity<'a, K, I>(
        &self,
        namespace: &str,
        set: &str,
        key: &str,
        bins: I,
        capacity: usize,
    ) -> ClientResult<()>
    where
        K: BinKey + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
    {
        let key = RecordKey::new(namespace, set, key)?;
        let ops = build_increments(bins, capacity)?;
        debug!(key = %key, ops = ops.len(), "increment");
        self.client.operate(&key, &ops).map_err(|status| {
            debug!(key = %key, code = status.code, "increment failed");
            ClientError::Store(status)
        })
    }
}

impl<C: StoreClient> Drop for ConnectionHandle<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(status) = self.client.close() {
            warn!(code = status.code, message = %status.message, "close on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use bkv_common::{
        OperationBatch, StructuredRecord, ValueTag, ERR_CLIENT, ERR_RECORD_NOT_FOUND,
    };

    /// Store client that counts `close` calls and fails everything else.
    struct CountingClient {
        closes: Rc<Cell<usize>>,
        fail_close: bool,
    }

    impl StoreClient for CountingClient {
        fn close(&mut self) -> Result<(), Status> {
            self.closes.set(self.closes.get() + 1);
            if self.fail_close {
                Err(Status::new(ERR_CLIENT, "close failed"))
            } else {
                Ok(())
            }
        }

        fn get(&self, _key: &RecordKey) -> Result<StructuredRecord, Status> {
            Err(Status::new(ERR_RECORD_NOT_FOUND, "record not found"))
        }

        fn put(&self, _key: &RecordKey, _record: &StructuredRecord) -> Result<(), Status> {
            Ok(())
        }

        fn operate(&self, _key: &RecordKey, _ops: &OperationBatch) -> Result<(), Status> {
            Ok(())
        }
    }

    fn counting_handle(fail_close: bool) -> (ConnectionHandle<CountingClient>, Rc<Cell<usize>>) {
        let closes = Rc::new(Cell::new(0));
        let client = CountingClient {
            closes: Rc::clone(&closes),
            fail_close,
        };
        (ConnectionHandle::from_client(client, ClientConfig::default()), closes)
    }

    #[test]
    fn disconnect_closes_once() {
        let (handle, closes) = counting_handle(false);
        handle.disconnect().unwrap();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn drop_closes_open_handle() {
        let (handle, closes) = counting_handle(false);
        drop(handle);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn failed_close_is_reported_once() {
        let (handle, closes) = counting_handle(true);
        let err = handle.disconnect().unwrap_err();
        assert_eq!(err.status().code, ERR_CLIENT);
        assert_eq!(closes.get(), 1);

        let (handle, closes) = counting_handle(true);
        drop(handle);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn store_status_passes_through_get() {
        let (handle, _closes) = counting_handle(false);
        let err = handle.get("test", "s", "k").unwrap_err();
        assert_eq!(err, ClientError::Store(Status::new(ERR_RECORD_NOT_FOUND, "record not found")));
        assert_eq!(handle.config().max_bins, MAX_BINS);
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_bins, MAX_BINS);
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: ClientConfig = serde_json::from_str(r#"{"port": 4000}"#).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.max_bins, MAX_BINS);
    }

    #[test]
    fn errors_map_to_status() {
        let err = ClientError::from(MarshalError::InvalidKeyType {
            found: ValueTag::List,
        });
        let status = err.status();
        assert_eq!(status.code, ERR_PARAM);
        assert_eq!(status.message, "key of type list cannot be used as a bin name");

        let err = ClientError::from(EmptyKeyPart("set"));
        assert_eq!(Status::from(err).message, "set must not be empty");

        let store = Status::new(ERR_RECORD_NOT_FOUND, "record not found");
        assert_eq!(Status::from(ClientError::Store(store.clone())), store);
    }
}
