//! # Status-Pair Entry Points
//!
//! The five calls a scripting host binds, each returning a `Status` (and a
//! value where the call produces one) instead of a `Result`. A failed `get`
//! or `connect` yields `None` next to the failing status.

use bkv_common::{Connector, DynamicMapping, DynamicValue, Status, StoreClient};

use crate::client::{ClientConfig, ClientResult, ConnectionHandle};
use crate::encode::BinKey;

/// Connects to `host:port` with default settings otherwise.
pub fn connect<N: Connector>(
    connector: &N,
    host: &str,
    port: u16,
) -> (Status, Option<ConnectionHandle<N::Client>>) {
    let config = ClientConfig {
        host: host.to_string(),
        port,
        ..ClientConfig::default()
    };
    match ConnectionHandle::connect(connector, config) {
        Ok(handle) => (Status::ok(), Some(handle)),
        Err(err) => (err.into(), None),
    }
}

/// Closes the session behind `handle`.
pub fn disconnect<C: StoreClient>(handle: ConnectionHandle<C>) -> Status {
    to_status(handle.disconnect())
}

/// Reads a record; the mapping is present only when the status is OK.
pub fn get<C: StoreClient>(
    handle: &ConnectionHandle<C>,
    namespace: &str,
    set: &str,
    key: &str,
) -> (Status, Option<DynamicMapping>) {
    match handle.get(namespace, set, key) {
        Ok(mapping) => (Status::ok(), Some(mapping)),
        Err(err) => (err.into(), None),
    }
}

/// Writes `bins` into a record.
pub fn put<'a, C, K, I>(
    handle: &ConnectionHandle<C>,
    namespace: &str,
    set: &str,
    key: &str,
    bins: I,
) -> Status
where
    C: StoreClient,
    K: BinKey + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
{
    to_status(handle.put(namespace, set, key, bins))
}

/// Adds each integer in `bins` to the matching bin.
pub fn increment<'a, C, K, I>(
    handle: &ConnectionHandle<C>,
    namespace: &str,
    set: &str,
    key: &str,
    bins: I,
) -> Status
where
    C: StoreClient,
    K: BinKey + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
{
    to_status(handle.increment(namespace, set, key, bins))
}

fn to_status(result: ClientResult<()>) -> Status {
    match result {
        Ok(()) => Status::ok(),
        Err(err) => err.into(),
    }
}
