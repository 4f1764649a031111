use std::sync::Arc;

use bkv_client::{entry, ClientConfig, ClientError, ConnectionHandle};
use bkv_common::{
    DynamicMapping, DynamicValue, ERR_BIN_INCOMPATIBLE_TYPE, ERR_CLIENT, ERR_CONNECTION,
    ERR_NAMESPACE_NOT_FOUND, ERR_PARAM, ERR_RECORD_NOT_FOUND, STATUS_OK,
};
use bkv_engine::{MemoryConnection, MemoryNode, MemoryStore};

const HOST: &str = "127.0.0.1";
const PORT: u16 = 3000;

fn node() -> MemoryNode {
    MemoryNode::new(HOST, PORT, Arc::new(MemoryStore::with_shard_count(4)))
}

fn connect(node: &MemoryNode) -> ConnectionHandle<MemoryConnection> {
    let (status, handle) = entry::connect(node, HOST, PORT);
    assert_eq!(status.code, STATUS_OK);
    handle.expect("handle on success")
}

#[test]
fn put_then_get_round_trips() {
    let node = node();
    let handle = connect(&node);

    let mut bins = DynamicMapping::new();
    bins.insert("name", "felix");
    bins.insert("age", 4);
    bins.insert("tags", vec!["cat", "indoor"]);

    let status = entry::put(&handle, "test", "pets", "felix", &bins);
    assert!(status.is_ok(), "{status}");

    let (status, record) = entry::get(&handle, "test", "pets", "felix");
    assert_eq!(status.code, STATUS_OK);
    assert_eq!(record, Some(bins));
}

#[test]
fn put_merges_with_existing_bins() {
    let node = node();
    let handle = connect(&node);

    let first: DynamicMapping = vec![("a", 1), ("b", 2)].into_iter().collect();
    let second: DynamicMapping = vec![("b", 20)].into_iter().collect();
    handle.put("test", "s", "k", &first).unwrap();
    handle.put("test", "s", "k", &second).unwrap();

    let record = handle.get("test", "s", "k").unwrap();
    assert_eq!(record.get("a"), Some(&DynamicValue::Integer(1)));
    assert_eq!(record.get("b"), Some(&DynamicValue::Integer(20)));
}

#[test]
fn increment_creates_and_accumulates() {
    let node = node();
    let handle = connect(&node);

    let mut deltas = DynamicMapping::new();
    deltas.insert("score", 5);
    deltas.insert("hits", 1);
    assert!(entry::increment(&handle, "test", "stats", "u1", &deltas).is_ok());
    assert!(entry::increment(&handle, "test", "stats", "u1", &deltas).is_ok());

    let record = handle.get("test", "stats", "u1").unwrap();
    assert_eq!(record.get("score"), Some(&DynamicValue::Integer(10)));
    assert_eq!(record.get("hits"), Some(&DynamicValue::Integer(2)));
}

#[test]
fn increment_on_string_bin_reports_incompatible_type() {
    let node = node();
    let handle = connect(&node);

    let mut bins = DynamicMapping::new();
    bins.insert("name", "felix");
    handle.put("test", "pets", "felix", &bins).unwrap();

    let mut deltas = DynamicMapping::new();
    deltas.insert("name", 1);
    let status = entry::increment(&handle, "test", "pets", "felix", &deltas);
    assert_eq!(status.code, ERR_BIN_INCOMPATIBLE_TYPE);
}

#[test]
fn missing_record_yields_status_and_no_mapping() {
    let node = node();
    let handle = connect(&node);

    let (status, record) = entry::get(&handle, "test", "pets", "nobody");
    assert_eq!(status.code, ERR_RECORD_NOT_FOUND);
    assert!(record.is_none());
}

#[test]
fn unknown_namespace_is_reported() {
    let node = node();
    let handle = connect(&node);

    let (status, record) = entry::get(&handle, "prod", "pets", "felix");
    assert_eq!(status.code, ERR_NAMESPACE_NOT_FOUND);
    assert!(record.is_none());
}

#[test]
fn wrong_address_fails_to_connect() {
    let node = node();
    let (status, handle) = entry::connect(&node, HOST, PORT + 1);
    assert_eq!(status.code, ERR_CONNECTION);
    assert!(handle.is_none());
}

#[test]
fn local_errors_report_param_status() {
    let node = node();
    let handle = connect(&node);
    let bins: DynamicMapping = vec![("a", 1)].into_iter().collect();

    let status = entry::put(&handle, "", "s", "k", &bins);
    assert_eq!(status.code, ERR_PARAM);
    assert_eq!(status.message, "namespace must not be empty");

    let mut bad = DynamicMapping::new();
    bad.insert("flag", true);
    let status = entry::put(&handle, "test", "s", "k", &bad);
    assert_eq!(status.code, ERR_PARAM);

    let status = entry::increment(&handle, "test", "s", "k", &bad);
    assert_eq!(status.code, ERR_PARAM);

    // Nothing reached the store.
    assert!(node.store().is_empty());
}

#[test]
fn declared_capacity_is_enforced() {
    let node = node();
    let handle = connect(&node);
    let bins: DynamicMapping = vec![("a", 1), ("b", 2)].into_iter().collect();

    let err = handle
        .put_with_capacity("test", "s", "k", &bins, 1)
        .unwrap_err();
    assert!(matches!(err, ClientError::Marshal(_)));
    assert!(handle.put_with_capacity("test", "s", "k", &bins, 2).is_ok());
}

#[test]
fn raw_tables_accept_numeric_keys() {
    let node = node();
    let handle = connect(&node);
    let table = vec![
        (DynamicValue::from(1), DynamicValue::from("first")),
        (DynamicValue::from("name"), DynamicValue::from("rex")),
    ];

    handle
        .put("test", "s", "k", table.iter().map(|(k, v)| (k, v)))
        .unwrap();
    let record = handle.get("test", "s", "k").unwrap();
    assert_eq!(record.get("1"), Some(&DynamicValue::from("first")));
}

#[test]
fn disconnect_closes_the_session() {
    let node = node();
    let handle = connect(&node);
    assert_eq!(entry::disconnect(handle).code, STATUS_OK);

    let config = ClientConfig {
        port: PORT,
        ..ClientConfig::default()
    };
    let handle = ConnectionHandle::connect(&node, config).unwrap();
    assert!(handle.disconnect().is_ok());
}

#[test]
fn closed_session_rejects_calls() {
    use bkv_common::{Connector, StoreClient};

    let node = node();
    let mut client = node.connect(HOST, PORT).unwrap();
    client.close().unwrap();
    let handle = ConnectionHandle::from_client(client, ClientConfig::default());

    let (status, record) = entry::get(&handle, "test", "s", "k");
    assert_eq!(status.code, ERR_CLIENT);
    assert!(record.is_none());
}
