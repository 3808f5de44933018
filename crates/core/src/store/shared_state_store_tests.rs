//! Tests for the shared state store.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::changes::ChangeBatch;
use crate::constants::PENDING_CHANGES_DIR;

const GROUP: &str = "group.com.example.budget";
const ACCOUNT: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

fn store_with_container() -> (TempDir, SharedStateStore) {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(GROUP)).unwrap();
    let resolver = Arc::new(DirectoryContainerResolver::new(tmp.path()));
    (tmp, SharedStateStore::new(resolver, GROUP))
}

fn pending_dir(tmp: &TempDir) -> std::path::PathBuf {
    tmp.path().join(GROUP).join(PENDING_CHANGES_DIR)
}

#[test]
fn test_write_then_read() {
    let (_tmp, store) = store_with_container();

    store.write("custom_key", &json!({"a": 1}));
    assert_eq!(store.read("custom_key"), Some(json!({"a": 1})));

    store.write("custom_key", &json!({"a": 2}));
    assert_eq!(store.read("custom_key"), Some(json!({"a": 2})));
}

#[test]
fn test_read_missing_key_is_absent() {
    let (_tmp, store) = store_with_container();
    assert_eq!(store.read("never_written"), None);
}

#[test]
fn test_invalid_keys_are_ignored() {
    let (tmp, store) = store_with_container();

    store.write("../escape", &json!(1));
    store.write(".hidden", &json!(1));

    assert!(!tmp.path().join("escape.json").exists());
    assert_eq!(store.read("../escape"), None);
}

#[test]
fn test_unresolved_container_degrades_to_noop() {
    let tmp = TempDir::new().unwrap();
    let resolver = Arc::new(DirectoryContainerResolver::new(tmp.path()));
    let store = SharedStateStore::new(resolver, "group.not.configured");

    assert!(!store.is_available());
    store.write("last_sync_accounts", &json!({"timestamp": 1}));
    assert_eq!(store.read("last_sync_accounts"), None);
    assert!(store.write_pending(&ChangeBatch::at(ACCOUNT, 1)).is_none());
    assert!(store.list_pending().is_empty());
    assert_eq!(store.last_sync_info(), LastSyncInfo::default());
}

#[test]
fn test_group_identifier_can_change_at_runtime() {
    let (tmp, store) = store_with_container();
    std::fs::create_dir(tmp.path().join("group.other")).unwrap();

    store.write("k", &json!("first"));
    store.set_group_identifier("group.other");

    assert_eq!(store.group_identifier(), "group.other");
    assert_eq!(store.read("k"), None);
    store.write("k", &json!("second"));
    assert!(tmp.path().join("group.other").join("k.json").exists());
}

#[test]
fn test_markers_feed_last_sync_info() {
    let (_tmp, store) = store_with_container();

    store.touch_marker(SyncResource::Transactions, "backgroundDelivery");
    store.touch_marker(SyncResource::Balances, "fetch");

    let info = store.last_sync_info();
    assert!(info.accounts.is_none());
    assert!(info.transactions.is_some());
    assert!(info.balances.is_some());

    match store.read_marker(SyncResource::Transactions).unwrap() {
        SyncMarker::Detailed { change_type, .. } => assert_eq!(change_type, "backgroundDelivery"),
        other => panic!("expected detailed marker, got {:?}", other),
    }
}

#[test]
fn test_malformed_marker_is_ignored() {
    let (_tmp, store) = store_with_container();
    store.write(SyncResource::Accounts.key(), &json!({"weird": true}));

    assert!(store.read_marker(SyncResource::Accounts).is_none());
}

#[test]
fn test_write_pending_never_overwrites() {
    let (tmp, store) = store_with_container();
    let batch = ChangeBatch::at(ACCOUNT, 1_000).with_deleted(vec!["tx1".into()]);

    let first = store.write_pending(&batch).unwrap();
    let second = store.write_pending(&batch).unwrap();

    assert_eq!(first.stamp, 1_000);
    assert_eq!(second.stamp, 1_001);
    assert_ne!(first.path, second.path);
    assert_eq!(std::fs::read_dir(pending_dir(&tmp)).unwrap().count(), 2);
}

#[test]
fn test_list_pending_orders_and_filters() {
    let (tmp, store) = store_with_container();
    let other = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    store.write_pending(&ChangeBatch::at(other, 30)).unwrap();
    store.write_pending(&ChangeBatch::at(ACCOUNT, 20)).unwrap();
    store.write_pending(&ChangeBatch::at(ACCOUNT, 10)).unwrap();
    std::fs::write(pending_dir(&tmp).join("README.txt"), "ignore me").unwrap();

    let files = store.list_pending();
    let names: Vec<(String, i64)> = files
        .iter()
        .map(|f| (f.account_id.clone(), f.stamp))
        .collect();
    assert_eq!(
        names,
        vec![
            (ACCOUNT.to_string(), 10),
            (ACCOUNT.to_string(), 20),
            (other.to_string(), 30),
        ]
    );
}

#[test]
fn test_read_and_delete_pending() {
    let (_tmp, store) = store_with_container();
    let batch = ChangeBatch::at(ACCOUNT, 5).with_deleted(vec!["gone".into()]);
    let file = store.write_pending(&batch).unwrap();

    assert_eq!(store.read_pending(&file).unwrap(), batch);
    assert!(store.delete_pending(&file));
    assert!(store.list_pending().is_empty());
    // Already gone still counts as deleted.
    assert!(store.delete_pending(&file));
}

#[test]
fn test_read_pending_reports_corruption() {
    let (tmp, store) = store_with_container();
    let dir = pending_dir(&tmp);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}_9.json", ACCOUNT)), b"{not json").unwrap();

    let files = store.list_pending();
    assert_eq!(files.len(), 1);
    assert!(matches!(store.read_pending(&files[0]), Err(StoreError::Json(_))));
}
