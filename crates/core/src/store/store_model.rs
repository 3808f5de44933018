//! Shared state store models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    JSON_EXTENSION, LAST_SYNC_ACCOUNTS_KEY, LAST_SYNC_BALANCES_KEY, LAST_SYNC_TRANSACTIONS_KEY,
};

/// One persisted ChangeBatch: `pending_changes/{accountId}_{stamp}.json`.
///
/// `stamp` is epoch milliseconds. It starts at the batch capture time and is
/// bumped when that name is already taken, so it only orders files of the
/// same account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingChangeFile {
    pub account_id: String,
    pub stamp: i64,
    pub path: PathBuf,
}

impl PendingChangeFile {
    pub fn file_name_for(account_id: &str, stamp: i64) -> String {
        format!("{}_{}.{}", account_id, stamp, JSON_EXTENSION)
    }

    /// Parses a pending file path. Returns `None` for anything that is not
    /// `{accountId}_{stamp}.json`.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some(JSON_EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let (account_id, stamp) = stem.rsplit_once('_')?;
        if account_id.is_empty() || stamp.starts_with('+') {
            return None;
        }
        let stamp = stamp.parse::<i64>().ok()?;
        Some(Self {
            account_id: account_id.to_string(),
            stamp,
            path: path.to_path_buf(),
        })
    }

    pub fn file_name(&self) -> String {
        Self::file_name_for(&self.account_id, self.stamp)
    }
}

/// Resources with a sync marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncResource {
    Accounts,
    Transactions,
    Balances,
}

impl SyncResource {
    pub const ALL: [SyncResource; 3] = [
        SyncResource::Accounts,
        SyncResource::Transactions,
        SyncResource::Balances,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SyncResource::Accounts => LAST_SYNC_ACCOUNTS_KEY,
            SyncResource::Transactions => LAST_SYNC_TRANSACTIONS_KEY,
            SyncResource::Balances => LAST_SYNC_BALANCES_KEY,
        }
    }
}

/// Advisory "last touched" blob, one per resource.
///
/// Both processes overwrite these in place; the last write wins and nothing
/// depends on them for correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncMarker {
    /// Shape used by the transactions marker
    Detailed {
        #[serde(rename = "lastSyncDate")]
        last_sync_date: i64,
        #[serde(rename = "changeType")]
        change_type: String,
    },
    Simple {
        timestamp: i64,
    },
}

impl SyncMarker {
    /// Marker for `resource` touched at `timestamp` by `change_type`.
    pub fn touched(resource: SyncResource, timestamp: i64, change_type: &str) -> Self {
        match resource {
            SyncResource::Transactions => SyncMarker::Detailed {
                last_sync_date: timestamp,
                change_type: change_type.to_string(),
            },
            SyncResource::Accounts | SyncResource::Balances => SyncMarker::Simple { timestamp },
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SyncMarker::Detailed { last_sync_date, .. } => *last_sync_date,
            SyncMarker::Simple { timestamp } => *timestamp,
        }
    }
}

/// Result of `getLastSyncInfo`, epoch milliseconds per resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSyncInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balances: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_file_name_round_trip() {
        let name = PendingChangeFile::file_name_for("1b4e28ba-2fa1-11d2-883f-0016d3cca427", 1700);
        assert_eq!(name, "1b4e28ba-2fa1-11d2-883f-0016d3cca427_1700.json");

        let parsed = PendingChangeFile::from_path(Path::new(&name)).unwrap();
        assert_eq!(parsed.account_id, "1b4e28ba-2fa1-11d2-883f-0016d3cca427");
        assert_eq!(parsed.stamp, 1700);
        assert_eq!(parsed.file_name(), name);
    }

    #[test]
    fn test_pending_file_rejects_foreign_names() {
        for name in ["notes.txt", "acc.json", "_12.json", "acc_x1.json", "acc_12.json.tmp"] {
            assert!(
                PendingChangeFile::from_path(Path::new(name)).is_none(),
                "accepted {}",
                name
            );
        }
    }

    #[test]
    fn test_marker_shapes() {
        let tx = SyncMarker::touched(SyncResource::Transactions, 42, "fetch");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["lastSyncDate"], 42);
        assert_eq!(value["changeType"], "fetch");

        let accounts = SyncMarker::touched(SyncResource::Accounts, 7, "fetch");
        assert_eq!(serde_json::to_value(&accounts).unwrap()["timestamp"], 7);
    }

    #[test]
    fn test_marker_reads_either_shape() {
        let simple: SyncMarker = serde_json::from_str(r#"{"timestamp": 5}"#).unwrap();
        let detailed: SyncMarker =
            serde_json::from_str(r#"{"lastSyncDate": 9, "changeType": "backgroundDelivery"}"#)
                .unwrap();

        assert_eq!(simple.timestamp(), 5);
        assert_eq!(detailed.timestamp(), 9);
    }
}
