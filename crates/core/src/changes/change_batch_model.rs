//! ChangeBatch model.

use serde::{Deserialize, Serialize};

use crate::store::PendingChangeFile;
use crate::transactions::TransactionRecord;
use crate::utils::now_millis;

/// One reconciled delta for one account at one capture time.
///
/// A batch only means something relative to the resumption state the
/// native layer keeps for itself. The relay never sees that token; it only
/// records whether one existed (`has_history_token`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeBatch {
    pub account_id: String,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub inserted: Vec<TransactionRecord>,
    #[serde(default)]
    pub updated: Vec<TransactionRecord>,
    /// Identifiers of transactions removed since the previous batch
    #[serde(default)]
    pub deleted: Vec<String>,
    #[serde(default)]
    pub has_history_token: bool,
}

impl ChangeBatch {
    /// Creates an empty batch stamped with the current time.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self::at(account_id, now_millis())
    }

    pub fn at(account_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            account_id: account_id.into(),
            timestamp,
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            has_history_token: false,
        }
    }

    pub fn with_inserted(mut self, records: Vec<TransactionRecord>) -> Self {
        self.inserted = records;
        self
    }

    pub fn with_updated(mut self, records: Vec<TransactionRecord>) -> Self {
        self.updated = records;
        self
    }

    pub fn with_deleted(mut self, ids: Vec<String>) -> Self {
        self.deleted = ids;
        self
    }

    pub fn with_history_token(mut self, has_history_token: bool) -> Self {
        self.has_history_token = has_history_token;
        self
    }

    /// True when the batch carries no inserted, updated or deleted items.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }

    /// Name this batch gets in `pending_changes`, before any collision bump.
    pub fn pending_file_name(&self) -> String {
        PendingChangeFile::file_name_for(&self.account_id, self.timestamp)
    }
}
