//! Filesystem-backed shared state store.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use super::{
    ContainerResolverTrait, LastSyncInfo, PendingChangeFile, StoreError, SyncMarker, SyncResource,
};
use crate::changes::ChangeBatch;
use crate::constants::{JSON_EXTENSION, MAX_PENDING_NAME_ATTEMPTS, PENDING_CHANGES_DIR};
use crate::utils::now_millis;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Best-effort key/value area shared by the app and its extension.
///
/// The container is re-resolved on every call, so a runtime change of the
/// group identifier takes effect immediately. When it cannot be resolved,
/// writes become no-ops and reads come back empty, each with a warning.
pub struct SharedStateStore {
    resolver: Arc<dyn ContainerResolverTrait>,
    group_identifier: RwLock<String>,
}

impl SharedStateStore {
    pub fn new(
        resolver: Arc<dyn ContainerResolverTrait>,
        group_identifier: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            group_identifier: RwLock::new(group_identifier.into()),
        }
    }

    pub fn group_identifier(&self) -> String {
        self.group_identifier
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_group_identifier(&self, group_identifier: impl Into<String>) {
        let group_identifier = group_identifier.into();
        debug!("Shared state store now uses app group '{}'", group_identifier);
        *self
            .group_identifier
            .write()
            .unwrap_or_else(|e| e.into_inner()) = group_identifier;
    }

    /// Resolved container root, if the app group is reachable.
    pub fn container(&self) -> Option<PathBuf> {
        self.resolver.container_path(&self.group_identifier())
    }

    pub fn is_available(&self) -> bool {
        self.container().is_some()
    }

    // ── Key/value ────────────────────────────────────────────────────────────

    /// Writes `value` under `key`, replacing any previous value.
    pub fn write(&self, key: &str, value: &Value) {
        if let Err(e) = self.try_write(key, value) {
            warn!("Shared state write of '{}' skipped: {}", key, e);
        }
    }

    /// Reads the value under `key`; absent when missing or unreadable.
    pub fn read(&self, key: &str) -> Option<Value> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Shared state read of '{}' failed: {}", key, e);
                None
            }
        }
    }

    fn try_write(&self, key: &str, value: &Value) -> StoreResult<()> {
        let path = self.key_path(key)?;
        let bytes = serde_json::to_vec(value)?;
        write_replacing(&path, &bytes)
    }

    fn try_read(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn key_path(&self, key: &str) -> StoreResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let root = self.require_container()?;
        Ok(root.join(format!("{}.{}", key, JSON_EXTENSION)))
    }

    fn require_container(&self) -> StoreResult<PathBuf> {
        let group = self.group_identifier();
        self.resolver
            .container_path(&group)
            .ok_or(StoreError::ContainerUnavailable(group))
    }

    // ── Sync markers ─────────────────────────────────────────────────────────

    /// Records that `resource` was touched now.
    pub fn touch_marker(&self, resource: SyncResource, change_type: &str) {
        let marker = SyncMarker::touched(resource, now_millis(), change_type);
        match serde_json::to_value(&marker) {
            Ok(value) => self.write(resource.key(), &value),
            Err(e) => warn!("Failed to encode {} marker: {}", resource.key(), e),
        }
    }

    pub fn read_marker(&self, resource: SyncResource) -> Option<SyncMarker> {
        let value = self.read(resource.key())?;
        match serde_json::from_value(value) {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("Ignoring malformed {} marker: {}", resource.key(), e);
                None
            }
        }
    }

    pub fn last_sync_info(&self) -> LastSyncInfo {
        let mut info = LastSyncInfo::default();
        for resource in SyncResource::ALL {
            let stamp = self.read_marker(resource).map(|m| m.timestamp());
            match resource {
                SyncResource::Accounts => info.accounts = stamp,
                SyncResource::Transactions => info.transactions = stamp,
                SyncResource::Balances => info.balances = stamp,
            }
        }
        info
    }

    // ── Pending batches ──────────────────────────────────────────────────────

    /// Persists a batch as a new pending file.
    ///
    /// Never overwrites: the file is created exclusively, and a taken name
    /// bumps the stamp by one millisecond. Returns `None` when the store is
    /// unavailable or the write failed.
    pub fn write_pending(&self, batch: &ChangeBatch) -> Option<PendingChangeFile> {
        match self.try_write_pending(batch) {
            Ok(file) => {
                debug!(
                    "Persisted {} change(s) for account {} as {}",
                    batch.change_count(),
                    batch.account_id,
                    file.file_name()
                );
                Some(file)
            }
            Err(e) => {
                warn!(
                    "Could not persist pending changes for account {}: {}",
                    batch.account_id, e
                );
                None
            }
        }
    }

    fn try_write_pending(&self, batch: &ChangeBatch) -> StoreResult<PendingChangeFile> {
        if !is_valid_key(&batch.account_id) {
            return Err(StoreError::InvalidKey(batch.account_id.clone()));
        }
        let dir = self.pending_dir()?;
        fs::create_dir_all(&dir)?;
        let bytes = serde_json::to_vec(batch)?;

        let mut stamp = batch.timestamp;
        for _ in 0..MAX_PENDING_NAME_ATTEMPTS {
            let path = dir.join(PendingChangeFile::file_name_for(&batch.account_id, stamp));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(&bytes).and_then(|_| file.sync_all()) {
                        // Leave no truncated batch behind for the drain.
                        let _ = fs::remove_file(&path);
                        return Err(e.into());
                    }
                    return Ok(PendingChangeFile {
                        account_id: batch.account_id.clone(),
                        stamp,
                        path,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    stamp = stamp.saturating_add(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::NameExhausted(batch.account_id.clone()))
    }

    /// Every pending file, ordered by account then stamp.
    pub fn list_pending(&self) -> Vec<PendingChangeFile> {
        match self.try_list_pending() {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list pending changes: {}", e);
                Vec::new()
            }
        }
    }

    fn try_list_pending(&self) -> StoreResult<Vec<PendingChangeFile>> {
        let dir = self.pending_dir()?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files: Vec<PendingChangeFile> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| PendingChangeFile::from_path(&entry.path()))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parses one pending file.
    ///
    /// Unlike the rest of the API this reports failures, so the drain can
    /// leave corrupt files in place.
    pub fn read_pending(&self, file: &PendingChangeFile) -> StoreResult<ChangeBatch> {
        let bytes = fs::read(&file.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Deletes a pending file. A file that is already gone counts as deleted.
    pub fn delete_pending(&self, file: &PendingChangeFile) -> bool {
        match fs::remove_file(&file.path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Could not delete pending file {}: {}", file.file_name(), e);
                false
            }
        }
    }

    fn pending_dir(&self) -> StoreResult<PathBuf> {
        Ok(self.require_container()?.join(PENDING_CHANGES_DIR))
    }
}

/// Keys are plain file stems: no separators, no dot-prefixed names.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Replaces `path` atomically via a sibling temp file and a rename.
fn write_replacing(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::InvalidKey(path.display().to_string()))?;
    let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
