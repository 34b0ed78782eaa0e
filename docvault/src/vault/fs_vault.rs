// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::vault::key::{
    DocumentIterationKey, DocumentMasterTemplateKey, ElementType, PartIterationKey,
};
use crate::vault::{
    BoxedTransaction, ManageDocuments, ManageProducts, ManageTransactions, Transaction,
    TransactionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_base::error::VaultError;
use docvault_base::msg::part_api::PartMinimal;
use docvault_base::{bad_request, conflict, internal_server_error, not_found};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

const INDEX_FILE_NAME: &str = ".index.json";
const PENDING_DIR: &str = ".pending";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct IndexEntry {
    size: u64,
    committed_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct PendingEntry {
    full_name: String,
    size: u64,
}

struct VaultState {
    root: PathBuf,
    index: RwLock<BTreeMap<String, IndexEntry>>,
    pending: RwLock<HashMap<u64, Vec<PendingEntry>>>,
    next_tx_id: AtomicU64,
}

impl VaultState {
    fn file_path(&self, full_name: &str) -> PathBuf {
        self.root.join(full_name)
    }

    fn tx_path(&self, tx_id: u64) -> PathBuf {
        self.root.join(PENDING_DIR).join(tx_id.to_string())
    }

    fn pending_path(&self, tx_id: u64, full_name: &str) -> PathBuf {
        self.tx_path(tx_id).join(full_name)
    }

    async fn save_index(&self, index: &BTreeMap<String, IndexEntry>) -> Result<(), VaultError> {
        let buf = serde_json::to_vec(index)
            .map_err(|err| internal_server_error!("Could not encode vault index: {}", err))?;
        tokio::fs::write(self.root.join(INDEX_FILE_NAME), buf).await?;
        Ok(())
    }

    async fn remove_tx_dir(&self, tx_id: u64) -> Result<(), VaultError> {
        match tokio::fs::remove_dir_all(self.tx_path(tx_id)).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Vault on the local file system.
///
/// Files of a transaction are written under `.pending/<tx id>` and moved to their
/// full name on commit, the committed names are kept in `.index.json`.
pub struct FsVault {
    state: Arc<VaultState>,
}

impl FsVault {
    pub async fn new(root: PathBuf) -> Result<Self, VaultError> {
        tokio::fs::create_dir_all(&root).await?;

        let index: BTreeMap<String, IndexEntry> =
            match tokio::fs::read(root.join(INDEX_FILE_NAME)).await {
                Ok(buf) => serde_json::from_slice(&buf).map_err(|err| {
                    internal_server_error!("Could not decode vault index: {}", err)
                })?,
                Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
                Err(err) => return Err(err.into()),
            };

        // reservations don't survive a restart
        match tokio::fs::remove_dir_all(root.join(PENDING_DIR)).await {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                warn!("Failed to clean up pending vault files: {}", err)
            }
            _ => {}
        }

        info!("Vault at {} with {} files", root.display(), index.len());
        Ok(FsVault {
            state: Arc::new(VaultState {
                root,
                index: RwLock::new(index),
                pending: RwLock::new(HashMap::new()),
                next_tx_id: AtomicU64::new(1),
            }),
        })
    }

    async fn save_file(
        &self,
        tx: &dyn Transaction,
        key: String,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError> {
        if key.starts_with('.') {
            return Err(bad_request!("Workspace of '{}' is reserved", key));
        }

        if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
            return Err(bad_request!("Invalid file name '{}'", file_name));
        }

        if !tx.is_active() {
            return Err(conflict!("Transaction {} is not active", tx.id()));
        }

        let full_name = format!("{}/{}", key, file_name);
        let mut pending = self.state.pending.write().await;
        let entries = pending
            .get_mut(&tx.id())
            .ok_or_else(|| conflict!("Transaction {} is unknown", tx.id()))?;

        match entries.iter_mut().find(|entry| entry.full_name == full_name) {
            Some(entry) => entry.size = size,
            None => entries.push(PendingEntry {
                full_name: full_name.clone(),
                size,
            }),
        }

        Ok(self.state.pending_path(tx.id(), &full_name))
    }
}

#[async_trait]
impl ManageTransactions for FsVault {
    async fn begin(&self) -> Result<BoxedTransaction, VaultError> {
        let id = self.state.next_tx_id.fetch_add(1, Ordering::SeqCst);
        self.state.pending.write().await.insert(id, vec![]);
        debug!("Transaction {} started", id);
        Ok(Box::new(FsTransaction {
            id,
            status: TransactionStatus::Active,
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl ManageDocuments for FsVault {
    async fn get_data_file(&self, full_name: &str) -> Result<PathBuf, VaultError> {
        if self.state.index.read().await.contains_key(full_name) {
            Ok(self.state.file_path(full_name))
        } else {
            Err(not_found!("File '{}' doesn't exist", full_name))
        }
    }

    async fn save_file_in_document(
        &self,
        tx: &dyn Transaction,
        key: &DocumentIterationKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError> {
        self.save_file(tx, key.to_string(), file_name, size).await
    }

    async fn save_file_in_template(
        &self,
        tx: &dyn Transaction,
        key: &DocumentMasterTemplateKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError> {
        self.save_file(tx, key.to_string(), file_name, size).await
    }
}

#[async_trait]
impl ManageProducts for FsVault {
    async fn save_file_in_part_iteration(
        &self,
        tx: &dyn Transaction,
        key: &PartIterationKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError> {
        self.save_file(tx, key.to_string(), file_name, size).await
    }

    async fn get_part_masters(&self, workspace_id: &str) -> Result<Vec<PartMinimal>, VaultError> {
        let prefix = format!("{}/{}/", workspace_id, ElementType::Parts);
        let mut latest = BTreeMap::<(String, String), u32>::new();

        for name in self.state.index.read().await.keys() {
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };

            let segments: Vec<&str> = rest.split('/').collect();
            let [number, version, iteration, _file] = segments.as_slice() else {
                continue;
            };
            let Ok(iteration) = iteration.parse::<u32>() else {
                continue;
            };

            let entry = latest
                .entry((number.to_string(), version.to_string()))
                .or_insert(iteration);
            *entry = (*entry).max(iteration);
        }

        Ok(latest
            .into_iter()
            .map(|((number, version), iteration)| PartMinimal {
                number,
                version,
                iteration,
            })
            .collect())
    }
}

struct FsTransaction {
    id: u64,
    status: TransactionStatus,
    state: Arc<VaultState>,
}

impl FsTransaction {
    fn check_active(&self) -> Result<(), VaultError> {
        if self.status == TransactionStatus::Active {
            Ok(())
        } else {
            Err(conflict!("Transaction {} is not active", self.id))
        }
    }

    async fn move_into_place(&self, full_name: &str) -> Result<(), VaultError> {
        let target = self.state.file_path(full_name);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(self.state.pending_path(self.id, full_name), &target).await?;
        Ok(())
    }

    /// Return moved files to the pending folder so that a rollback removes them.
    async fn move_back(&self, moved: &[&str]) {
        for full_name in moved.iter().rev() {
            let target = self.state.file_path(full_name);
            let pending = self.state.pending_path(self.id, full_name);
            if let Err(err) = tokio::fs::rename(&target, &pending).await {
                warn!("Failed to move '{}' back: {}", full_name, err);
            }
        }
    }
}

#[async_trait]
impl Transaction for FsTransaction {
    fn id(&self) -> u64 {
        self.id
    }

    fn status(&self) -> TransactionStatus {
        self.status
    }

    async fn commit(&mut self) -> Result<(), VaultError> {
        self.check_active()?;

        let entries = self
            .state
            .pending
            .read()
            .await
            .get(&self.id)
            .cloned()
            .unwrap_or_default();

        // check everything before moving anything, a failed commit can still be rolled back
        for entry in &entries {
            let path = self.state.pending_path(self.id, &entry.full_name);
            let written = tokio::fs::metadata(&path)
                .await
                .map_err(|_| conflict!("File '{}' was reserved but not written", entry.full_name))?
                .len();
            if written != entry.size {
                return Err(conflict!(
                    "File '{}' has {} bytes but {} were declared",
                    entry.full_name,
                    written,
                    entry.size
                ));
            }
        }

        let mut index = self.state.index.write().await;
        let mut updated = index.clone();
        for entry in &entries {
            updated.insert(
                entry.full_name.clone(),
                IndexEntry {
                    size: entry.size,
                    committed_at: Utc::now(),
                },
            );
        }
        self.state.save_index(&updated).await?;

        let mut moved = Vec::with_capacity(entries.len());
        for entry in &entries {
            if let Err(err) = self.move_into_place(&entry.full_name).await {
                warn!(
                    "Failed to move '{}' into the vault: {}",
                    entry.full_name, err
                );
                self.move_back(&moved).await;
                self.state.save_index(&index).await?;
                return Err(err);
            }
            moved.push(entry.full_name.as_str());
        }
        *index = updated;
        drop(index);

        self.state.pending.write().await.remove(&self.id);
        self.state.remove_tx_dir(self.id).await?;
        self.status = TransactionStatus::Committed;
        debug!("Transaction {} committed", self.id);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), VaultError> {
        self.check_active()?;

        self.state.pending.write().await.remove(&self.id);
        self.state.remove_tx_dir(self.id).await?;
        self.status = TransactionStatus::RolledBack;
        debug!("Transaction {} rolled back", self.id);
        Ok(())
    }
}
