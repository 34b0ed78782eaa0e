// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

pub mod converter;
pub mod fs_vault;
pub mod key;
pub mod locator;

use crate::vault::key::{DocumentIterationKey, DocumentMasterTemplateKey, PartIterationKey};
use async_trait::async_trait;
use docvault_base::error::VaultError;
use docvault_base::msg::part_api::PartMinimal;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
}

/// A unit of work over the vault, reservations become visible on commit.
#[async_trait]
pub trait Transaction: Send + Sync {
    fn id(&self) -> u64;

    fn status(&self) -> TransactionStatus;

    fn is_active(&self) -> bool {
        self.status() == TransactionStatus::Active
    }

    async fn commit(&mut self) -> Result<(), VaultError>;

    /// Discard the reservations and the written files
    async fn rollback(&mut self) -> Result<(), VaultError>;
}

pub type BoxedTransaction = Box<dyn Transaction>;

#[async_trait]
pub trait ManageTransactions: Send + Sync {
    async fn begin(&self) -> Result<BoxedTransaction, VaultError>;
}

#[async_trait]
pub trait ManageDocuments: Send + Sync {
    /// Resolve a committed vault file by its full name
    ///
    /// # Arguments
    ///
    /// * `full_name` - e.g. `ws/documents/DOC-1/A/1/drawing.pdf`
    async fn get_data_file(&self, full_name: &str) -> Result<PathBuf, VaultError>;

    /// Reserve or finalize a file of a document iteration
    ///
    /// # Arguments
    ///
    /// * `tx` - The active transaction
    /// * `size` - 0 to reserve, the written length to finalize
    ///
    /// # Returns
    ///
    /// Path where the content must be written
    async fn save_file_in_document(
        &self,
        tx: &dyn Transaction,
        key: &DocumentIterationKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError>;

    /// Reserve or finalize a file of a document template
    async fn save_file_in_template(
        &self,
        tx: &dyn Transaction,
        key: &DocumentMasterTemplateKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError>;
}

#[async_trait]
pub trait ManageProducts: Send + Sync {
    /// Reserve or finalize a file of a part iteration
    async fn save_file_in_part_iteration(
        &self,
        tx: &dyn Transaction,
        key: &PartIterationKey,
        file_name: &str,
        size: u64,
    ) -> Result<PathBuf, VaultError>;

    /// Parts of a workspace with their latest iteration
    async fn get_part_masters(&self, workspace_id: &str) -> Result<Vec<PartMinimal>, VaultError>;
}

/// Conversion of vault files for the in-browser viewers.
#[async_trait]
pub trait ConvertDocuments: Send + Sync {
    async fn convert_to_pdf(&self, source: &Path) -> Result<PathBuf, VaultError>;

    async fn convert_to_swf(&self, source: &Path) -> Result<PathBuf, VaultError>;
}

pub(crate) type BoxedConverter = Box<dyn ConvertDocuments>;
