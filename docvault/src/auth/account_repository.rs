// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::auth::password::{hash_password, verify_password};
use async_trait::async_trait;
use docvault_base::error::VaultError;
use docvault_base::msg::auth_api::{Account, UserGroupMapping};
use docvault_base::{internal_server_error, not_found, unprocessable_entity};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

const ACCOUNT_REPO_FILE_NAME: &str = ".accounts";
const ADMIN_GROUP: &str = "admin";

/// Account with credentials and memberships, as provisioned from the configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountSettings {
    pub account: Account,
    pub password: String,
    pub group: String,
    pub workspaces: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct AccountRecord {
    account: Account,
    password_hash: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    workspaces: Vec<String>,
}

#[async_trait]
pub trait ManageAccounts: Send + Sync {
    /// Check credentials
    ///
    /// # Arguments
    ///
    /// `login` - The login, matched case-insensitively
    /// `password` - The password
    ///
    /// # Returns
    ///
    /// The account if the password matches, disabled accounts are returned too
    async fn authenticate_account(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<Account>, VaultError>;

    /// Get an account by login, the lookup is case-insensitive
    async fn get_account(&self, login: &str) -> Result<Account, VaultError>;

    /// Get the group of a login
    async fn get_user_group_mapping(&self, login: &str) -> Result<UserGroupMapping, VaultError>;

    /// Get the workspaces where the login is an active member
    async fn get_active_workspaces(&self, login: &str) -> Result<Vec<String>, VaultError>;

    /// Set a new password and save the repository
    async fn update_password(&mut self, login: &str, password: &str) -> Result<(), VaultError>;

    /// Create or replace an account and save the repository
    async fn upsert_account(&mut self, settings: AccountSettings) -> Result<(), VaultError>;
}

pub(crate) type BoxedAccountRepository = Box<dyn ManageAccounts>;
pub(crate) type SharedAccountRepository = Arc<RwLock<BoxedAccountRepository>>;

/// Accounts persisted as JSON in the data path.
pub(crate) struct AccountRepository {
    config_path: PathBuf,
    repo: HashMap<String, AccountRecord>,
}

impl AccountRepository {
    /// Load the account repository from the file system or create an empty one
    ///
    /// # Arguments
    ///
    /// * `data_path` - The path to the data directory
    pub async fn new(data_path: PathBuf) -> Result<AccountRepository, VaultError> {
        let config_path = data_path.join(ACCOUNT_REPO_FILE_NAME);
        let mut account_repository = AccountRepository {
            config_path,
            repo: HashMap::new(),
        };

        match tokio::fs::read(&account_repository.config_path).await {
            Ok(buf) => {
                debug!(
                    "Loading account repository from {}",
                    account_repository.config_path.display()
                );
                let records: Vec<AccountRecord> = serde_json::from_slice(&buf).map_err(|err| {
                    internal_server_error!("Could not decode account repository: {}", err)
                })?;
                for record in records {
                    account_repository
                        .repo
                        .insert(record.account.login.to_lowercase(), record);
                }
            }
            Err(_) => {
                debug!(
                    "Creating a new account repository {}",
                    account_repository.config_path.display()
                );
                tokio::fs::create_dir_all(&data_path).await?;
                account_repository.save_repo().await?;
            }
        }

        Ok(account_repository)
    }

    async fn save_repo(&self) -> Result<(), VaultError> {
        let mut records: Vec<&AccountRecord> = self.repo.values().collect();
        records.sort_by(|a, b| a.account.login.cmp(&b.account.login));
        let buf = serde_json::to_vec_pretty(&records)
            .map_err(|_| internal_server_error!("Could not encode account repository"))?;
        tokio::fs::write(&self.config_path, buf).await?;
        Ok(())
    }

    fn record(&self, login: &str) -> Result<&AccountRecord, VaultError> {
        self.repo
            .get(&login.to_lowercase())
            .ok_or_else(|| not_found!("Account '{}' doesn't exist", login))
    }
}

#[async_trait]
impl ManageAccounts for AccountRepository {
    async fn authenticate_account(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<Account>, VaultError> {
        let Some(record) = self.repo.get(&login.to_lowercase()) else {
            return Ok(None);
        };

        if verify_password(password, &record.password_hash) {
            Ok(Some(record.account.clone()))
        } else {
            Ok(None)
        }
    }

    async fn get_account(&self, login: &str) -> Result<Account, VaultError> {
        Ok(self.record(login)?.account.clone())
    }

    async fn get_user_group_mapping(&self, login: &str) -> Result<UserGroupMapping, VaultError> {
        let record = self.record(login)?;
        Ok(UserGroupMapping {
            login: record.account.login.clone(),
            group_name: record.group.clone(),
        })
    }

    async fn get_active_workspaces(&self, login: &str) -> Result<Vec<String>, VaultError> {
        Ok(self.record(login)?.workspaces.clone())
    }

    async fn update_password(&mut self, login: &str, password: &str) -> Result<(), VaultError> {
        if password.is_empty() {
            return Err(unprocessable_entity!("Password can't be empty"));
        }

        let record = self
            .repo
            .get_mut(&login.to_lowercase())
            .ok_or_else(|| not_found!("Account '{}' doesn't exist", login))?;
        record.password_hash = hash_password(password);
        self.save_repo().await
    }

    async fn upsert_account(&mut self, settings: AccountSettings) -> Result<(), VaultError> {
        if settings.account.login.is_empty() {
            return Err(unprocessable_entity!("Login can't be empty"));
        }

        let mut account = settings.account;
        account.admin = settings.group == ADMIN_GROUP;

        // keep the stored hash if no new password is given
        let password_hash = if settings.password.is_empty() {
            self.repo
                .get(&account.login.to_lowercase())
                .map(|record| record.password_hash.clone())
                .ok_or_else(|| {
                    unprocessable_entity!("Account '{}' has no password", account.login)
                })?
        } else {
            hash_password(&settings.password)
        };

        info!("Account '{}' stored", account.login);
        self.repo.insert(
            account.login.to_lowercase(),
            AccountRecord {
                account,
                password_hash,
                group: settings.group,
                workspaces: settings.workspaces,
            },
        );
        self.save_repo().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    #[fixture]
    fn path() -> PathBuf {
        tempdir().unwrap().keep()
    }

    #[fixture]
    fn settings() -> AccountSettings {
        AccountSettings {
            account: Account {
                login: "John".to_string(),
                name: "John Doe".to_string(),
                enabled: true,
                ..Default::default()
            },
            password: "secret".to_string(),
            group: "designers".to_string(),
            workspaces: vec!["ws-1".to_string()],
        }
    }

    #[fixture]
    async fn repo(path: PathBuf, settings: AccountSettings) -> AccountRepository {
        let mut repo = AccountRepository::new(path).await.unwrap();
        repo.upsert_account(settings).await.unwrap();
        repo
    }

    #[rstest]
    #[tokio::test]
    async fn test_authenticate(#[future] repo: AccountRepository) {
        let repo = repo.await;
        let account = repo
            .authenticate_account("john", "secret")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.login, "John", "stored login is returned");

        assert_eq!(repo.authenticate_account("john", "wrong").await, Ok(None));
        assert_eq!(repo.authenticate_account("jane", "secret").await, Ok(None));
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_account(#[future] repo: AccountRepository) {
        let repo = repo.await;
        assert_eq!(repo.get_account("JOHN").await.unwrap().name, "John Doe");
        assert_eq!(
            repo.get_account("jane").await,
            Err(not_found!("Account 'jane' doesn't exist"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_group_and_workspaces(#[future] repo: AccountRepository) {
        let repo = repo.await;
        assert_eq!(
            repo.get_user_group_mapping("john").await.unwrap(),
            UserGroupMapping {
                login: "John".to_string(),
                group_name: "designers".to_string()
            }
        );
        assert_eq!(
            repo.get_active_workspaces("john").await.unwrap(),
            vec!["ws-1".to_string()]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_password(#[future] repo: AccountRepository) {
        let mut repo = repo.await;
        repo.update_password("john", "new-secret").await.unwrap();
        assert!(repo
            .authenticate_account("john", "new-secret")
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            repo.update_password("john", "").await,
            Err(unprocessable_entity!("Password can't be empty"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_admin_flag(path: PathBuf, mut settings: AccountSettings) {
        let mut repo = AccountRepository::new(path).await.unwrap();
        settings.group = "admin".to_string();
        repo.upsert_account(settings).await.unwrap();
        assert!(repo.get_account("john").await.unwrap().admin);
    }

    #[rstest]
    #[tokio::test]
    async fn test_keep_password_on_upsert(#[future] repo: AccountRepository) {
        let mut repo = repo.await;
        repo.upsert_account(AccountSettings {
            account: Account {
                login: "john".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(repo
            .authenticate_account("john", "secret")
            .await
            .unwrap()
            .is_some());

        assert_eq!(
            repo.upsert_account(AccountSettings {
                account: Account {
                    login: "jane".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await,
            Err(unprocessable_entity!("Account 'jane' has no password"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_persistent(path: PathBuf, settings: AccountSettings) {
        let mut repo = AccountRepository::new(path.clone()).await.unwrap();
        repo.upsert_account(settings).await.unwrap();

        let repo = AccountRepository::new(path).await.unwrap();
        assert!(repo
            .authenticate_account("john", "secret")
            .await
            .unwrap()
            .is_some());
    }
}
