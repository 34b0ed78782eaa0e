// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::auth::account_repository::SharedAccountRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_base::error::VaultError;
use docvault_base::msg::auth_api::Account;
use docvault_base::not_found;
use log::{info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

/// Delivery of password recovery links.
pub trait NotifyRecovery: Send + Sync {
    fn send_recovery(&self, account: &Account, uuid: &str) -> Result<(), VaultError>;
}

/// Writes the recovery link to the log, for installations without a mail relay.
pub struct LogNotifier {}

impl NotifyRecovery for LogNotifier {
    fn send_recovery(&self, account: &Account, uuid: &str) -> Result<(), VaultError> {
        info!(
            "Password recovery for '{}' <{}>: uuid={}",
            account.login, account.email, uuid
        );
        Ok(())
    }
}

#[async_trait]
pub trait ManageUsers: Send + Sync {
    /// Get an account by login
    async fn get_account(&self, login: &str) -> Result<Account, VaultError>;

    /// Register a recovery request and notify the owner of the account
    ///
    /// # Returns
    ///
    /// The uuid of the request, a failed notification doesn't fail the request
    async fn create_password_recovery_request(
        &mut self,
        account: &Account,
    ) -> Result<String, VaultError>;

    /// Apply a new password for a pending recovery request, the request is consumed
    async fn recover_password(&mut self, uuid: &str, new_password: &str)
        -> Result<(), VaultError>;

    /// Check if the login belongs to a group
    async fn is_caller_in_role(&self, login: &str, role: &str) -> Result<bool, VaultError>;

    /// Workspaces where the login is an active member
    async fn get_workspaces_where_caller_is_active(
        &self,
        login: &str,
    ) -> Result<Vec<String>, VaultError>;
}

pub(crate) type BoxedUserManager = Box<dyn ManageUsers>;

struct Recovery {
    login: String,
    created_at: DateTime<Utc>,
}

/// User management over the account repository with an in-memory recovery registry.
pub(crate) struct UserManager {
    accounts: SharedAccountRepository,
    recoveries: HashMap<String, Recovery>,
    ttl: Duration,
    notifier: Box<dyn NotifyRecovery>,
}

impl UserManager {
    pub fn new(
        accounts: SharedAccountRepository,
        ttl: Duration,
        notifier: Box<dyn NotifyRecovery>,
    ) -> Self {
        Self {
            accounts,
            recoveries: HashMap::new(),
            ttl,
            notifier,
        }
    }

    fn is_expired(&self, recovery: &Recovery) -> bool {
        let age = Utc::now().signed_duration_since(recovery.created_at);
        age.to_std().map_or(false, |age| age >= self.ttl)
    }
}

#[async_trait]
impl ManageUsers for UserManager {
    async fn get_account(&self, login: &str) -> Result<Account, VaultError> {
        self.accounts.read().await.get_account(login).await
    }

    async fn create_password_recovery_request(
        &mut self,
        account: &Account,
    ) -> Result<String, VaultError> {
        let uuid = {
            let mut rng = rand::rng();
            let bytes: [u8; 16] = rng.random();
            hex::encode(bytes)
        };

        let ttl = self.ttl;
        let now = Utc::now();
        self.recoveries.retain(|_, recovery| {
            now.signed_duration_since(recovery.created_at)
                .to_std()
                .map_or(true, |age| age < ttl)
        });
        self.recoveries.insert(
            uuid.clone(),
            Recovery {
                login: account.login.clone(),
                created_at: now,
            },
        );

        if let Err(err) = self.notifier.send_recovery(account, &uuid) {
            warn!(
                "Failed to send recovery link to '{}': {}",
                account.login, err
            );
        }

        Ok(uuid)
    }

    async fn recover_password(
        &mut self,
        uuid: &str,
        new_password: &str,
    ) -> Result<(), VaultError> {
        let expired = match self.recoveries.get(uuid) {
            Some(recovery) => self.is_expired(recovery),
            None => return Err(not_found!("Recovery request '{}' doesn't exist", uuid)),
        };

        if expired {
            self.recoveries.remove(uuid);
            return Err(not_found!("Recovery request '{}' has expired", uuid));
        }

        let login = match self.recoveries.get(uuid) {
            Some(recovery) => recovery.login.clone(),
            None => return Err(not_found!("Recovery request '{}' doesn't exist", uuid)),
        };

        self.accounts
            .write()
            .await
            .update_password(&login, new_password)
            .await?;
        self.recoveries.remove(uuid);
        info!("Password of '{}' recovered", login);
        Ok(())
    }

    async fn is_caller_in_role(&self, login: &str, role: &str) -> Result<bool, VaultError> {
        let mapping = self.accounts.read().await.get_user_group_mapping(login).await?;
        Ok(mapping.group_name == role)
    }

    async fn get_workspaces_where_caller_is_active(
        &self,
        login: &str,
    ) -> Result<Vec<String>, VaultError> {
        self.accounts.read().await.get_active_workspaces(login).await
    }
}
