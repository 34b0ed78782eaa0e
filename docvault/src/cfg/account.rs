// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::auth::account_repository::{
    AccountRepository, AccountSettings, BoxedAccountRepository, ManageAccounts,
    SharedAccountRepository,
};
use crate::cfg::CfgParser;
use crate::core::env::{Env, GetEnv};
use docvault_base::error::VaultError;
use docvault_base::msg::auth_api::Account;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

impl<EnvGetter: GetEnv> CfgParser<EnvGetter> {
    pub(in crate::cfg) async fn provision_accounts(
        &self,
    ) -> Result<SharedAccountRepository, VaultError> {
        let mut repo = AccountRepository::new(self.cfg.data_path.clone()).await?;

        for (login, settings) in &self.cfg.accounts {
            if let Err(err) = repo.upsert_account(settings.clone()).await {
                error!("Failed to provision account '{}': {}", login, err);
            } else {
                info!(
                    "Provisioned account '{}' in group '{}' with workspaces {:?}",
                    login, settings.group, settings.workspaces
                );
            }
        }

        let repo: BoxedAccountRepository = Box::new(repo);
        Ok(Arc::new(RwLock::new(repo)))
    }

    pub(in crate::cfg) fn parse_accounts(
        env: &mut Env<EnvGetter>,
    ) -> HashMap<String, AccountSettings> {
        let mut accounts = HashMap::<String, AccountSettings>::new();
        for (id, login) in env.matches::<String>("DV_ACCOUNT_(.*)_LOGIN") {
            let settings = AccountSettings {
                account: Account {
                    login,
                    ..Account::default()
                },
                ..AccountSettings::default()
            };
            accounts.insert(id, settings);
        }

        for (id, settings) in &mut accounts {
            settings.password =
                env.get_masked::<String>(&format!("DV_ACCOUNT_{}_PASSWORD", id), String::new());
        }

        accounts.retain(|_, settings| {
            if settings.password.is_empty() {
                warn!(
                    "Account '{}' has no password. Drop it.",
                    settings.account.login
                );
                false
            } else {
                true
            }
        });

        let parse_list_env = |env: &mut Env<EnvGetter>, name: String| -> Vec<String> {
            env.get_optional::<String>(&name)
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        for (id, settings) in &mut accounts {
            let account = &mut settings.account;
            account.name = env
                .get_optional(&format!("DV_ACCOUNT_{}_NAME", id))
                .unwrap_or_default();
            account.email = env
                .get_optional(&format!("DV_ACCOUNT_{}_EMAIL", id))
                .unwrap_or_default();
            account.language = env
                .get_optional(&format!("DV_ACCOUNT_{}_LANGUAGE", id))
                .unwrap_or_else(|| "en".to_string());
            account.enabled = env
                .get_optional(&format!("DV_ACCOUNT_{}_ENABLED", id))
                .unwrap_or(true);

            settings.group = env
                .get_optional(&format!("DV_ACCOUNT_{}_GROUP", id))
                .unwrap_or_default();
            settings.workspaces = parse_list_env(env, format!("DV_ACCOUNT_{}_WORKSPACES", id));
        }

        accounts
            .into_values()
            .map(|settings| (settings.account.login.clone(), settings))
            .collect()
    }
}
