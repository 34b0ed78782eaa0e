// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod account;

use crate::api::Components;
use crate::auth::account_repository::AccountSettings;
use crate::auth::caller_auth::CallerAuthorization;
use crate::auth::jwt::JwtFactory;
use crate::auth::session::SessionRepository;
use crate::auth::user_manager::{BoxedUserManager, LogNotifier, UserManager};
use crate::core::env::{Env, GetEnv};
use crate::vault::converter::CommandConverter;
use crate::vault::fs_vault::FsVault;
use bytesize::ByteSize;
use docvault_base::error::VaultError;
use docvault_base::internal_server_error;
use log::info;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_PORT: u16 = 8080;
const VAULT_DIR: &str = "vault";
const CONVERSIONS_DIR: &str = "conversions";

/// Server configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Cfg {
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub api_base_path: String,
    pub data_path: PathBuf,
    pub cert_path: Option<PathBuf>,
    pub cert_key_path: Option<PathBuf>,
    pub cors_allow_origin: Vec<String>,
    pub session_enabled: bool,
    pub session_ttl: Duration,
    pub jwt_enabled: bool,
    pub jwt_key: String,
    pub jwt_ttl: Duration,
    pub recovery_ttl: Duration,
    pub pdf_converter_cmd: String,
    pub swf_converter_cmd: String,
    pub max_upload_size: u64,
    /// Provisioned accounts by login
    pub accounts: HashMap<String, AccountSettings>,
}

impl Default for Cfg {
    fn default() -> Self {
        Cfg {
            log_level: "INFO".to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_base_path: "/".to_string(),
            data_path: PathBuf::from("/data"),
            cert_path: None,
            cert_key_path: None,
            cors_allow_origin: vec![],
            session_enabled: true,
            session_ttl: Duration::from_secs(1800),
            jwt_enabled: false,
            jwt_key: String::new(),
            jwt_ttl: Duration::from_secs(86400),
            recovery_ttl: Duration::from_secs(86400),
            pdf_converter_cmd: "soffice".to_string(),
            swf_converter_cmd: "pdf2swf".to_string(),
            max_upload_size: ByteSize::gb(1).as_u64(),
            accounts: HashMap::new(),
        }
    }
}

/// Reads the configuration from the environment and builds the components of the server.
pub struct CfgParser<EnvGetter: GetEnv> {
    pub cfg: Cfg,
    env: Env<EnvGetter>,
}

impl<EnvGetter: GetEnv> CfgParser<EnvGetter> {
    pub fn from_env(env_getter: EnvGetter) -> Self {
        let mut env = Env::new(env_getter);
        let default = Cfg::default();

        let mut cfg = Cfg {
            log_level: env.get("DV_LOG_LEVEL", default.log_level),
            host: env.get("DV_HOST", default.host),
            port: env.get("DV_PORT", default.port),
            api_base_path: normalize_base_path(&env.get("DV_API_BASE_PATH", default.api_base_path)),
            data_path: PathBuf::from(
                env.get::<String>("DV_DATA_PATH", default.data_path.to_string_lossy().to_string()),
            ),
            cert_path: env.get_optional::<String>("DV_CERT_PATH").map(PathBuf::from),
            cert_key_path: env.get_optional::<String>("DV_CERT_KEY_PATH").map(PathBuf::from),
            cors_allow_origin: Self::parse_cors_allow_origin(&mut env),
            session_enabled: env.get("DV_SESSION_ENABLED", default.session_enabled),
            session_ttl: Duration::from_secs(
                env.get("DV_SESSION_TTL", default.session_ttl.as_secs()),
            ),
            jwt_enabled: env.get("DV_JWT_ENABLED", default.jwt_enabled),
            jwt_key: env.get_masked("DV_JWT_KEY", default.jwt_key),
            jwt_ttl: Duration::from_secs(env.get("DV_JWT_TTL", default.jwt_ttl.as_secs())),
            recovery_ttl: Duration::from_secs(
                env.get("DV_RECOVERY_TTL", default.recovery_ttl.as_secs()),
            ),
            pdf_converter_cmd: env.get("DV_PDF_CONVERTER_CMD", default.pdf_converter_cmd),
            swf_converter_cmd: env.get("DV_SWF_CONVERTER_CMD", default.swf_converter_cmd),
            max_upload_size: env
                .get("DV_MAX_UPLOAD_SIZE", ByteSize::b(default.max_upload_size))
                .as_u64(),
            accounts: HashMap::new(),
        };

        cfg.accounts = Self::parse_accounts(&mut env);

        CfgParser { cfg, env }
    }

    pub async fn build(&self) -> Result<Components, VaultError> {
        self.validate()?;
        let accounts = self.provision_accounts().await?;
        let users: BoxedUserManager = Box::new(UserManager::new(
            Arc::clone(&accounts),
            self.cfg.recovery_ttl,
            Box::new(LogNotifier {}),
        ));

        let vault = Arc::new(FsVault::new(self.cfg.data_path.join(VAULT_DIR)).await?);
        let converter = CommandConverter::new(
            self.cfg.data_path.join(CONVERSIONS_DIR),
            &self.cfg.pdf_converter_cmd,
            &self.cfg.swf_converter_cmd,
        );

        let jwt = if self.cfg.jwt_enabled {
            Some(JwtFactory::new(&self.cfg.jwt_key, self.cfg.jwt_ttl))
        } else {
            None
        };

        info!(
            "Sessions {}, tokens {}",
            if self.cfg.session_enabled { "enabled" } else { "disabled" },
            if jwt.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Components {
            accounts,
            users: RwLock::new(users),
            documents: vault.clone(),
            products: vault.clone(),
            transactions: vault,
            converter: Box::new(converter),
            sessions: RwLock::new(SessionRepository::new(self.cfg.session_ttl)),
            auth: CallerAuthorization::new(jwt, self.cfg.session_enabled),
            started_at: Instant::now(),
            cfg: self.cfg.clone(),
        })
    }

    /// Settings that would weaken authentication or transport security stop the server.
    fn validate(&self) -> Result<(), VaultError> {
        if self.cfg.jwt_enabled && self.cfg.jwt_key.is_empty() {
            return Err(internal_server_error!(
                "DV_JWT_ENABLED is set but DV_JWT_KEY is empty"
            ));
        }

        if self.cfg.cert_path.is_some() != self.cfg.cert_key_path.is_some() {
            return Err(internal_server_error!(
                "DV_CERT_PATH and DV_CERT_KEY_PATH must be set together"
            ));
        }
        Ok(())
    }

    fn parse_cors_allow_origin(env: &mut Env<EnvGetter>) -> Vec<String> {
        env.get_optional::<String>("DV_CORS_ALLOW_ORIGIN")
            .unwrap_or_default()
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

impl<EnvGetter: GetEnv> Display for CfgParser<EnvGetter> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.env.message())
    }
}

fn normalize_base_path(path: &str) -> String {
    let mut path = path.trim().to_string();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
