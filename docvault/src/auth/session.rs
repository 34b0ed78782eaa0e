// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cfg::Cfg;
use axum::http::HeaderValue;
use axum_extra::headers::{Cookie, HeaderMap, HeaderMapExt};
use chrono::{DateTime, Utc};
use docvault_base::error::VaultError;
use docvault_base::internal_server_error;
use log::debug;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

pub(crate) const SESSION_COOKIE: &str = "docvault-session";

/// Server side state of a browser session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Set after a successful login
    pub login: Option<String>,
    pub groups: Vec<String>,
    /// The last login attempt failed
    pub has_fail: bool,
    /// The session was opened by a logout
    pub has_logout: bool,
}

struct Entry {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-memory session store, a session lives for a fixed time after it was opened.
pub struct SessionRepository {
    sessions: HashMap<String, Entry>,
    ttl: Duration,
}

impl SessionRepository {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Open a new session and return its id.
    pub fn create(&mut self, session: Session) -> String {
        self.remove_expired();

        let id = {
            let mut rng = rand::rng();
            (0..32)
                .map(|_| format!("{:x}", rng.random_range(0..16)))
                .collect::<String>()
        };

        self.sessions.insert(
            id.clone(),
            Entry {
                session,
                expires_at: self.expiry(),
            },
        );
        debug!("Session opened, {} active", self.sessions.len());
        id
    }

    /// Get a session which isn't expired yet.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions
            .get(id)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| &entry.session)
    }

    /// Drop a session, unknown ids are ignored.
    pub fn invalidate(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    fn expiry(&self) -> DateTime<Utc> {
        let now = Utc::now();
        i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add_signed(chrono::Duration::seconds(secs)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn remove_expired(&mut self) {
        let now = Utc::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }
}

/// Session id from the request cookie.
pub(crate) fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string))
}

/// `Set-Cookie` value for a session, marked `Secure` when the server is behind TLS.
pub(crate) fn session_cookie(cfg: &Cfg, id: &str) -> Result<HeaderValue, VaultError> {
    cookie(cfg, &format!("{}={}", SESSION_COOKIE, id))
}

/// `Set-Cookie` value which removes the session cookie in the browser.
pub(crate) fn clear_session_cookie(cfg: &Cfg) -> Result<HeaderValue, VaultError> {
    cookie(cfg, &format!("{}=; Max-Age=0", SESSION_COOKIE))
}

fn cookie(cfg: &Cfg, value: &str) -> Result<HeaderValue, VaultError> {
    let secure = if cfg.cert_path.is_some() { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}; Path={}; HttpOnly; SameSite=Lax{}",
        value, cfg.api_base_path, secure
    ))
    .map_err(|err| internal_server_error!("Invalid session cookie: {}", err))
}
