// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::auth::jwt::JwtFactory;
use crate::auth::policy::Policy;
use crate::auth::session::{session_id, SessionRepository};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMap, HeaderMapExt};
use docvault_base::error::VaultError;
use docvault_base::unauthorized;

const ANONYMOUS: &str = "anonymous";

/// Identity behind a request.
#[derive(Clone, Debug, PartialEq)]
pub struct Caller {
    pub login: String,
    pub groups: Vec<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Caller {
            login: ANONYMOUS.to_string(),
            groups: vec![],
        }
    }
}

/// Authorization by a bearer token or a session cookie
pub struct CallerAuthorization {
    jwt: Option<JwtFactory>,
    session_enabled: bool,
}

impl CallerAuthorization {
    /// Create a new CallerAuthorization
    ///
    /// # Arguments
    /// * `jwt` - Token factory if tokens are issued, bearer headers are ignored otherwise.
    /// * `session_enabled` - Accept the session cookie. If neither is enabled any caller is anonymous.
    pub fn new(jwt: Option<JwtFactory>, session_enabled: bool) -> Self {
        Self {
            jwt,
            session_enabled,
        }
    }

    pub fn jwt(&self) -> Option<&JwtFactory> {
        self.jwt.as_ref()
    }

    pub fn session_enabled(&self) -> bool {
        self.session_enabled
    }

    /// Resolve the caller of a request and check it against a policy.
    pub fn check<Plc>(
        &self,
        headers: &HeaderMap,
        sessions: &SessionRepository,
        policy: Plc,
    ) -> Result<Caller, VaultError>
    where
        Plc: Policy,
    {
        if self.jwt.is_none() && !self.session_enabled {
            return Ok(Caller::anonymous());
        }

        policy.validate(self.resolve(headers, sessions))
    }

    fn resolve(
        &self,
        headers: &HeaderMap,
        sessions: &SessionRepository,
    ) -> Result<Caller, VaultError> {
        if let Some(jwt) = &self.jwt {
            if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
                let claims = jwt.validate(bearer.token())?;
                return Ok(Caller {
                    login: claims.sub,
                    groups: claims.groups,
                });
            }
        }

        if self.session_enabled {
            let session = session_id(headers).and_then(|id| sessions.get(&id).cloned());
            if let Some(session) = session {
                if let Some(login) = session.login {
                    return Ok(Caller {
                        login,
                        groups: session.groups,
                    });
                }
            }
        }

        Err(unauthorized!("No valid session or bearer token in request"))
    }
}
