// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::auth::{AccountAxum, LoginRequestAxum};
use crate::api::{Components, HttpError};
use crate::auth::session::{clear_session_cookie, session_cookie, session_id, Session};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::HeaderMap;
use docvault_base::msg::auth_api::LoginRequest;
use docvault_base::{forbidden, internal_server_error};
use log::{debug, info};
use std::sync::Arc;

// POST /login
pub(super) async fn login(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
    request: LoginRequestAxum,
) -> Result<Response, HttpError> {
    let request = LoginRequest::from(request);
    let session_enabled = components.auth.session_enabled();

    let account = components
        .accounts
        .read()
        .await
        .authenticate_account(&request.login, &request.password)
        .await?;

    let account = match account {
        Some(account) if account.enabled => account,
        _ => {
            debug!("Login of '{}' rejected", request.login);
            let mut response = HttpError::from(forbidden!("Authentication failed")).into_response();
            if session_enabled {
                if let Some(id) = session_id(&headers) {
                    components.sessions.write().await.invalidate(&id);
                }
                response
                    .headers_mut()
                    .insert(SET_COOKIE, clear_session_cookie(&components.cfg)?);
            }
            return Ok(response);
        }
    };

    let mapping = components
        .accounts
        .read()
        .await
        .get_user_group_mapping(&account.login)
        .await?;

    let mut response = AccountAxum::from(account).into_response();
    if session_enabled {
        let groups = if mapping.group_name.is_empty() {
            vec![]
        } else {
            vec![mapping.group_name.clone()]
        };

        let mut sessions = components.sessions.write().await;
        if let Some(id) = session_id(&headers) {
            sessions.invalidate(&id);
        }
        let id = sessions.create(Session {
            login: Some(mapping.login.clone()),
            groups,
            ..Session::default()
        });
        response
            .headers_mut()
            .insert(SET_COOKIE, session_cookie(&components.cfg, &id)?);
    }

    if let Some(jwt) = components.auth.jwt() {
        let token = jwt.create_token(&mapping)?;
        let token = HeaderValue::from_str(&token)
            .map_err(|_| internal_server_error!("Invalid token for '{}'", mapping.login))?;
        response.headers_mut().insert("jwt", token);
    }

    info!("'{}' logged in", mapping.login);
    Ok(response)
}
