// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::connection::{redirect_with_session, renew_session};
use crate::api::{Components, HttpError};
use crate::auth::session::{session_id, Session};
use axum::extract::State;
use axum::response::Response;
use axum::Form;
use axum_extra::headers::HeaderMap;
use docvault_base::msg::connection_api::ConnectionForm;
use docvault_base::not_found;
use log::{debug, info};
use std::sync::Arc;

const ADMIN_ROLE: &str = "admin";

// POST /connection/login
pub(super) async fn login(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
    Form(form): Form<ConnectionForm>,
) -> Result<Response, HttpError> {
    let base_path = &components.cfg.api_base_path;

    // several tabs may share the browser session
    if let Some(id) = session_id(&headers) {
        components.sessions.write().await.invalidate(&id);
    }

    let account = components
        .accounts
        .read()
        .await
        .authenticate_account(&form.login, &form.password)
        .await?;

    if !account.is_some_and(|account| account.enabled) {
        debug!("Connection of '{}' rejected", form.login);
        let id = renew_session(
            &components,
            &headers,
            Session {
                has_fail: true,
                has_logout: false,
                ..Session::default()
            },
        )
        .await;
        return redirect_with_session(&components, &id, base_path);
    }

    let account = components.users.read().await.get_account(&form.login).await?;
    if account.login != form.login {
        return Err(not_found!("Account '{}' doesn't exist", form.login).into());
    }

    let mapping = components
        .accounts
        .read()
        .await
        .get_user_group_mapping(&account.login)
        .await?;
    let groups = if mapping.group_name.is_empty() {
        vec![]
    } else {
        vec![mapping.group_name]
    };

    let id = renew_session(
        &components,
        &headers,
        Session {
            login: Some(account.login.clone()),
            groups,
            ..Session::default()
        },
    )
    .await;

    let location = redirect_location(&components, &account.login, form.origin_url).await?;
    info!("'{}' connected, redirect to {}", account.login, location);
    redirect_with_session(&components, &id, &location)
}

async fn redirect_location(
    components: &Components,
    login: &str,
    origin_url: Option<String>,
) -> Result<String, HttpError> {
    let base_path = &components.cfg.api_base_path;
    let users = components.users.read().await;

    if users.is_caller_in_role(login, ADMIN_ROLE).await? {
        return Ok(format!("{}admin/workspaces", base_path));
    }

    if let Some(origin_url) = origin_url.filter(|url| is_local_url(url)) {
        return Ok(origin_url);
    }

    let workspaces = users.get_workspaces_where_caller_is_active(login).await?;
    Ok(match workspaces.first() {
        Some(workspace) => format!("{}document-management/#{}", base_path, workspace),
        None => format!("{}admin/workspaces", base_path),
    })
}

/// Only relative URLs of this host are followed after login.
fn is_local_url(url: &str) -> bool {
    url.len() > 1 && url.starts_with('/') && !url.starts_with("//")
}
