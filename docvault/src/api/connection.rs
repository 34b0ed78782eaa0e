// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod login;
mod logout;
mod status;

use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use docvault_base::msg::connection_api::ConnectionStatus;
use docvault_macros::{IntoResponse, Twin};
use std::sync::Arc;

use crate::api::{Components, HttpError};
use crate::auth::session::{session_cookie, session_id, Session};
use axum_extra::headers::HeaderMap;

#[derive(IntoResponse, Twin)]
pub struct ConnectionStatusAxum(ConnectionStatus);

/// Drop the current session of the browser and open a new one with the given state.
///
/// # Returns
///
/// The id of the new session
async fn renew_session(components: &Components, headers: &HeaderMap, session: Session) -> String {
    let mut sessions = components.sessions.write().await;
    if let Some(id) = session_id(headers) {
        sessions.invalidate(&id);
    }
    sessions.create(session)
}

/// 303 redirect which also sets the session cookie.
fn redirect_with_session(
    components: &Components,
    id: &str,
    location: &str,
) -> Result<Response, HttpError> {
    let cookie = session_cookie(&components.cfg, id)?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to(location)).into_response())
}

pub(super) fn create_connection_routes() -> axum::Router<Arc<Components>> {
    axum::Router::new()
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/status", get(status::status))
}
