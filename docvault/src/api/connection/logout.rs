// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::connection::{redirect_with_session, renew_session};
use crate::api::{Components, HttpError};
use crate::auth::session::Session;
use axum::extract::State;
use axum::response::Response;
use axum_extra::headers::HeaderMap;
use std::sync::Arc;

// POST /connection/logout
pub(super) async fn logout(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let id = renew_session(
        &components,
        &headers,
        Session {
            has_fail: false,
            has_logout: true,
            ..Session::default()
        },
    )
    .await;
    redirect_with_session(&components, &id, &components.cfg.api_base_path)
}
