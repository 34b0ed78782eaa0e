// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::middleware::check_permissions;
use crate::api::server::ServerInfoAxum;
use crate::api::{Components, HttpError};
use crate::auth::policy::AnonymousPolicy;
use axum::extract::State;
use axum_extra::headers::HeaderMap;
use docvault_base::msg::server_api::ServerInfo;

use std::sync::Arc;

// GET /info
pub(super) async fn info(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
) -> Result<ServerInfoAxum, HttpError> {
    check_permissions(&components, &headers, AnonymousPolicy {}).await?;

    Ok(ServerInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: components.started_at.elapsed().as_secs(),
        session_enabled: components.auth.session_enabled(),
        jwt_enabled: components.auth.jwt().is_some(),
    }
    .into())
}
