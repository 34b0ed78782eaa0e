// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod alive;
mod info;

use std::sync::Arc;

use axum::routing::get;

use docvault_base::msg::server_api::ServerInfo;
use docvault_macros::{IntoResponse, Twin};

use crate::api::Components;

#[derive(IntoResponse, Twin)]
pub struct ServerInfoAxum(ServerInfo);

pub(super) fn create_server_api_routes() -> axum::Router<Arc<Components>> {
    axum::Router::new()
        .route("/info", get(info::info))
        .route("/alive", get(alive::alive).head(alive::alive))
}
