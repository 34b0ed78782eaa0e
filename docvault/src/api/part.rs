// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::middleware::check_permissions;
use crate::api::{Components, HttpError};
use crate::auth::policy::AuthenticatedPolicy;
use axum::extract::{Path, State};
use axum::routing::get;
use axum_extra::headers::HeaderMap;
use docvault_base::msg::part_api::PartMinimalList;
use docvault_macros::{IntoResponse, Twin};
use std::sync::Arc;

#[derive(IntoResponse, Twin, Default)]
pub struct PartMinimalListAxum(PartMinimalList);

// GET /workspaces/{workspace}/parts
async fn list_parts(
    State(components): State<Arc<Components>>,
    Path(workspace): Path<String>,
    headers: HeaderMap,
) -> Result<PartMinimalListAxum, HttpError> {
    check_permissions(&components, &headers, AuthenticatedPolicy {}).await?;

    let mut list = PartMinimalList::default();
    for part in components.products.get_part_masters(&workspace).await? {
        list.add_part(part);
    }
    Ok(list.into())
}

pub(super) fn create_part_api_routes() -> axum::Router<Arc<Components>> {
    axum::Router::new().route("/", get(list_parts))
}
