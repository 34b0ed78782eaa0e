// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod download;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::routing::get;
use docvault_base::bad_request;
use std::sync::Arc;

use crate::api::{Components, HttpError};
use crate::vault::locator::VaultLocator;

/// Size of the chunks relayed between the request or response body and a vault file.
const CHUNK_SIZE: usize = 8 * 1024;
const BUFFER_SIZE: usize = 16 * 1024;

/// Decode the vault file addressed by the request.
///
/// The raw path of the URI is used so that escaped slashes stay inside their segment.
fn locator(components: &Components, uri: &Uri) -> Result<VaultLocator, HttpError> {
    let prefix = format!("{}files/", components.cfg.api_base_path);
    let path = uri
        .path()
        .strip_prefix(&prefix)
        .ok_or_else(|| bad_request!("Path '{}' doesn't address a vault file", uri.path()))?;
    Ok(VaultLocator::parse(path)?)
}

pub(super) fn create_file_routes(max_upload_size: u64) -> axum::Router<Arc<Components>> {
    axum::Router::new()
        .route("/{*path}", get(download::download).post(upload::upload))
        .layer(DefaultBodyLimit::max(
            usize::try_from(max_upload_size).unwrap_or(usize::MAX),
        ))
}
