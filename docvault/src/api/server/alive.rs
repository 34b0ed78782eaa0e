// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::HttpError;
use axum::http::StatusCode;

// GET | HEAD /alive
pub(super) async fn alive() -> Result<StatusCode, HttpError> {
    Ok(StatusCode::OK)
}
