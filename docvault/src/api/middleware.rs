// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};

use axum::middleware::Next;
use axum::response::IntoResponse;
use docvault_base::error::ErrorCode;
use log::{debug, error};

use crate::api::{Components, HttpError};
use crate::auth::caller_auth::Caller;
use crate::auth::policy::Policy;

pub(super) async fn default_headers(
    request: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let mut response = next.run(request).await;
    let version: &str = env!("CARGO_PKG_VERSION");
    let server = HeaderValue::from_str(&format!("DocVault {}", version))
        .map_err(|_| HttpError::new(ErrorCode::InternalServerError, "Invalid server header"))?;
    response.headers_mut().insert("Server", server);
    Ok(response)
}

pub(super) async fn print_statuses(
    request: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let Some(path_and_query) = request.uri().path_and_query() else {
        return Err(HttpError::new(
            ErrorCode::BadRequest,
            "Failed to get path and query",
        ));
    };

    let msg = format!("{} {}", request.method(), path_and_query);

    let response = next.run(request).await;
    let err_msg = match response.headers().get("x-docvault-error") {
        Some(msg) => msg.to_str().unwrap_or("Failed to get error message"),
        None => "",
    };

    if response.status().as_u16() >= 500 {
        error!("{} [{}] {}", msg, response.status(), err_msg);
    } else {
        debug!("{} [{}] {}", msg, response.status(), err_msg);
    }

    Ok(response)
}

/// Resolve the caller of a request and check it against the policy.
pub(crate) async fn check_permissions<P>(
    components: &Components,
    headers: &HeaderMap,
    policy: P,
) -> Result<Caller, HttpError>
where
    P: Policy,
{
    let sessions = components.sessions.read().await;
    Ok(components.auth.check(headers, &sessions, policy)?)
}
