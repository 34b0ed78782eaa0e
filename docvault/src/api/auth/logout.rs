// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::{Components, HttpError};
use crate::auth::session::{clear_session_cookie, session_id};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::HeaderMap;
use std::sync::Arc;

// GET /logout
pub(super) async fn logout(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    if components.auth.session_enabled() {
        if let Some(id) = session_id(&headers) {
            components.sessions.write().await.invalidate(&id);
        }
    }

    let cookie = clear_session_cookie(&components.cfg)?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{components, session_headers};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_logout(#[future] components: Arc<Components>) {
        let components = components.await;
        let headers = session_headers(&components).await;
        assert_eq!(components.sessions.read().await.len(), 1);

        let response = logout(State(components.clone()), headers).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        assert_eq!(components.sessions.read().await.len(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_logout_without_session(#[future] components: Arc<Components>) {
        let response = logout(State(components.await), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
