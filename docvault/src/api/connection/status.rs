// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::connection::ConnectionStatusAxum;
use crate::api::{Components, HttpError};
use crate::auth::session::session_id;
use axum::extract::State;
use axum_extra::headers::HeaderMap;
use docvault_base::msg::connection_api::ConnectionStatus;
use std::sync::Arc;

// GET /connection/status
pub(super) async fn status(
    State(components): State<Arc<Components>>,
    headers: HeaderMap,
) -> Result<ConnectionStatusAxum, HttpError> {
    let sessions = components.sessions.read().await;
    let status = session_id(&headers)
        .and_then(|id| sessions.get(&id))
        .map(|session| ConnectionStatus {
            has_fail: session.has_fail,
            has_logout: session.has_logout,
            login: session.login.clone(),
        })
        .unwrap_or_default();
    Ok(status.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{components, session_headers};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_status(#[future] components: Arc<Components>) {
        let components = components.await;
        let headers = session_headers(&components).await;

        let status = status(State(components), headers).await.unwrap();
        assert_eq!(status.0.login, Some("john".to_string()));
        assert!(!status.0.has_fail);
    }

    #[rstest]
    #[tokio::test]
    async fn test_status_without_session(#[future] components: Arc<Components>) {
        let status = status(State(components.await), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(status.0, ConnectionStatus::default());
    }
}
