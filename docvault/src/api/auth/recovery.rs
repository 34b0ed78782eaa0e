// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::auth::PasswordRecoveryRequestAxum;
use crate::api::{Components, HttpError};
use axum::extract::State;
use axum::http::StatusCode;
use docvault_base::msg::auth_api::PasswordRecoveryRequest;
use log::debug;
use std::sync::Arc;

// POST /recovery
pub(super) async fn recovery(
    State(components): State<Arc<Components>>,
    request: PasswordRecoveryRequestAxum,
) -> Result<StatusCode, HttpError> {
    let request = PasswordRecoveryRequest::from(request);
    let account = components
        .users
        .read()
        .await
        .get_account(&request.login)
        .await?;

    components
        .users
        .write()
        .await
        .create_password_recovery_request(&account)
        .await?;

    debug!("Recovery request created for '{}'", account.login);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::components;
    use docvault_base::not_found;
    use rstest::rstest;

    fn request(login: &str) -> PasswordRecoveryRequestAxum {
        PasswordRecoveryRequest {
            login: login.to_string(),
        }
        .into()
    }

    #[rstest]
    #[tokio::test]
    async fn test_recovery(#[future] components: Arc<Components>) {
        let status = recovery(State(components.await), request("john"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[tokio::test]
    async fn test_recovery_unknown_login(#[future] components: Arc<Components>) {
        let err = recovery(State(components.await), request("nobody"))
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            HttpError::from(not_found!("Account '{}' doesn't exist", "nobody"))
        );
    }
}
