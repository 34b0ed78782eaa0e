// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::auth::PasswordRecoverAxum;
use crate::api::{Components, HttpError};
use axum::extract::State;
use axum::http::StatusCode;
use docvault_base::msg::auth_api::PasswordRecover;
use std::sync::Arc;

// POST /recover
pub(super) async fn recover(
    State(components): State<Arc<Components>>,
    request: PasswordRecoverAxum,
) -> Result<StatusCode, HttpError> {
    let request = PasswordRecover::from(request);
    components
        .users
        .write()
        .await
        .recover_password(&request.uuid, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::components;
    use docvault_base::error::ErrorCode;
    use rstest::rstest;

    fn request(uuid: &str, new_password: &str) -> PasswordRecoverAxum {
        PasswordRecover {
            uuid: uuid.to_string(),
            new_password: new_password.to_string(),
        }
        .into()
    }

    #[rstest]
    #[tokio::test]
    async fn test_recover(#[future] components: Arc<Components>) {
        let components = components.await;
        let account = components.users.read().await.get_account("john").await.unwrap();
        let uuid = components
            .users
            .write()
            .await
            .create_password_recovery_request(&account)
            .await
            .unwrap();

        let status = recover(State(components.clone()), request(&uuid, "new-secret"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(components
            .accounts
            .read()
            .await
            .authenticate_account("john", "new-secret")
            .await
            .unwrap()
            .is_some());

        let err = recover(State(components), request(&uuid, "other"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn test_recover_unknown(#[future] components: Arc<Components>) {
        let err = recover(State(components.await), request("unknown", "secret"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), ErrorCode::NotFound);
    }
}
