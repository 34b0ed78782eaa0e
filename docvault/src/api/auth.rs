// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod login;
mod logout;
mod recover;
mod recovery;

use axum::body::Body;
use axum::extract::FromRequest;
use axum::http::Request;
use axum::routing::{get, post};
use bytes::Bytes;
use docvault_base::error::ErrorCode;
use docvault_base::msg::auth_api::{Account, LoginRequest, PasswordRecover, PasswordRecoveryRequest};
use docvault_macros::{IntoResponse, Twin};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::{Components, HttpError};

#[derive(IntoResponse, Twin)]
pub struct AccountAxum(Account);

#[derive(Twin)]
pub struct LoginRequestAxum(LoginRequest);

#[derive(Twin)]
pub struct PasswordRecoveryRequestAxum(PasswordRecoveryRequest);

#[derive(Twin)]
pub struct PasswordRecoverAxum(PasswordRecover);

async fn parse_json<T, S>(req: Request<Body>, state: &S) -> Result<T, HttpError>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    let bytes = Bytes::from_request(req, state)
        .await
        .map_err(|_| HttpError::new(ErrorCode::UnprocessableEntity, "Invalid body"))?;
    Ok(serde_json::from_slice::<T>(&bytes)?)
}

impl<S> FromRequest<S> for LoginRequestAxum
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        Ok(parse_json::<LoginRequest, S>(req, state).await?.into())
    }
}

impl<S> FromRequest<S> for PasswordRecoveryRequestAxum
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        Ok(parse_json::<PasswordRecoveryRequest, S>(req, state).await?.into())
    }
}

impl<S> FromRequest<S> for PasswordRecoverAxum
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        Ok(parse_json::<PasswordRecover, S>(req, state).await?.into())
    }
}

pub(super) fn create_auth_api_routes() -> axum::Router<Arc<Components>> {
    axum::Router::new()
        .route("/login", post(login::login))
        .route("/recovery", post(recovery::recovery))
        .route("/recover", post(recover::recover))
        .route("/logout", get(logout::logout))
}
