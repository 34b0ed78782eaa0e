// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1
//
mod auth;
mod connection;
mod files;
mod middleware;
mod part;
mod server;

use crate::auth::account_repository::SharedAccountRepository;
use crate::auth::caller_auth::CallerAuthorization;
use crate::auth::session::SessionRepository;
use crate::auth::user_manager::BoxedUserManager;
use crate::cfg::Cfg;
use crate::vault::{BoxedConverter, ManageDocuments, ManageProducts, ManageTransactions};
use auth::create_auth_api_routes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{middleware::from_fn, Router};
use connection::create_connection_routes;
pub use docvault_base::error::ErrorCode;
use docvault_base::error::VaultError;
use files::create_file_routes;
use hyper::http::HeaderValue;
use log::{error, warn};
use middleware::{default_headers, print_statuses};
use part::create_part_api_routes;
use server::create_server_api_routes;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

pub struct Components {
    pub(crate) cfg: Cfg,
    pub(crate) accounts: SharedAccountRepository,
    pub(crate) users: RwLock<BoxedUserManager>,
    pub(crate) documents: Arc<dyn ManageDocuments>,
    pub(crate) products: Arc<dyn ManageProducts>,
    pub(crate) transactions: Arc<dyn ManageTransactions>,
    pub(crate) converter: BoxedConverter,
    pub(crate) sessions: RwLock<SessionRepository>,
    pub(crate) auth: CallerAuthorization,
    pub(crate) started_at: Instant,
}

#[derive(PartialEq, Clone)]
pub struct HttpError(VaultError);

impl HttpError {
    pub fn new(status: ErrorCode, message: &str) -> Self {
        HttpError(VaultError {
            status,
            message: message.to_string(),
        })
    }

    pub fn status(&self) -> ErrorCode {
        self.0.status
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }
}

impl Debug for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let err: VaultError = self.into();
        let converted_quotes = err.message.replace('"', "'");
        let body = format!("{{\"detail\": \"{}\"}}", converted_quotes);

        let http_code = if (err.status as i16) < 0 {
            warn!("Invalid status code: {}", err.status);
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::from_u16(err.status as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };

        let err_msg = HeaderValue::from_str(&err.message).unwrap_or_else(|_| {
            error!("Invalid error message: {}", err.message);
            HeaderValue::from_static("Unparsable message")
        });

        let mut resp = (http_code, body).into_response();
        resp.headers_mut().insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );
        resp.headers_mut().insert("x-docvault-error", err_msg);
        resp
    }
}

impl From<VaultError> for HttpError {
    fn from(err: VaultError) -> Self {
        HttpError(err)
    }
}

impl From<HttpError> for VaultError {
    fn from(err: HttpError) -> VaultError {
        err.0
    }
}

impl From<axum::Error> for HttpError {
    fn from(err: axum::Error) -> Self {
        HttpError::new(ErrorCode::BadRequest, &err.to_string())
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::new(
            ErrorCode::UnprocessableEntity,
            &format!("Invalid JSON: {}", err),
        )
    }
}

pub fn create_axum_app(cfg: &Cfg, components: Arc<Components>) -> Router {
    let base = &cfg.api_base_path;
    let mut app = Router::new()
        // Server API
        .nest(&format!("{}api/v1", base), create_server_api_routes())
        // Auth API
        .nest(&format!("{}api/v1/auth", base), create_auth_api_routes())
        // Part listing
        .nest(
            &format!("{}api/v1/workspaces/{{workspace}}/parts", base),
            create_part_api_routes(),
        )
        // File relay
        .nest(
            &format!("{}files", base),
            create_file_routes(cfg.max_upload_size),
        );

    if cfg.session_enabled {
        app = app.nest(&format!("{}connection", base), create_connection_routes());
    }

    app.layer(from_fn(default_headers))
        .layer(from_fn(print_statuses))
        .layer(configure_cors(&cfg.cors_allow_origin))
        .with_state(components)
}

fn configure_cors(cors_allow_origin: &[String]) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    if cors_allow_origin.iter().any(|origin| origin == "*") {
        cors_layer.allow_origin(Any)
    } else {
        let parsed_origins: Vec<HeaderValue> = cors_allow_origin
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors_layer.allow_origin(parsed_origins)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::account_repository::{
        AccountRepository, AccountSettings, BoxedAccountRepository, ManageAccounts,
    };
    use crate::auth::jwt::JwtFactory;
    use crate::auth::session::{Session, SESSION_COOKIE};
    use crate::auth::user_manager::{LogNotifier, UserManager};
    use crate::vault::converter::CommandConverter;
    use crate::vault::fs_vault::FsVault;
    use axum::body::Body;
    use axum::http::Request;
    use axum_extra::headers::{Authorization, HeaderMap, HeaderMapExt};
    use bytes::Bytes;
    use docvault_base::msg::auth_api::{Account, UserGroupMapping};
    use rstest::fixture;
    use std::time::Duration;

    pub(crate) const JWT_KEY: &str = "test-key";

    pub(crate) async fn test_components(cfg: Cfg) -> Components {
        let mut accounts = AccountRepository::new(cfg.data_path.clone()).await.unwrap();
        accounts
            .upsert_account(AccountSettings {
                account: Account {
                    login: "john".to_string(),
                    name: "John Doe".to_string(),
                    email: "john@example.com".to_string(),
                    language: "en".to_string(),
                    enabled: true,
                    ..Account::default()
                },
                password: "secret".to_string(),
                group: "designers".to_string(),
                workspaces: vec!["ws-1".to_string(), "ws-2".to_string()],
            })
            .await
            .unwrap();
        accounts
            .upsert_account(AccountSettings {
                account: Account {
                    login: "root".to_string(),
                    enabled: true,
                    ..Account::default()
                },
                password: "admin-secret".to_string(),
                group: "admin".to_string(),
                workspaces: vec![],
            })
            .await
            .unwrap();
        accounts
            .upsert_account(AccountSettings {
                account: Account {
                    login: "blocked".to_string(),
                    enabled: false,
                    ..Account::default()
                },
                password: "secret".to_string(),
                ..AccountSettings::default()
            })
            .await
            .unwrap();

        let accounts: BoxedAccountRepository = Box::new(accounts);
        let accounts: SharedAccountRepository = Arc::new(RwLock::new(accounts));
        let users: BoxedUserManager = Box::new(UserManager::new(
            Arc::clone(&accounts),
            cfg.recovery_ttl,
            Box::new(LogNotifier {}),
        ));
        let vault = Arc::new(FsVault::new(cfg.data_path.join("vault")).await.unwrap());

        Components {
            accounts,
            users: RwLock::new(users),
            documents: vault.clone(),
            products: vault.clone(),
            transactions: vault,
            converter: Box::new(CommandConverter::new(
                cfg.data_path.join("conversions"),
                "false",
                "false",
            )),
            sessions: RwLock::new(SessionRepository::new(cfg.session_ttl)),
            auth: CallerAuthorization::new(
                Some(JwtFactory::new(JWT_KEY, cfg.jwt_ttl)),
                cfg.session_enabled,
            ),
            started_at: Instant::now(),
            cfg,
        }
    }

    #[fixture]
    pub(crate) fn test_cfg() -> Cfg {
        Cfg {
            data_path: tempfile::tempdir().unwrap().keep(),
            jwt_enabled: true,
            jwt_key: JWT_KEY.to_string(),
            ..Cfg::default()
        }
    }

    #[fixture]
    pub(crate) async fn components(test_cfg: Cfg) -> Arc<Components> {
        Arc::new(test_components(test_cfg).await)
    }

    /// Headers with a bearer token of `john`.
    #[fixture]
    pub(crate) fn headers() -> HeaderMap {
        let token = JwtFactory::new(JWT_KEY, Duration::from_secs(60))
            .create_token(&UserGroupMapping {
                login: "john".to_string(),
                group_name: "designers".to_string(),
            })
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::bearer(&token).unwrap());
        headers
    }

    /// Cookie of a new session of `john`.
    pub(crate) async fn session_headers(components: &Components) -> HeaderMap {
        let mut sessions = components.sessions.write().await;
        let id = sessions.create(Session {
            login: Some("john".to_string()),
            groups: vec!["designers".to_string()],
            ..Session::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, id)).unwrap(),
        );
        headers
    }

    mod http_error {
        use super::*;
        use axum::body::to_bytes;
        use rstest::rstest;

        #[rstest]
        #[tokio::test]
        async fn test_http_error() {
            let error = HttpError::new(ErrorCode::BadRequest, "Test error");
            let resp = error.into_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                resp.headers().get("content-type").unwrap(),
                HeaderValue::from_static("application/json")
            );
            assert_eq!(
                resp.headers().get("x-docvault-error").unwrap(),
                HeaderValue::from_static("Test error")
            );

            let body: Bytes = to_bytes(resp.into_body(), 1000).await.unwrap();
            assert_eq!(body, Bytes::from(r#"{"detail": "Test error"}"#))
        }

        #[rstest]
        #[tokio::test]
        async fn test_http_json_format() {
            let error = HttpError::new(ErrorCode::NotFound, "Account \"x\" doesn't exist");
            let resp = error.into_response();
            let body: Bytes = to_bytes(resp.into_body(), 1000).await.unwrap();
            assert_eq!(
                body,
                Bytes::from(r#"{"detail": "Account 'x' doesn't exist"}"#)
            )
        }

        #[rstest]
        fn test_negative_status() {
            let resp = HttpError::new(ErrorCode::Unknown, "neg").into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[rstest]
        fn test_unparsable_message() {
            let error = HttpError::new(ErrorCode::BadRequest, "Test \x7f");
            let resp = error.into_response();
            assert_eq!(
                resp.headers().get("x-docvault-error").unwrap(),
                HeaderValue::from_static("Unparsable message")
            );
        }

        #[rstest]
        fn test_from_serde_json() {
            let err = serde_json::from_str::<serde_json::Value>("not json")
                .err()
                .unwrap();
            let http_err: HttpError = err.into();
            assert_eq!(http_err.status(), ErrorCode::UnprocessableEntity);
            assert!(http_err.message().starts_with("Invalid JSON"));
        }
    }

    mod app {
        use super::*;
        use rstest::rstest;
        use tower::ServiceExt;

        #[rstest]
        fn test_configure_cors() {
            let _ = configure_cors(&["*".to_string()]);
            let _ = configure_cors(&["not a uri".to_string(), "http://a.com".to_string()]);
        }

        #[rstest]
        #[tokio::test]
        async fn test_routes(test_cfg: Cfg) {
            let cfg = Cfg {
                api_base_path: "/plm/".to_string(),
                ..test_cfg
            };
            let app = create_axum_app(&cfg, Arc::new(test_components(cfg.clone()).await));

            let response = app
                .clone()
                .oneshot(
                    Request::get("/plm/api/v1/alive")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response
                .headers()
                .get("server")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("DocVault "));

            let response = app
                .clone()
                .oneshot(
                    Request::get("/plm/connection/status")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let response = app
                .oneshot(
                    Request::get("/plm/files/ws/templates/T/a.txt")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[rstest]
        #[tokio::test]
        async fn test_no_connection_without_sessions(test_cfg: Cfg) {
            let cfg = Cfg {
                session_enabled: false,
                ..test_cfg
            };
            let app = create_axum_app(&cfg, Arc::new(test_components(cfg.clone()).await));

            let response = app
                .oneshot(
                    Request::get("/connection/status")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }
}
