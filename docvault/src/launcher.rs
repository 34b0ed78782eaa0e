// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::create_axum_app;
use crate::cfg::CfgParser;
use crate::core::env::{GetEnv, StdEnvGetter};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use docvault_base::logger::Logger;
use log::{error, info};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub async fn launch_server() {
    let version: &str = env!("CARGO_PKG_VERSION");

    Logger::init("INFO");
    info!(
        "DocVault {} [{} at {}]",
        version,
        env!("COMMIT"),
        env!("BUILD_TIME")
    );

    let handle = Handle::new();
    tokio::spawn(shutdown_ctrl_c(handle.clone()));
    #[cfg(unix)]
    tokio::spawn(shutdown_signal(handle.clone()));

    serve(CfgParser::from_env(StdEnvGetter::default()), handle).await;
    info!("Server has been shut down.");
}

async fn serve<EnvGetter: GetEnv>(parser: CfgParser<EnvGetter>, handle: Handle) {
    let cfg = parser.cfg.clone();
    Logger::init(&cfg.log_level);
    info!("Configuration: \n {}", parser);

    let components = match parser.build().await {
        Ok(components) => Arc::new(components),
        Err(err) => {
            error!("Failed to start the server: {}", err);
            return;
        }
    };

    let Ok(host) = IpAddr::from_str(&cfg.host) else {
        error!("Invalid host address '{}'", cfg.host);
        return;
    };
    let addr = SocketAddr::new(host, cfg.port);
    let app = create_axum_app(&cfg, components);

    match (&cfg.cert_path, &cfg.cert_key_path) {
        (Some(cert_path), Some(cert_key_path)) => {
            if rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .is_err()
            {
                info!("Rustls crypto provider is already installed");
            }

            let config = match RustlsConfig::from_pem_file(cert_path, cert_key_path).await {
                Ok(config) => config,
                Err(err) => {
                    error!("Failed to load TLS certificate: {}", err);
                    return;
                }
            };

            info!("Listening on https://{}{}", addr, cfg.api_base_path);
            axum_server::bind_rustls(addr, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .unwrap_or_else(|err| error!("Server error: {}", err));
        }
        _ => {
            info!("Listening on http://{}{}", addr, cfg.api_base_path);
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .unwrap_or_else(|err| error!("Server error: {}", err));
        }
    }
}

async fn shutdown_ctrl_c(server_handle: Handle) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", err);
        return;
    }
    info!("Received Ctrl-C, shutting down server...");
    server_handle.shutdown();
}

#[cfg(unix)]
async fn shutdown_signal(server_handle: Handle) {
    let mut signal =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                return;
            }
        };
    signal.recv().await;
    info!("Received termination signal, shutting down server...");
    server_handle.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::tests::MockEnvGetter;
    use mockall::predicate::eq;
    use rstest::rstest;
    use serial_test::serial;
    use std::collections::BTreeMap;
    use std::env::VarError;
    use std::time::Duration;
    use tempfile::tempdir;

    #[rstest]
    #[tokio::test]
    #[serial]
    async fn test_serve() {
        let path = tempdir().unwrap().keep();
        let mut env_getter = MockEnvGetter::new();
        env_getter.expect_all().returning(BTreeMap::new);
        env_getter
            .expect_get()
            .with(eq("DV_HOST"))
            .return_const(Ok("127.0.0.1".to_string()));
        env_getter
            .expect_get()
            .with(eq("DV_PORT"))
            .return_const(Ok("18383".to_string()));
        env_getter
            .expect_get()
            .with(eq("DV_DATA_PATH"))
            .return_const(Ok(path.to_string_lossy().to_string()));
        env_getter
            .expect_get()
            .return_const(Err(VarError::NotPresent));

        let handle = Handle::new();
        let server = tokio::spawn(serve(CfgParser::from_env(env_getter), handle.clone()));
        let addr = handle.listening().await.expect("server must listen");
        assert_eq!(addr.port(), 18383);

        let client = reqwest::Client::new();
        let response = client
            .get("http://127.0.0.1:18383/api/v1/alive")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers()["server"]
            .to_str()
            .unwrap()
            .starts_with("DocVault"));

        handle.graceful_shutdown(Some(Duration::from_secs(1)));
        server.await.unwrap();
        assert!(path.join("vault").exists());
    }

    #[rstest]
    #[tokio::test]
    #[serial]
    async fn test_invalid_host() {
        let mut env_getter = MockEnvGetter::new();
        env_getter.expect_all().returning(BTreeMap::new);
        env_getter
            .expect_get()
            .with(eq("DV_HOST"))
            .return_const(Ok("not-an-ip".to_string()));
        env_getter
            .expect_get()
            .with(eq("DV_DATA_PATH"))
            .return_const(Ok(tempdir().unwrap().keep().to_string_lossy().to_string()));
        env_getter
            .expect_get()
            .return_const(Err(VarError::NotPresent));

        // returns instead of serving
        serve(CfgParser::from_env(env_getter), Handle::new()).await;
    }
}
