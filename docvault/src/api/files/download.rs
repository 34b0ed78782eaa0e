// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::files::{locator, BUFFER_SIZE, CHUNK_SIZE};
use crate::api::middleware::check_permissions;
use crate::api::{Components, HttpError};
use crate::auth::policy::AuthenticatedPolicy;
use async_stream::stream;
use axum::body::Body;
use axum::extract::{OriginalUri, Query, State};
use axum::http::header::{CONTENT_TYPE, PRAGMA};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{
    CacheControl, ContentLength, Expires, HeaderMap, HeaderMapExt, IfModifiedSince, LastModified,
};
use bytes::Bytes;
use docvault_base::internal_server_error;
use futures_util::Stream;
use log::{debug, error};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

/// Browser cache lifetime of versioned files, an iteration never changes once committed.
const CACHE_TTL: Duration = Duration::from_secs(86400);

#[derive(Deserialize, Default)]
pub(super) struct DownloadQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

// GET /files/{workspace}/{documents|templates|parts}/...
pub(super) async fn download(
    State(components): State<Arc<Components>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    check_permissions(&components, &headers, AuthenticatedPolicy {}).await?;
    let locator = locator(&components, &uri)?;

    let mut response_headers = HeaderMap::new();
    if locator.key.is_versioned() {
        response_headers.typed_insert(CacheControl::new().with_max_age(CACHE_TTL));
        response_headers.typed_insert(Expires::from(SystemTime::now() + CACHE_TTL));
        response_headers.insert(PRAGMA, HeaderValue::from_static(""));
    }

    let path = components
        .documents
        .get_data_file(&locator.full_name())
        .await?;

    let (path, content_type) = match query.kind.as_deref() {
        Some("pdf") => (
            components.converter.convert_to_pdf(&path).await?,
            "application/pdf".to_string(),
        ),
        Some("swf") => (
            components.converter.convert_to_swf(&path).await?,
            "application/x-shockwave-flash".to_string(),
        ),
        _ => (
            path,
            mime_guess::from_path(&locator.file_name)
                .first_or_octet_stream()
                .to_string(),
        ),
    };

    let (file, size, modified) = open(&path).await?;
    if let Some(since) = headers.typed_get::<IfModifiedSince>() {
        if !since.is_modified(modified) {
            debug!("{} isn't modified", locator.full_name());
            return Ok((StatusCode::NOT_MODIFIED, response_headers).into_response());
        }
    }

    response_headers.typed_insert(LastModified::from(modified));
    response_headers.typed_insert(ContentLength(size));
    let content_type = HeaderValue::from_str(&content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    response_headers.insert(CONTENT_TYPE, content_type);

    Ok((
        StatusCode::OK,
        response_headers,
        Body::from_stream(read_chunks(file)),
    )
        .into_response())
}

async fn open(path: &Path) -> Result<(File, u64, SystemTime), HttpError> {
    let opened = async {
        let file = File::open(path).await?;
        let metadata = file.metadata().await?;
        let modified = metadata.modified()?;
        Ok::<_, std::io::Error>((file, metadata.len(), modified))
    }
    .await;

    opened.map_err(|err| {
        error!("Failed to open {}: {}", path.display(), err);
        internal_server_error!("Error while downloading the file").into()
    })
}

fn read_chunks(file: File) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    stream! {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield Ok(Bytes::copy_from_slice(&buf[..n])),
                Err(err) => {
                    error!("Failed to read vault file: {}", err);
                    yield Err(err);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{components, headers};
    use crate::vault::key::{DocumentIterationKey, DocumentMasterTemplateKey};
    use axum::body::to_bytes;
    use axum::http::Uri;
    use docvault_base::error::ErrorCode;
    use rstest::rstest;

    async fn commit_file(components: &Components, content: &[u8]) {
        let mut tx = components.transactions.begin().await.unwrap();
        let key = DocumentIterationKey::new("ws", "DOC-1", "A", 1);
        let path = components
            .documents
            .save_file_in_document(tx.as_ref(), &key, "drawing.txt", 0)
            .await
            .unwrap();
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, content).await.unwrap();
        components
            .documents
            .save_file_in_document(tx.as_ref(), &key, "drawing.txt", content.len() as u64)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    fn uri() -> OriginalUri {
        OriginalUri(Uri::from_static("/files/ws/documents/DOC-1/A/1/drawing.txt"))
    }

    #[rstest]
    #[tokio::test]
    async fn test_download(#[future] components: Arc<Components>, headers: HeaderMap) {
        let components = components.await;
        let content = vec![7u8; CHUNK_SIZE * 2 + 10];
        commit_file(&components, &content).await;

        let response = download(
            State(components),
            uri(),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let resp_headers = response.headers();
        assert_eq!(resp_headers[CONTENT_TYPE], "text/plain");
        assert_eq!(resp_headers["content-length"], content.len().to_string().as_str());
        assert_eq!(resp_headers["cache-control"], "max-age=86400");
        assert_eq!(resp_headers[PRAGMA], "");
        assert!(resp_headers.get("expires").is_some());
        assert!(resp_headers.get("last-modified").is_some());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.to_vec(), content);
    }

    #[rstest]
    #[tokio::test]
    async fn test_not_modified(#[future] components: Arc<Components>, mut headers: HeaderMap) {
        let components = components.await;
        commit_file(&components, b"content").await;
        headers.typed_insert(IfModifiedSince::from(SystemTime::now() + Duration::from_secs(60)));

        let response = download(
            State(components),
            uri(),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_modified_since(#[future] components: Arc<Components>, mut headers: HeaderMap) {
        let components = components.await;
        commit_file(&components, b"content").await;
        headers.typed_insert(IfModifiedSince::from(
            SystemTime::now() - Duration::from_secs(3600),
        ));

        let response = download(
            State(components),
            uri(),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn test_template_not_cached(#[future] components: Arc<Components>, headers: HeaderMap) {
        let components = components.await;
        let mut tx = components.transactions.begin().await.unwrap();
        let key = DocumentMasterTemplateKey::new("ws", "TPL");
        let path = components
            .documents
            .save_file_in_template(tx.as_ref(), &key, "form.bin", 0)
            .await
            .unwrap();
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"abc").await.unwrap();
        components
            .documents
            .save_file_in_template(tx.as_ref(), &key, "form.bin", 3)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let response = download(
            State(components),
            OriginalUri(Uri::from_static("/files/ws/templates/TPL/form.bin")),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("cache-control").is_none());
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/octet-stream"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_pdf_conversion_failed(
        #[future] components: Arc<Components>,
        headers: HeaderMap,
    ) {
        let components = components.await;
        commit_file(&components, b"content").await;

        let err = download(
            State(components),
            uri(),
            Query(DownloadQuery {
                kind: Some("pdf".to_string()),
            }),
            headers,
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), ErrorCode::InternalServerError);
    }

    #[rstest]
    #[tokio::test]
    async fn test_not_found(#[future] components: Arc<Components>, headers: HeaderMap) {
        let err = download(
            State(components.await),
            uri(),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case("/files/ws/products/P/A/1/a.txt")]
    #[case("/files/ws/documents/DOC-1/A/a.txt")]
    #[case("/files/ws/documents/DOC-1/A/1/%2E%2E")]
    #[tokio::test]
    async fn test_bad_path(
        #[future] components: Arc<Components>,
        headers: HeaderMap,
        #[case] path: &'static str,
    ) {
        let err = download(
            State(components.await),
            OriginalUri(Uri::from_static(path)),
            Query(DownloadQuery::default()),
            headers,
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), ErrorCode::BadRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn test_unauthorized(#[future] components: Arc<Components>) {
        let err = download(
            State(components.await),
            uri(),
            Query(DownloadQuery::default()),
            HeaderMap::new(),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status(), ErrorCode::Unauthorized);
    }
}
