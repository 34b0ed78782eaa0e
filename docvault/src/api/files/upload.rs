// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::api::files::{locator, BUFFER_SIZE, CHUNK_SIZE};
use crate::api::middleware::check_permissions;
use crate::api::{Components, HttpError};
use crate::auth::policy::AuthenticatedPolicy;
use crate::vault::key::VaultKey;
use crate::vault::locator::VaultLocator;
use crate::vault::Transaction;
use axum::extract::{Multipart, OriginalUri, State};
use axum::http::StatusCode;
use axum_extra::headers::HeaderMap;
use bytes::Bytes;
use docvault_base::error::VaultError;
use docvault_base::{bad_request, internal_server_error};
use futures_util::{pin_mut, Stream, StreamExt};
use log::{debug, error, info};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

// POST /files/{workspace}/{documents|templates|parts}/...
pub(super) async fn upload(
    State(components): State<Arc<Components>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StatusCode, HttpError> {
    check_permissions(&components, &headers, AuthenticatedPolicy {}).await?;
    let locator = locator(&components, &uri)?;

    let mut tx = components.transactions.begin().await.map_err(|err| {
        error!("Failed to begin a transaction: {}", err);
        upload_error()
    })?;

    let result = async {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| bad_request!("Invalid multipart body: {}", err))?;
        write_file(&components, tx.as_ref(), &locator, field).await?;
        tx.commit().await
    }
    .await;

    finish(tx.as_mut(), &locator, result).await
}

/// Reserve the vault file, copy the content into it and finalize it with the written size.
///
/// The content stream is optional, a request without a part stores an empty file.
async fn write_file<S, E>(
    components: &Components,
    tx: &dyn Transaction,
    locator: &VaultLocator,
    content: Option<S>,
) -> Result<u64, VaultError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let path = save(components, tx, locator, 0).await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, File::create(&path).await?);
    let size = match content {
        Some(content) => copy_chunks(content, &mut writer).await?,
        None => 0,
    };
    writer.flush().await?;

    save(components, tx, locator, size).await?;
    debug!("Wrote {} bytes to {}", size, path.display());
    Ok(size)
}

async fn save(
    components: &Components,
    tx: &dyn Transaction,
    locator: &VaultLocator,
    size: u64,
) -> Result<PathBuf, VaultError> {
    let file_name = &locator.file_name;
    match &locator.key {
        VaultKey::Document(key) => {
            components
                .documents
                .save_file_in_document(tx, key, file_name, size)
                .await
        }
        VaultKey::Template(key) => {
            components
                .documents
                .save_file_in_template(tx, key, file_name, size)
                .await
        }
        VaultKey::Part(key) => {
            components
                .products
                .save_file_in_part_iteration(tx, key, file_name, size)
                .await
        }
    }
}

async fn copy_chunks<S, E, W>(content: S, writer: &mut W) -> Result<u64, VaultError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
    W: AsyncWrite + Unpin,
{
    pin_mut!(content);
    let mut size = 0u64;
    while let Some(chunk) = content.next().await {
        let chunk =
            chunk.map_err(|err| internal_server_error!("Failed to read the upload: {}", err))?;
        for part in chunk.chunks(CHUNK_SIZE) {
            writer.write_all(part).await?;
            size += part.len() as u64;
        }
    }
    Ok(size)
}

/// Respond to the upload, rolling the transaction back if anything failed.
async fn finish(
    tx: &mut dyn Transaction,
    locator: &VaultLocator,
    result: Result<(), VaultError>,
) -> Result<StatusCode, HttpError> {
    let Err(err) = result else {
        info!("Uploaded {}", locator.full_name());
        return Ok(StatusCode::OK);
    };

    error!("Failed to upload {}: {}", locator.full_name(), err);
    if tx.is_active() {
        if let Err(err) = tx.rollback().await {
            error!("Failed to roll back transaction {}: {}", tx.id(), err);
            return Err(internal_server_error!("Rollback failed").into());
        }
    }
    Err(upload_error())
}

fn upload_error() -> HttpError {
    internal_server_error!("Error while uploading the file").into()
}
