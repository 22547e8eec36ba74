//! Upload and download plumbing between HTTP and the document store.
//!
//! The database only keeps the document key (and the original file name as a
//! label); file bytes live in the content-addressed store.

use std::collections::BTreeSet;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::{DocumentKey, DocumentStore};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::entity::{announcement, assignment, assignment_submission};
use crate::error::AppError;
use crate::utils::filename::{content_disposition_value, validate_upload_filename};

/// Multipart overhead allowed on top of the configured file size limit.
const MULTIPART_SLACK: u64 = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max((max_upload_size + MULTIPART_SLACK) as usize)
}

/// A file received in the `file` field of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read the `file` field of a multipart body into memory, enforcing `max_size`.
///
/// Other fields are ignored.
pub async fn read_upload(multipart: &mut Multipart, max_size: u64) -> Result<UploadedFile, AppError> {
    let mut upload = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let file_name = validate_upload_filename(&raw_name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds the upload limit of {max_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        upload = Some(UploadedFile { file_name, bytes });
    }

    upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))
}

/// Stream a stored document back as an attachment download.
pub async fn download_response(
    store: &dyn DocumentStore,
    key: &str,
    file_name: &str,
) -> Result<Response, AppError> {
    let key = DocumentKey::parse(key)?;
    let reader = store.open(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(file_name).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(file_name),
        )
        .header(header::CACHE_CONTROL, "private, no-cache")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

async fn is_referenced<C: ConnectionTrait>(conn: &C, key: &str) -> Result<bool, DbErr> {
    let documents = assignment::Entity::find()
        .filter(assignment::Column::DocumentKey.eq(key))
        .count(conn)
        .await?;
    if documents > 0 {
        return Ok(true);
    }
    let files = assignment_submission::Entity::find()
        .filter(assignment_submission::Column::FileKey.eq(key))
        .count(conn)
        .await?;
    if files > 0 {
        return Ok(true);
    }
    let attachments = announcement::Entity::find()
        .filter(announcement::Column::DocumentKey.eq(key))
        .count(conn)
        .await?;
    Ok(attachments > 0)
}

/// Remove documents that are no longer referenced by any row.
///
/// Call after the transaction that dropped the references has committed.
/// Failures are logged, not returned; the count of documents that could not
/// be removed is.
pub async fn release_documents<C: ConnectionTrait>(
    conn: &C,
    store: &dyn DocumentStore,
    keys: Vec<String>,
) -> u64 {
    let unique: BTreeSet<String> = keys.into_iter().collect();
    let mut orphaned = 0u64;

    for raw in unique {
        match is_referenced(conn, &raw).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                warn!(key = %raw, error = %e, "Could not check document references");
                orphaned += 1;
                continue;
            }
        }

        let result = match DocumentKey::parse(&raw) {
            Ok(key) => store.delete(&key).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(key = %raw, error = %e, "Failed to remove unreferenced document");
            orphaned += 1;
        }
    }

    orphaned
}
