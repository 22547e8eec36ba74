use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::GroupTag;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use super::student::find_student;
use crate::documents::{download_response, read_upload, release_documents};
use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::announcement::*;
use crate::permissions::{ANNOUNCEMENT_POST, ANNOUNCEMENT_POST_GROUP, Role};
use crate::state::AppState;

async fn find_announcement<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<announcement::Model, AppError> {
    announcement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
}

/// Cohort-wide announcements need `announcement:post`. Group announcements
/// also accept `announcement:post_group`, limited to the student's own group.
async fn ensure_can_post(
    auth_user: &AuthUser,
    state: &AppState,
    group: Option<GroupTag>,
) -> Result<(), AppError> {
    let Some(group) = group else {
        return auth_user.require_permission(ANNOUNCEMENT_POST);
    };
    auth_user.require_any_permission(&[ANNOUNCEMENT_POST, ANNOUNCEMENT_POST_GROUP])?;
    if auth_user.role == Role::Student {
        let own = find_student(&state.db, auth_user.user_id).await?.group_tag;
        if own != group {
            return Err(AppError::PermissionDenied);
        }
    }
    Ok(())
}

/// Group a student reads announcements for; `None` for staff.
async fn reader_group(
    auth_user: &AuthUser,
    state: &AppState,
) -> Result<Option<GroupTag>, AppError> {
    match auth_user.role {
        Role::Student => Ok(Some(find_student(&state.db, auth_user.user_id).await?.group_tag)),
        _ => Ok(None),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List announcements",
    description = "Newest first. Students see cohort-wide announcements and those addressed to their own group. Staff see everything unless `group` narrows the list.",
    params(AnnouncementListQuery),
    responses(
        (status = 200, description = "Announcements", body = AnnouncementListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_announcements(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnnouncementListQuery>,
) -> Result<Json<AnnouncementListResponse>, AppError> {
    let group = reader_group(&auth_user, &state).await?.or(query.group);

    let mut select = announcement::Entity::find();
    if let Some(group) = group {
        select = select.filter(
            Condition::any()
                .add(announcement::Column::GroupTag.is_null())
                .add(announcement::Column::GroupTag.eq(group)),
        );
    }

    let rows = select
        .order_by_desc(announcement::Column::CreatedAt)
        .order_by_desc(announcement::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(AnnouncementListResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Announcements",
    operation_id = "postAnnouncement",
    summary = "Post an announcement",
    description = "Cohort-wide announcements need `announcement:post`. Group announcements need `announcement:post_group`; class representatives may only address their own group.",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement posted", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn post_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_can_post(&auth_user, &state, payload.group).await?;
    validate_create_announcement(&payload)?;

    let model = announcement::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        group_tag: Set(payload.group),
        posted_by: Set(auth_user.name.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(announcement_id = model.id, group = ?model.group_tag, "Announcement posted");
    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "deleteAnnouncement",
    summary = "Delete an announcement",
    description = "Requires `announcement:post` permission. The attachment is removed with it.",
    params(("id" = i32, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ANNOUNCEMENT_POST)?;

    let txn = state.db.begin().await?;
    let existing = announcement::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;
    announcement::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(announcement_id = id, "Announcement deleted");
    if let Some(key) = existing.document_key {
        release_documents(&state.db, &*state.documents, vec![key]).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/document",
    tag = "Announcements",
    operation_id = "uploadAnnouncementDocument",
    summary = "Attach a file to an announcement",
    description = "Uploads the `file` multipart field as the announcement's attachment, replacing any previous one. Needs the same permission as posting the announcement.",
    params(("id" = i32, Path, description = "Announcement ID")),
    request_body(content_type = "multipart/form-data", description = "Attachment upload"),
    responses(
        (status = 200, description = "Attachment stored", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn upload_announcement_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<AnnouncementResponse>, AppError> {
    let target = find_announcement(&state.db, id).await?;
    ensure_can_post(&auth_user, &state, target.group_tag).await?;

    let upload = read_upload(&mut multipart, state.config.storage.max_upload_size).await?;
    let key = state.documents.put(&upload.bytes).await?;

    let txn = state.db.begin().await?;
    let existing = announcement::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;
    let previous = existing.document_key.clone();

    let mut active: announcement::ActiveModel = existing.into();
    active.document_key = Set(Some(key.to_string()));
    active.document_name = Set(Some(upload.file_name));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(announcement_id = id, key = %key, "Announcement document attached");
    if let Some(previous) = previous.filter(|p| *p != key.to_string()) {
        release_documents(&state.db, &*state.documents, vec![previous]).await;
    }

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/document",
    tag = "Announcements",
    operation_id = "downloadAnnouncementDocument",
    summary = "Download an announcement's attachment",
    description = "Students may only download attachments of announcements they can list.",
    params(("id" = i32, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Attachment content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Announcement or attachment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn download_announcement_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let target = find_announcement(&state.db, id).await?;
    let reader = reader_group(&auth_user, &state).await?;
    if reader.is_some_and(|own| target.group_tag.is_some_and(|addressed| addressed != own)) {
        return Err(AppError::NotFound("Announcement not found".into()));
    }

    let (Some(key), Some(name)) = (target.document_key, target.document_name) else {
        return Err(AppError::NotFound("Announcement has no document".into()));
    };
    download_response(&*state.documents, &key, &name).await
}
