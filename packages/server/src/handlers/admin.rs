use axum::{Json, extract::State};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, TransactionTrait};
use tracing::instrument;

use crate::cascade;
use crate::documents::release_documents;
use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::admin::PurgeResponse;
use crate::permissions::DATA_PURGE;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/purge",
    tag = "Admin",
    operation_id = "purgeAcademicData",
    summary = "Delete all academic activity",
    description = "Deletes every attendance session and record, every assignment and submission, and every announcement with its attachment in one transaction. Students, professors, subjects and admins are kept. Requires `data:purge` permission.",
    responses(
        (status = 200, description = "Purge finished", body = PurgeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn purge(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, AppError> {
    auth_user.require_permission(DATA_PURGE)?;

    let txn = state.db.begin().await?;
    let mut removed = cascade::delete_sessions(&txn, Condition::all()).await?;
    removed.merge(cascade::delete_assignments(&txn, Condition::all()).await?);
    let attachments: Vec<String> = announcement::Entity::find()
        .select_only()
        .column(announcement::Column::DocumentKey)
        .filter(announcement::Column::DocumentKey.is_not_null())
        .into_tuple()
        .all(&txn)
        .await?;
    removed.document_keys.extend(attachments);
    let announcements = announcement::Entity::delete_many().exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        sessions = removed.attendance_sessions,
        records = removed.attendance_records,
        assignments = removed.assignments,
        submissions = removed.submissions,
        announcements = announcements.rows_affected,
        "Academic data purged"
    );
    let orphaned = release_documents(&state.db, &*state.documents, removed.document_keys).await;

    Ok(Json(PurgeResponse {
        attendance_records: removed.attendance_records,
        attendance_sessions: removed.attendance_sessions,
        submissions: removed.submissions,
        assignments: removed.assignments,
        announcements: announcements.rows_affected,
        orphaned_documents: orphaned,
    }))
}
