//! Manual cascade deletes. Every function expects to run inside the caller's
//! transaction and deletes children before parents.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use crate::entity::{assignment, assignment_submission, attendance_record, attendance_session};

/// Rows removed by a cascade, plus the document keys that lost a reference.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removed {
    pub attendance_records: u64,
    pub attendance_sessions: u64,
    pub submissions: u64,
    pub assignments: u64,
    pub document_keys: Vec<String>,
}

impl Removed {
    pub fn merge(&mut self, other: Removed) {
        self.attendance_records += other.attendance_records;
        self.attendance_sessions += other.attendance_sessions;
        self.submissions += other.submissions;
        self.assignments += other.assignments;
        self.document_keys.extend(other.document_keys);
    }
}

/// Delete the sessions matching `filter` together with their records.
pub async fn delete_sessions<C: ConnectionTrait>(
    conn: &C,
    filter: Condition,
) -> Result<Removed, DbErr> {
    let ids: Vec<i32> = attendance_session::Entity::find()
        .select_only()
        .column(attendance_session::Column::Id)
        .filter(filter)
        .into_tuple()
        .all(conn)
        .await?;
    if ids.is_empty() {
        return Ok(Removed::default());
    }

    let records = attendance_record::Entity::delete_many()
        .filter(attendance_record::Column::SessionId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    let sessions = attendance_session::Entity::delete_many()
        .filter(attendance_session::Column::Id.is_in(ids))
        .exec(conn)
        .await?;

    Ok(Removed {
        attendance_records: records.rows_affected,
        attendance_sessions: sessions.rows_affected,
        ..Default::default()
    })
}

/// Delete the assignments matching `filter` together with their submissions.
pub async fn delete_assignments<C: ConnectionTrait>(
    conn: &C,
    filter: Condition,
) -> Result<Removed, DbErr> {
    let doomed: Vec<(i32, Option<String>)> = assignment::Entity::find()
        .select_only()
        .column(assignment::Column::Id)
        .column(assignment::Column::DocumentKey)
        .filter(filter)
        .into_tuple()
        .all(conn)
        .await?;
    if doomed.is_empty() {
        return Ok(Removed::default());
    }

    let ids: Vec<i32> = doomed.iter().map(|(id, _)| *id).collect();
    let mut removed = delete_submissions(
        conn,
        Condition::all().add(assignment_submission::Column::AssignmentId.is_in(ids.clone())),
    )
    .await?;

    let assignments = assignment::Entity::delete_many()
        .filter(assignment::Column::Id.is_in(ids))
        .exec(conn)
        .await?;
    removed.assignments = assignments.rows_affected;
    removed
        .document_keys
        .extend(doomed.into_iter().filter_map(|(_, key)| key));

    Ok(removed)
}

/// Delete the submissions matching `filter`.
pub async fn delete_submissions<C: ConnectionTrait>(
    conn: &C,
    filter: Condition,
) -> Result<Removed, DbErr> {
    let file_keys: Vec<Option<String>> = assignment_submission::Entity::find()
        .select_only()
        .column(assignment_submission::Column::FileKey)
        .filter(filter.clone())
        .into_tuple()
        .all(conn)
        .await?;

    let submissions = assignment_submission::Entity::delete_many()
        .filter(filter)
        .exec(conn)
        .await?;

    Ok(Removed {
        submissions: submissions.rows_affected,
        document_keys: file_keys.into_iter().flatten().collect(),
        ..Default::default()
    })
}

/// Delete everything that references a student, leaving the sessions the
/// student recorded in place with their attribution cleared.
pub async fn detach_student<C: ConnectionTrait>(conn: &C, student_id: i32) -> Result<Removed, DbErr> {
    let records = attendance_record::Entity::delete_many()
        .filter(attendance_record::Column::StudentId.eq(student_id))
        .exec(conn)
        .await?;
    let mut removed = delete_submissions(
        conn,
        Condition::all().add(assignment_submission::Column::StudentId.eq(student_id)),
    )
    .await?;
    removed.attendance_records = records.rows_affected;

    attendance_session::Entity::update_many()
        .col_expr(
            attendance_session::Column::RecordedByCrId,
            Expr::value(Option::<i32>::None),
        )
        .filter(attendance_session::Column::RecordedByCrId.eq(student_id))
        .exec(conn)
        .await?;

    Ok(removed)
}
