use chrono::Utc;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::entity::{admin, assignment_submission, attendance_record, attendance_session};
use crate::utils::hash::hash_password;

/// Create the configured bootstrap administrator if it does not exist yet.
///
/// An existing account keeps its password; the configured one is only used
/// for the first start.
pub async fn seed_admin(db: &DatabaseConnection, account: &BootstrapAdmin) -> Result<(), DbErr> {
    let password = hash_password(&account.password)
        .map_err(|e| DbErr::Custom(format!("Failed to hash bootstrap password: {e}")))?;

    let model = admin::ActiveModel {
        username: Set(account.username.clone()),
        password: Set(password),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = admin::Entity::insert(model)
        .on_conflict(
            OnConflict::column(admin::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => {}
        Ok(_) => info!(username = %account.username, "Seeded bootstrap admin"),
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Ensure the composite lookup indexes used by the reporting queries exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        (
            "idx_attendance_record_student_session",
            Index::create()
                .if_not_exists()
                .name("idx_attendance_record_student_session")
                .table(attendance_record::Entity)
                .col(attendance_record::Column::StudentId)
                .col(attendance_record::Column::SessionId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_attendance_session_professor_date",
            Index::create()
                .if_not_exists()
                .name("idx_attendance_session_professor_date")
                .table(attendance_session::Entity)
                .col(attendance_session::Column::ProfessorId)
                .col(attendance_session::Column::Date)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_assignment_submission_student",
            Index::create()
                .if_not_exists()
                .name("idx_assignment_submission_student")
                .table(assignment_submission::Entity)
                .col(assignment_submission::Column::StudentId)
                .col(assignment_submission::Column::Status)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
