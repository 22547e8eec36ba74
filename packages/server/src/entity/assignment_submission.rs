use common::SubmissionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment_submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "assignment_student")]
    pub assignment_id: i32,
    #[sea_orm(unique_key = "assignment_student")]
    pub student_id: i32,

    /// Stored status. Readers derive the displayed one with
    /// `SubmissionStatus::effective`.
    pub status: SubmissionStatus,

    pub file_key: Option<String>,
    pub file_name: Option<String>,
    pub submitted_at: Option<DateTimeUtc>,

    #[sea_orm(belongs_to, from = "assignment_id", to = "id")]
    pub assignment: HasOne<super::assignment::Entity>,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student::Entity>,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
