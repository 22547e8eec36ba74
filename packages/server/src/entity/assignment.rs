use common::AssignmentType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub due_date: Date,
    pub assignment_type: AssignmentType,

    /// Document store key of the attached brief, if any.
    pub document_key: Option<String>,
    pub document_name: Option<String>,

    pub subject_id: i32,
    #[sea_orm(belongs_to, from = "subject_id", to = "id")]
    pub subject: HasOne<super::subject::Entity>,

    pub professor_id: i32,
    #[sea_orm(belongs_to, from = "professor_id", to = "id")]
    pub professor: HasOne<super::professor::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::assignment_submission::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
