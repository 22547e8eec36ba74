use common::{GroupQualifier, SubjectType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One class meeting whose attendance was taken.
///
/// (subject_id, professor_id, date, group_qualifier) is the natural key; the
/// database rejects a second row for the same tuple.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_session")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "session_natural_key")]
    pub subject_id: i32,
    #[sea_orm(belongs_to, from = "subject_id", to = "id")]
    pub subject: HasOne<super::subject::Entity>,

    #[sea_orm(unique_key = "session_natural_key")]
    pub professor_id: i32,
    #[sea_orm(belongs_to, from = "professor_id", to = "id")]
    pub professor: HasOne<super::professor::Entity>,

    #[sea_orm(unique_key = "session_natural_key")]
    pub date: Date,

    #[sea_orm(unique_key = "session_natural_key")]
    pub group_qualifier: GroupQualifier,

    /// Subject type at the time of marking.
    pub subject_type: SubjectType,

    /// NULL once the recording CR has been deleted.
    pub recorded_by_cr_id: Option<i32>,
    #[sea_orm(belongs_to, from = "recorded_by_cr_id", to = "id")]
    pub recorded_by_cr: HasOne<super::student::Entity>,

    #[sea_orm(has_many)]
    pub records: HasMany<super::attendance_record::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
