use common::SubjectType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subject")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub subject_type: SubjectType,

    #[sea_orm(has_many)]
    pub attendance_sessions: HasMany<super::attendance_session::Entity>,

    #[sea_orm(has_many)]
    pub assignments: HasMany<super::assignment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
