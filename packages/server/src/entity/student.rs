use common::GroupTag;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub roll: String,
    pub name: String,
    pub password: String, // argon2 PHC string
    pub group_tag: GroupTag,
    /// Class representatives may mark attendance for the cohort.
    pub is_cr: bool,

    #[sea_orm(has_many)]
    pub attendance_records: HasMany<super::attendance_record::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::assignment_submission::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
