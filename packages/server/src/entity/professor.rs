use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Staff code used to log in (e.g. "P101").
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub password: String,

    #[sea_orm(has_many)]
    pub attendance_sessions: HasMany<super::attendance_session::Entity>,

    #[sea_orm(has_many)]
    pub assignments: HasMany<super::assignment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
