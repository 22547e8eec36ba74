use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "session_student")]
    pub session_id: i32,
    #[sea_orm(unique_key = "session_student")]
    pub student_id: i32,

    pub present: bool,
    pub note: Option<String>,

    #[sea_orm(belongs_to, from = "session_id", to = "id")]
    pub session: HasOne<super::attendance_session::Entity>,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
