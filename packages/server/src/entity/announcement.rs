use common::GroupTag;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "announcement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String, // in Markdown

    /// NULL addresses the whole cohort.
    #[sea_orm(indexed)]
    pub group_tag: Option<GroupTag>,

    /// Display name of the poster.
    pub posted_by: String,

    /// Document store key of the attachment, if any.
    pub document_key: Option<String>,
    pub document_name: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
