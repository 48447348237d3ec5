use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded (or pending) file. `file_name` is the lookup key shared with the
/// object store; `file_content` holds the public URL once the payload arrived.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_name: String,
    pub user_id: String,
    pub file_content: Option<String>,
    pub created_at: DateTimeUtc,
    pub theme: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
