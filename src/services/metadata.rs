use crate::entities::{file_records, prelude::*};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Row written by the `upload` command, before any payload arrives.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub user_id: String,
    pub file_name: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence for file metadata, keyed by file name.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upsert: an existing row with the same name is overwritten and its content URL cleared.
    async fn insert(&self, record: NewFileRecord) -> Result<()>;
    /// `Ok(None)` both when the row is missing and when its URL is not set yet.
    async fn get_content_url(&self, file_name: &str) -> Result<Option<String>>;
    /// Returns whether a row was updated.
    async fn update_content_url(&self, file_name: &str, url: &str) -> Result<bool>;
    /// Returns whether a row was renamed.
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool>;
    /// Returns whether a row was deleted.
    async fn delete(&self, file_name: &str) -> Result<bool>;
    async fn list_distinct_categories(&self) -> Result<Vec<String>>;
    async fn list_file_names_by_category(&self, category: &str) -> Result<Vec<String>>;
}

pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, file_name: &str) -> Result<Option<file_records::Model>> {
        Ok(FileRecords::find_by_id(file_name.to_owned())
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> Result<()> {
        let model = file_records::ActiveModel {
            file_name: Set(record.file_name),
            user_id: Set(record.user_id),
            file_content: Set(None),
            created_at: Set(record.created_at),
            theme: Set(Some(record.theme)),
        };

        FileRecords::insert(model)
            .on_conflict(
                OnConflict::column(file_records::Column::FileName)
                    .update_columns([
                        file_records::Column::UserId,
                        file_records::Column::FileContent,
                        file_records::Column::CreatedAt,
                        file_records::Column::Theme,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn get_content_url(&self, file_name: &str) -> Result<Option<String>> {
        let record = self.find(file_name).await?;
        Ok(record
            .and_then(|r| r.file_content)
            .filter(|url| !url.trim().is_empty()))
    }

    async fn update_content_url(&self, file_name: &str, url: &str) -> Result<bool> {
        let res = FileRecords::update_many()
            .col_expr(file_records::Column::FileContent, Expr::value(url))
            .filter(file_records::Column::FileName.eq(file_name))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool> {
        let res = FileRecords::update_many()
            .col_expr(file_records::Column::FileName, Expr::value(new_name))
            .filter(file_records::Column::FileName.eq(old_name))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, file_name: &str) -> Result<bool> {
        let res = FileRecords::delete_by_id(file_name.to_owned())
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_distinct_categories(&self) -> Result<Vec<String>> {
        let themes: Vec<Option<String>> = FileRecords::find()
            .select_only()
            .column(file_records::Column::Theme)
            .distinct()
            .order_by_asc(file_records::Column::Theme)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(themes.into_iter().flatten().collect())
    }

    async fn list_file_names_by_category(&self, category: &str) -> Result<Vec<String>> {
        let names: Vec<String> = FileRecords::find()
            .select_only()
            .column(file_records::Column::FileName)
            .filter(file_records::Column::Theme.eq(category))
            .order_by_asc(file_records::Column::FileName)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(names)
    }
}
