//! Tool repository.

use std::sync::Arc;

use crate::entities::{Tool, tool};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use toolyard_common::{AppError, AppResult};

/// Filters for listing tools.
#[derive(Debug, Clone, Default)]
pub struct ToolListQuery {
    pub status: Option<tool::ToolStatus>,
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Tool repository for database operations.
#[derive(Clone)]
pub struct ToolRepository {
    db: Arc<DatabaseConnection>,
}

impl ToolRepository {
    /// Create a new tool repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tool by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tool::Model>> {
        Tool::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tool by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tool::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ToolNotFound(id.to_string()))
    }

    /// Find a tool by serial number.
    pub async fn find_by_serial_no(&self, serial_no: &str) -> AppResult<Option<tool::Model>> {
        Tool::find()
            .filter(tool::Column::SerialNo.eq(serial_no))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tool.
    pub async fn create(&self, model: tool::ActiveModel) -> AppResult<tool::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a tool.
    pub async fn update(&self, model: tool::ActiveModel) -> AppResult<tool::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set a tool's status.
    pub async fn update_status(
        &self,
        id: &str,
        status: tool::ToolStatus,
    ) -> AppResult<tool::Model> {
        let active = tool::ActiveModel {
            id: Set(id.to_string()),
            status: Set(status),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tool. Returns the number of rows removed.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let res = Tool::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }

    /// List every tool, ordered by serial number.
    pub async fn list_all(&self) -> AppResult<Vec<tool::Model>> {
        Tool::find()
            .order_by_asc(tool::Column::SerialNo)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List tools matching the given filters, newest first.
    pub async fn list(&self, query: &ToolListQuery) -> AppResult<Vec<tool::Model>> {
        Tool::find()
            .filter(Self::condition(query))
            .order_by_desc(tool::Column::CreatedAt)
            .offset(query.offset)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count tools matching the given filters.
    pub async fn count(&self, query: &ToolListQuery) -> AppResult<u64> {
        Tool::find()
            .filter(Self::condition(query))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count tools carrying the given status tag.
    pub async fn count_by_status(&self, status: tool::ToolStatus) -> AppResult<u64> {
        Tool::find()
            .filter(tool::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn condition(query: &ToolListQuery) -> Condition {
        let mut condition = Condition::all();

        if let Some(status) = query.status {
            condition = condition.add(tool::Column::Status.eq(status));
        }

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
            condition = condition.add(
                Condition::any()
                    .add(tool::Column::Name.like(&pattern))
                    .add(tool::Column::SerialNo.like(&pattern))
                    .add(tool::Column::Location.like(&pattern)),
            );
        }

        condition
    }
}
