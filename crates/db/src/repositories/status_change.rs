//! Status change repository.

use std::sync::Arc;

use crate::entities::{StatusChange, status_change};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use toolyard_common::{AppError, AppResult};

/// Status change repository for database operations.
///
/// Every tag swap on a tool leaves one immutable row here, so this table
/// doubles as the per-tool audit trail.
#[derive(Clone)]
pub struct StatusChangeRepository {
    db: Arc<DatabaseConnection>,
}

impl StatusChangeRepository {
    /// Create a new status change repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a status change.
    pub async fn create(
        &self,
        model: status_change::ActiveModel,
    ) -> AppResult<status_change::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// History for one tool, newest first.
    pub async fn list_for_tool(&self, tool_id: &str) -> AppResult<Vec<status_change::Model>> {
        StatusChange::find()
            .filter(status_change::Column::ToolId.eq(tool_id))
            .order_by_desc(status_change::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent changes across all tools.
    pub async fn list_recent(&self, limit: u64) -> AppResult<Vec<status_change::Model>> {
        StatusChange::find()
            .order_by_desc(status_change::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
