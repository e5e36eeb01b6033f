//! Activity log repository.

use std::sync::Arc;

use crate::entities::{ActivityLog, activity_log};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use toolyard_common::{AppError, AppResult};

/// Activity log repository for database operations.
#[derive(Clone)]
pub struct ActivityLogRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityLogRepository {
    /// Create a new activity log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry to the log.
    pub async fn append(
        &self,
        model: activity_log::ActiveModel,
    ) -> AppResult<activity_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent entries, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<activity_log::Model>> {
        ActivityLog::find()
            .order_by_desc(activity_log::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
