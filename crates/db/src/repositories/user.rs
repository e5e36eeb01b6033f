//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use toolyard_common::{AppError, AppResult};

/// User repository for database operations.
///
/// Also serves as the account lifecycle store: the deletion pipeline is
/// driven entirely through the `deletion_scheduled_at`, `is_active` and
/// `last_reminder_days` columns managed here.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email address.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all users, newest first.
    pub async fn list_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All users currently in the deletion pipeline, oldest schedule first.
    pub async fn find_scheduled_for_deletion(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::DeletionScheduledAt.is_not_null())
            .order_by_asc(user::Column::DeletionScheduledAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Put a user into the deletion pipeline.
    ///
    /// Sets the schedule timestamp, deactivates the account and clears any
    /// stale reminder marker from a previous schedule.
    pub async fn schedule_deletion(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.deletion_scheduled_at = Set(Some(at.into()));
        active.is_active = Set(false);
        active.last_reminder_days = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.update(active).await
    }

    /// Take a user out of the deletion pipeline.
    pub async fn clear_deletion_schedule(&self, id: &str) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.deletion_scheduled_at = Set(None);
        active.is_active = Set(true);
        active.last_reminder_days = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.update(active).await
    }

    /// Record which reminder threshold was last emailed.
    pub async fn set_last_reminder_days(&self, id: &str, days: i32) -> AppResult<user::Model> {
        let active = user::ActiveModel {
            id: Set(id.to_string()),
            last_reminder_days: Set(Some(days)),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.update(active).await
    }

    /// Replace a user's session token. `None` logs the session out.
    pub async fn update_token(&self, id: &str, token: Option<String>) -> AppResult<user::Model> {
        let active = user::ActiveModel {
            id: Set(id.to_string()),
            token: Set(token),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.update(active).await
    }

    /// Permanently delete a user row. Returns the number of rows removed.
    pub async fn delete_permanently(&self, id: &str) -> AppResult<u64> {
        let res = User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }
}
