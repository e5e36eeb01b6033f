//! Account deletion lifecycle.
//!
//! Admin-facing entry points of the deletion pipeline: scheduling an
//! account for deletion and restoring it. Permanent removal and
//! reminders are driven by the cleanup scheduler.

use chrono::{DateTime, Duration, Utc};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use toolyard_common::{AppError, AppResult, IdGenerator};
use toolyard_db::{
    entities::{
        activity_log::{self, ActivityAction},
        user::{self, UserRole},
    },
    repositories::{ActivityLogRepository, UserRepository},
};

use super::notification::{DeliveryOutcome, NotificationService};

/// Days between scheduling a deletion and permanent removal.
pub const GRACE_PERIOD_DAYS: i64 = 30;

/// The moment an account scheduled at `scheduled_at` is removed.
#[must_use]
pub fn deletion_date(scheduled_at: DateTimeWithTimeZone) -> DateTime<Utc> {
    scheduled_at.with_timezone(&Utc) + Duration::days(GRACE_PERIOD_DAYS)
}

/// Whole days left before removal, rounded up.
///
/// Zero or negative means the grace period has elapsed. An account one
/// hour short of the boundary still reports one day remaining.
#[must_use]
pub fn days_until_deletion(scheduled_at: DateTimeWithTimeZone, now: DateTime<Utc>) -> i64 {
    let secs = (deletion_date(scheduled_at) - now).num_seconds();
    secs / 86_400 + i64::from(secs % 86_400 > 0)
}

/// Lifecycle service for scheduling and restoring account deletions.
#[derive(Clone)]
pub struct LifecycleService {
    user_repo: UserRepository,
    activity_repo: ActivityLogRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl LifecycleService {
    /// Create a new lifecycle service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        activity_repo: ActivityLogRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            user_repo,
            activity_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Put an account into the deletion pipeline.
    ///
    /// Deactivates the account, stamps `deletion_scheduled_at` and
    /// returns the updated account together with its deletion date.
    /// The warning email is best-effort; a delivery failure never
    /// fails the scheduling.
    pub async fn schedule_deletion(
        &self,
        admin_id: &str,
        user_id: &str,
    ) -> AppResult<(user::Model, DateTime<Utc>)> {
        if admin_id == user_id {
            return Err(AppError::BadRequest(
                "Cannot schedule your own account for deletion".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(user_id).await?;

        if target.role == UserRole::Admin {
            return Err(AppError::BadRequest(
                "Cannot schedule an administrator account for deletion".to_string(),
            ));
        }
        if target.deletion_scheduled_at.is_some() {
            return Err(AppError::BadRequest(
                "Account is already scheduled for deletion".to_string(),
            ));
        }

        let now = Utc::now();
        let user = self.user_repo.schedule_deletion(user_id, now).await?;
        let date = deletion_date(now.into());

        self.append_activity(
            admin_id,
            ActivityAction::AdminScheduleDeletion,
            format!(
                "Scheduled account {} for deletion on {}",
                user.username,
                date.format("%Y-%m-%d")
            ),
        )
        .await?;

        if let DeliveryOutcome::Failed(reason) =
            self.notifications.deletion_scheduled(&user, date).await
        {
            tracing::warn!(user_id = %user.id, %reason, "Deletion warning email was not delivered");
        }

        Ok((user, date))
    }

    /// Take an account out of the deletion pipeline and reactivate it.
    pub async fn restore(&self, admin_id: &str, user_id: &str) -> AppResult<user::Model> {
        let target = self.user_repo.get_by_id(user_id).await?;

        if target.deletion_scheduled_at.is_none() {
            return Err(AppError::BadRequest(
                "Account is not scheduled for deletion".to_string(),
            ));
        }

        let user = self.user_repo.clear_deletion_schedule(user_id).await?;

        self.append_activity(
            admin_id,
            ActivityAction::AdminRestoreUser,
            format!("Restored account {}", user.username),
        )
        .await?;

        if let DeliveryOutcome::Failed(reason) = self.notifications.account_restored(&user).await {
            tracing::warn!(user_id = %user.id, %reason, "Restore email was not delivered");
        }

        Ok(user)
    }

    /// All accounts, newest first.
    pub async fn list_users(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.list_all().await
    }

    /// Accounts currently in the deletion pipeline.
    pub async fn scheduled_users(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_scheduled_for_deletion().await
    }

    /// Recent activity-log entries, newest first.
    pub async fn recent_activity(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<activity_log::Model>> {
        self.activity_repo.list(limit, offset).await
    }

    async fn append_activity(
        &self,
        actor_id: &str,
        action: ActivityAction,
        details: String,
    ) -> AppResult<()> {
        self.activity_repo
            .append(activity_log::ActiveModel {
                id: Set(self.id_gen.generate()),
                actor_id: Set(Some(actor_id.to_string())),
                action: Set(action),
                tool_id: Set(None),
                details: Set(details),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
