//! Cleanup scheduler.
//!
//! Scans accounts in the deletion pipeline and performs exactly one of
//! {permanent removal, day-threshold reminder, nothing} per account per
//! scan. Scans are single-flight: a manual run and a timer fire never
//! process the same account concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::Set;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use toolyard_common::{AppError, AppResult, IdGenerator};
use toolyard_db::{
    entities::{
        activity_log::{self, ActivityAction},
        user,
    },
    repositories::{ActivityLogRepository, UserRepository},
};

use super::lifecycle::{days_until_deletion, deletion_date};
use super::notification::{DeliveryOutcome, NotificationService};

/// Days-remaining values that trigger a reminder.
pub const REMINDER_THRESHOLDS: [i32; 3] = [7, 3, 1];

/// Pause between scans.
const SCAN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Aggregate result of one scan.
#[derive(Debug, Default)]
pub struct CleanupSummary {
    pub deleted_users: u64,
    pub reminders_sent: u64,
    /// One descriptive message per failed account or failed listing.
    pub errors: Vec<String>,
}

/// Scheduler state as reported to operators.
#[derive(Debug)]
pub struct CleanupStatus {
    pub is_running: bool,
    /// Approximate: recomputed as now + interval at call time, not the
    /// timer's true deadline.
    pub next_run_time: Option<DateTime<Utc>>,
}

/// Cleanup scheduler for the account deletion pipeline.
#[derive(Clone)]
pub struct CleanupService {
    user_repo: UserRepository,
    activity_repo: ActivityLogRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
    scan_interval: Duration,
    timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    scan_lock: Arc<Mutex<()>>,
}

impl CleanupService {
    /// Create a new cleanup service scanning once a day.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        activity_repo: ActivityLogRepository,
        notifications: NotificationService,
    ) -> Self {
        Self::with_interval(user_repo, activity_repo, notifications, SCAN_INTERVAL)
    }

    /// Same service with a custom scan interval.
    #[must_use]
    pub fn with_interval(
        user_repo: UserRepository,
        activity_repo: ActivityLogRepository,
        notifications: NotificationService,
        scan_interval: Duration,
    ) -> Self {
        Self {
            user_repo,
            activity_repo,
            notifications,
            id_gen: IdGenerator::new(),
            scan_interval,
            timer: Arc::new(Mutex::new(None)),
            scan_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Start the scheduler.
    ///
    /// Scans immediately, then rescans at a fixed interval. Calling
    /// this while the scheduler is running logs and returns without
    /// arming a second timer.
    pub async fn start(&self) {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::debug!("Cleanup scheduler is already running");
            return;
        }

        let service = self.clone();
        let scan_interval = self.scan_interval;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval(scan_interval);
            loop {
                ticker.tick().await;
                let summary = service.scan().await;
                if summary.errors.is_empty() {
                    if summary.deleted_users > 0 || summary.reminders_sent > 0 {
                        tracing::info!(
                            deleted = summary.deleted_users,
                            reminders = summary.reminders_sent,
                            "Cleanup scan finished"
                        );
                    }
                } else {
                    tracing::warn!(
                        deleted = summary.deleted_users,
                        reminders = summary.reminders_sent,
                        errors = summary.errors.len(),
                        "Cleanup scan finished with errors"
                    );
                }
            }
        }));

        tracing::info!(
            interval_secs = self.scan_interval.as_secs(),
            "Cleanup scheduler started"
        );
    }

    /// Stop the scheduler.
    ///
    /// Idempotent. A scan in progress is cancelled at its next await
    /// point.
    pub async fn stop(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
            tracing::info!("Cleanup scheduler stopped");
        }
    }

    /// Scheduler state plus the approximate next fire time.
    pub async fn status(&self) -> CleanupStatus {
        let timer = self.timer.lock().await;
        let is_running = timer.as_ref().is_some_and(|handle| !handle.is_finished());
        let ahead = chrono::Duration::from_std(self.scan_interval).unwrap_or_default();
        CleanupStatus {
            is_running,
            next_run_time: is_running.then(|| Utc::now() + ahead),
        }
    }

    /// Run one scan outside the timer and record who asked for it.
    ///
    /// The timer is untouched. Failures end up in the summary's
    /// `errors`, never as an error of the call itself.
    pub async fn run_manual_cleanup(&self, actor_id: &str) -> CleanupSummary {
        let mut summary = self.scan().await;

        let entry = activity_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(Some(actor_id.to_string())),
            action: Set(ActivityAction::AdminRunCleanup),
            tool_id: Set(None),
            details: Set(format!(
                "Manual cleanup run: {} deleted, {} reminded, {} errors",
                summary.deleted_users,
                summary.reminders_sent,
                summary.errors.len()
            )),
            ..Default::default()
        };
        if let Err(e) = self.activity_repo.append(entry).await {
            tracing::error!(error = %e, "Failed to record manual cleanup run");
            summary.errors.push(format!("Recording the run failed: {e}"));
        }

        summary
    }

    /// One pass over every account in the deletion pipeline.
    ///
    /// Holds the scan guard for the whole pass. A failing account is
    /// logged and counted, and the scan moves on to the next one.
    async fn scan(&self) -> CleanupSummary {
        let _guard = self.scan_lock.lock().await;
        let mut summary = CleanupSummary::default();

        let users = match self.user_repo.find_scheduled_for_deletion().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Cleanup scan could not list scheduled accounts");
                summary
                    .errors
                    .push(format!("Listing scheduled accounts failed: {e}"));
                return summary;
            }
        };

        let now = Utc::now();
        for user in users {
            if let Err(e) = self.process_account(&user, now, &mut summary).await {
                tracing::error!(user_id = %user.id, error = %e, "Cleanup failed for account");
                summary.errors.push(format!("Account {}: {e}", user.username));
            }
        }

        summary
    }

    async fn process_account(
        &self,
        user: &user::Model,
        now: DateTime<Utc>,
        summary: &mut CleanupSummary,
    ) -> AppResult<()> {
        let Some(scheduled_at) = user.deletion_scheduled_at else {
            return Ok(());
        };
        let days = days_until_deletion(scheduled_at, now);

        if days <= 0 {
            self.delete_account(user).await?;
            summary.deleted_users += 1;
            return Ok(());
        }

        // Exact threshold match; between thresholds nothing happens.
        let due = REMINDER_THRESHOLDS
            .iter()
            .copied()
            .find(|t| i64::from(*t) == days)
            .filter(|t| user.last_reminder_days != Some(*t));
        if let Some(threshold) = due {
            self.remind_account(user, threshold, deletion_date(scheduled_at))
                .await?;
            summary.reminders_sent += 1;
        }

        Ok(())
    }

    async fn delete_account(&self, user: &user::Model) -> AppResult<()> {
        self.user_repo.delete_permanently(&user.id).await?;
        self.append_system_activity(
            ActivityAction::SystemPermanentDeletion,
            format!(
                "Permanently deleted account {} after the grace period",
                user.username
            ),
        )
        .await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Permanently deleted account");
        Ok(())
    }

    /// Send one reminder and mark the threshold as handled so a rescan
    /// inside the same window does not resend it.
    async fn remind_account(
        &self,
        user: &user::Model,
        threshold: i32,
        date: DateTime<Utc>,
    ) -> AppResult<()> {
        let outcome = self
            .notifications
            .deletion_reminder(user, i64::from(threshold), date)
            .await;
        if let DeliveryOutcome::Failed(reason) = outcome {
            return Err(AppError::Email(reason));
        }

        self.user_repo
            .set_last_reminder_days(&user.id, threshold)
            .await?;
        self.append_system_activity(
            ActivityAction::SystemDeletionReminder,
            format!(
                "Sent {threshold}-day deletion reminder to {}",
                user.username
            ),
        )
        .await?;
        Ok(())
    }

    async fn append_system_activity(
        &self,
        action: ActivityAction,
        details: String,
    ) -> AppResult<()> {
        self.activity_repo
            .append(activity_log::ActiveModel {
                id: Set(self.id_gen.generate()),
                actor_id: Set(None),
                action: Set(action),
                tool_id: Set(None),
                details: Set(details),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::mailer::{MailMessage, Mailer};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use sea_orm::{
        DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, RuntimeErr,
    };
    use toolyard_common::config::SmtpConfig;
    use toolyard_db::entities::user::UserRole;

    /// Mailer that records messages and can refuse one recipient.
    #[derive(Default)]
    struct RecordingMailer {
        sent: std::sync::Mutex<Vec<MailMessage>>,
        fail_for: Option<String>,
    }

    impl RecordingMailer {
        fn failing_for(recipient: &str) -> Self {
            Self {
                sent: std::sync::Mutex::new(Vec::new()),
                fail_for: Some(recipient.to_string()),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, message: MailMessage) -> AppResult<()> {
            if self.fail_for.as_deref() == Some(message.to.as_str()) {
                return Err(AppError::Email("relay rejected".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn scheduled_user(id: &str, behind: ChronoDuration, last_reminder: Option<i32>) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            username_lower: format!("user_{id}"),
            email: format!("{id}@example.com"),
            name: None,
            role: UserRole::Member,
            password_hash: "hash".to_string(),
            token: None,
            is_active: false,
            deletion_scheduled_at: Some((Utc::now() - behind).into()),
            last_reminder_days: last_reminder,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn activity_entry(action: ActivityAction) -> activity_log::Model {
        activity_log::Model {
            id: "log1".to_string(),
            actor_id: None,
            action,
            tool_id: None,
            details: "entry".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn create_test_service(
        user_db: DatabaseConnection,
        activity_db: DatabaseConnection,
        mailer: Arc<RecordingMailer>,
    ) -> CleanupService {
        CleanupService::new(
            UserRepository::new(Arc::new(user_db)),
            ActivityLogRepository::new(Arc::new(activity_db)),
            NotificationService::new(mailer, &SmtpConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_expired_account_is_deleted() {
        let expired = scheduled_user("a", ChronoDuration::days(30) + ChronoDuration::hours(1), None);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[expired]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [activity_entry(ActivityAction::SystemPermanentDeletion)],
                [activity_entry(ActivityAction::AdminRunCleanup)],
            ])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 1);
        assert_eq!(summary.reminders_sent, 0);
        assert!(summary.errors.is_empty());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_seven_day_reminder() {
        let user = scheduled_user("a", ChronoDuration::days(23), None);
        let mut marked = user.clone();
        marked.last_reminder_days = Some(7);

        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user], vec![marked]])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [activity_entry(ActivityAction::SystemDeletionReminder)],
                [activity_entry(ActivityAction::AdminRunCleanup)],
            ])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 0);
        assert_eq!(summary.reminders_sent, 1);
        assert!(summary.errors.is_empty());
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("7 days"));
    }

    #[tokio::test]
    async fn test_reminder_not_repeated_for_same_threshold() {
        let user = scheduled_user("a", ChronoDuration::days(23), Some(7));
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[activity_entry(ActivityAction::AdminRunCleanup)]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.reminders_sent, 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_one_hour_short_of_boundary_reminds_instead_of_deleting() {
        let user = scheduled_user("a", ChronoDuration::days(29) + ChronoDuration::hours(23), None);
        let mut marked = user.clone();
        marked.last_reminder_days = Some(1);

        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user], vec![marked]])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [activity_entry(ActivityAction::SystemDeletionReminder)],
                [activity_entry(ActivityAction::AdminRunCleanup)],
            ])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 0);
        assert_eq!(summary.reminders_sent, 1);
        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].subject.contains("1 day until"));
    }

    #[tokio::test]
    async fn test_between_thresholds_is_a_no_op() {
        let user = scheduled_user("a", ChronoDuration::days(25), None);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[activity_entry(ActivityAction::AdminRunCleanup)]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 0);
        assert_eq!(summary.reminders_sent, 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_stop_the_scan() {
        let failing = scheduled_user("a", ChronoDuration::days(23), None);
        let healthy = scheduled_user("b", ChronoDuration::days(27), None);
        let mut marked = healthy.clone();
        marked.last_reminder_days = Some(3);

        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![failing, healthy], vec![marked]])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [activity_entry(ActivityAction::SystemDeletionReminder)],
                [activity_entry(ActivityAction::AdminRunCleanup)],
            ])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::failing_for("a@example.com"));

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.reminders_sent, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("user_a"));
        assert!(summary.errors[0].contains("relay rejected"));
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_listing_failure_ends_the_scan_early() {
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Conn(RuntimeErr::Internal(
                "connection refused".to_string(),
            ))])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[activity_entry(ActivityAction::AdminRunCleanup)]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 0);
        assert_eq!(summary.reminders_sent, 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("Listing scheduled accounts failed"));
    }

    #[tokio::test]
    async fn test_restored_account_is_not_in_the_pipeline() {
        // A restored account no longer matches the listing filter.
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[activity_entry(ActivityAction::AdminRunCleanup)]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = create_test_service(user_db, activity_db, mailer.clone());
        let summary = service.run_manual_cleanup("admin1").await;

        assert_eq!(summary.deleted_users, 0);
        assert_eq!(summary.reminders_sent, 0);
        assert!(summary.errors.is_empty());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_arms_a_single_timer() {
        let user = scheduled_user("a", ChronoDuration::days(23), None);
        let mut marked = user.clone();
        marked.last_reminder_days = Some(7);

        // Enough rows for eight scans; the listing always reports the
        // marker as unset so every executed scan sends one reminder.
        let mut user_queries = Vec::new();
        for _ in 0..8 {
            user_queries.push(vec![user.clone()]);
            user_queries.push(vec![marked.clone()]);
        }
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(user_queries)
            .into_connection();
        let activity_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(
                (0..8)
                    .map(|_| vec![activity_entry(ActivityAction::SystemDeletionReminder)])
                    .collect::<Vec<_>>(),
            )
            .append_exec_results((0..8).map(|_| exec_ok()).collect::<Vec<_>>())
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());

        let service = CleanupService::with_interval(
            UserRepository::new(Arc::new(user_db)),
            ActivityLogRepository::new(Arc::new(activity_db)),
            NotificationService::new(mailer.clone(), &SmtpConfig::default()),
            Duration::from_secs(3600),
        );

        service.start().await;
        service.start().await;

        let status = service.status().await;
        assert!(status.is_running);
        assert!(status.next_run_time.is_some());

        // The immediate scan fires once, not once per start call.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(mailer.sent_count(), 1);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(mailer.sent_count(), 2);

        service.stop().await;
        service.stop().await;

        let status = service.status().await;
        assert!(!status.is_running);
        assert!(status.next_run_time.is_none());

        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(mailer.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_a_no_op() {
        let service = create_test_service(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            Arc::new(RecordingMailer::default()),
        );

        service.stop().await;
        let status = service.status().await;
        assert!(!status.is_running);
    }
}
