//! Account lifecycle notifications.
//!
//! Renders and dispatches the emails that accompany the deletion
//! pipeline. Dispatch is best-effort: a failed or disabled delivery is
//! reported through [`DeliveryOutcome`], never as an error.

use chrono::{DateTime, Utc};
use toolyard_common::config::SmtpConfig;
use toolyard_db::entities::user;

use super::mailer::{MailMessage, MailerService};

/// What happened to one outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handed to the mail transport.
    Sent,
    /// Mail delivery is disabled; the event was still processed.
    Skipped,
    /// The transport refused the message.
    Failed(String),
}

impl DeliveryOutcome {
    /// Whether the pipeline should treat this notification as handled.
    ///
    /// A disabled mailer counts as handled; only a transport failure
    /// leaves the notification pending.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Sent | Self::Skipped)
    }
}

/// Notification service for lifecycle emails.
#[derive(Clone)]
pub struct NotificationService {
    mailer: MailerService,
    service_name: String,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(mailer: MailerService, config: &SmtpConfig) -> Self {
        Self {
            mailer,
            service_name: config.from_name.clone(),
        }
    }

    /// Tell a user their account has entered the deletion pipeline.
    pub async fn deletion_scheduled(
        &self,
        user: &user::Model,
        deletion_date: DateTime<Utc>,
    ) -> DeliveryOutcome {
        let name = display_name(user);
        let date = deletion_date.format("%Y-%m-%d");

        let subject = format!("Your {} account is scheduled for deletion", self.service_name);
        let text = format!(
            "Hi {name},\n\n\
            An administrator has scheduled your {} account for deletion.\n\n\
            Your account and all associated data will be permanently removed on {date}.\n\
            Until then your account is deactivated. If this was a mistake, contact an \
            administrator to restore it.",
            self.service_name
        );
        let html = self.wrap_html(&format!(
            "<p>Hi {name},</p>\
            <p>An administrator has scheduled your <strong>{}</strong> account for deletion.</p>\
            <p>Your account and all associated data will be permanently removed on \
            <strong>{date}</strong>.</p>\
            <p>Until then your account is deactivated. If this was a mistake, contact an \
            administrator to restore it.</p>",
            self.service_name
        ));

        self.dispatch(user, subject, text, html).await
    }

    /// Remind a user how many days remain before permanent removal.
    pub async fn deletion_reminder(
        &self,
        user: &user::Model,
        days_remaining: i64,
        deletion_date: DateTime<Utc>,
    ) -> DeliveryOutcome {
        let name = display_name(user);
        let date = deletion_date.format("%Y-%m-%d");
        let day_word = if days_remaining == 1 { "day" } else { "days" };

        let subject = format!(
            "{days_remaining} {day_word} until your {} account is deleted",
            self.service_name
        );
        let text = format!(
            "Hi {name},\n\n\
            This is a reminder that your {} account will be permanently deleted in \
            {days_remaining} {day_word}, on {date}.\n\n\
            If you want to keep the account, contact an administrator before then.",
            self.service_name
        );
        let html = self.wrap_html(&format!(
            "<p>Hi {name},</p>\
            <p>This is a reminder that your <strong>{}</strong> account will be permanently \
            deleted in <strong>{days_remaining} {day_word}</strong>, on {date}.</p>\
            <p>If you want to keep the account, contact an administrator before then.</p>",
            self.service_name
        ));

        self.dispatch(user, subject, text, html).await
    }

    /// Tell a user their account was taken out of the deletion pipeline.
    pub async fn account_restored(&self, user: &user::Model) -> DeliveryOutcome {
        let name = display_name(user);

        let subject = format!("Your {} account has been restored", self.service_name);
        let text = format!(
            "Hi {name},\n\n\
            Your {} account is no longer scheduled for deletion and has been reactivated.\n\
            You can log in again as usual.",
            self.service_name
        );
        let html = self.wrap_html(&format!(
            "<p>Hi {name},</p>\
            <p>Your <strong>{}</strong> account is no longer scheduled for deletion and has \
            been reactivated.</p>\
            <p>You can log in again as usual.</p>",
            self.service_name
        ));

        self.dispatch(user, subject, text, html).await
    }

    async fn dispatch(
        &self,
        user: &user::Model,
        subject: String,
        text: String,
        html: String,
    ) -> DeliveryOutcome {
        if !self.mailer.is_enabled() {
            tracing::debug!(user_id = %user.id, %subject, "Mail disabled, skipping notification");
            return DeliveryOutcome::Skipped;
        }

        let message = MailMessage {
            to: user.email.clone(),
            subject: subject.clone(),
            text_body: text,
            html_body: html,
        };

        match self.mailer.send(message).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, %subject, "Notification sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, %subject, error = %e, "Notification failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Wrap HTML content in a basic email template.
    fn wrap_html(&self, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #007bff; }}
    </style>
</head>
<body>
    {}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        This email was sent by {}.
    </p>
</body>
</html>"#,
            content, self.service_name
        )
    }
}

fn display_name(user: &user::Model) -> &str {
    user.name.as_deref().unwrap_or(&user.username)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::mailer::{Mailer, NoopMailer};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use toolyard_common::{AppError, AppResult};
    use toolyard_db::entities::user::UserRole;

    fn create_test_user(email: &str) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "roughneck".to_string(),
            username_lower: "roughneck".to_string(),
            email: email.to_string(),
            name: Some("Rig Hand".to_string()),
            role: UserRole::Member,
            password_hash: "$argon2id$stub".to_string(),
            token: None,
            is_active: false,
            deletion_scheduled_at: Some(Utc::now().into()),
            last_reminder_days: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    /// Mailer that records every message it receives.
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, message: MailMessage) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Email("relay rejected".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reminder_sent_through_mailer() {
        let mailer = Arc::new(RecordingMailer::new(false));
        let service = NotificationService::new(mailer.clone(), &SmtpConfig::default());
        let user = create_test_user("hand@example.com");

        let outcome = service.deletion_reminder(&user, 7, Utc::now()).await;

        assert_eq!(outcome, DeliveryOutcome::Sent);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "hand@example.com");
        assert!(sent[0].subject.contains("7 days"));
        assert!(sent[0].text_body.contains("7 days"));
    }

    #[tokio::test]
    async fn test_reminder_singular_day() {
        let mailer = Arc::new(RecordingMailer::new(false));
        let service = NotificationService::new(mailer.clone(), &SmtpConfig::default());
        let user = create_test_user("hand@example.com");

        service.deletion_reminder(&user, 1, Utc::now()).await;

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].subject.contains("1 day until"));
    }

    #[tokio::test]
    async fn test_transport_failure_reported_not_raised() {
        let mailer = Arc::new(RecordingMailer::new(true));
        let service = NotificationService::new(mailer, &SmtpConfig::default());
        let user = create_test_user("hand@example.com");

        let outcome = service.deletion_scheduled(&user, Utc::now()).await;

        match &outcome {
            DeliveryOutcome::Failed(reason) => assert!(reason.contains("relay rejected")),
            other => panic!("Expected Failed outcome, got {other:?}"),
        }
        assert!(!outcome.is_handled());
    }

    #[tokio::test]
    async fn test_disabled_mailer_skips() {
        let service = NotificationService::new(Arc::new(NoopMailer), &SmtpConfig::default());
        let user = create_test_user("hand@example.com");

        let outcome = service.account_restored(&user).await;

        assert_eq!(outcome, DeliveryOutcome::Skipped);
        assert!(outcome.is_handled());
    }
}
