//! Business logic services.

#![allow(missing_docs)]

pub mod cleanup;
pub mod lifecycle;
pub mod mailer;
pub mod notification;
pub mod report;
pub mod tool;
pub mod user;

pub use cleanup::{CleanupService, CleanupStatus, CleanupSummary, REMINDER_THRESHOLDS};
pub use lifecycle::{GRACE_PERIOD_DAYS, LifecycleService, days_until_deletion, deletion_date};
pub use mailer::{MailMessage, Mailer, MailerService, NoopMailer, SmtpMailer};
pub use notification::{DeliveryOutcome, NotificationService};
pub use report::{InventorySummary, ReportService};
pub use tool::{ChangeStatusInput, CreateToolInput, ToolService, UpdateToolInput};
pub use user::{LoginInput, RegisterInput, UserService};
