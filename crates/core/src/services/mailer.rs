//! Outbound mail transport.
//!
//! Provides an abstraction over SMTP so services can hand off messages
//! without knowing whether delivery is configured.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use toolyard_common::{AppError, AppResult, config::SmtpConfig};

/// A rendered message ready for delivery.
#[derive(Debug)]
pub struct MailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body
    pub html_body: String,
}

/// Trait for outbound mail delivery.
///
/// This allows the core services to send mail without directly
/// depending on the SMTP transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether this mailer actually delivers anything.
    fn is_enabled(&self) -> bool;

    /// Deliver a message.
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// SMTP mailer backed by lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from SMTP configuration.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid from address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Email(format!("Invalid SMTP host: {e}")))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: MailMessage) -> AppResult<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.text_body,
                message.html_body,
            ))
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Email(format!("SMTP delivery failed: {e}")))?;

        Ok(())
    }
}

/// A no-op mailer for environments without SMTP configured.
#[derive(Clone, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, message: MailMessage) -> AppResult<()> {
        tracing::debug!(to = %message.to, subject = %message.subject, "Mail disabled, dropping message");
        Ok(())
    }
}

/// Wrapper for boxed Mailer trait object.
pub type MailerService = Arc<dyn Mailer>;
