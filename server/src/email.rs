//! Email delivery.
//!
//! [`EmailNotifier`] abstracts over delivery so the notifier loop can run
//! against a real SMTP relay in production and a console logger in
//! development. The SMTP path builds a fresh transport per message to avoid
//! connection pooling issues with relays that drop idle connections.

use crate::config::SmtpConfig;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Errors surfaced by email delivery.
#[derive(Debug, Error)]
pub enum EmailError {
    /// The message could not be constructed (bad address, bad body).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The SMTP relay refused or dropped the message.
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// One rendered email ready to send.
#[derive(Debug, Clone)]
pub struct Email {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

/// Email delivery backend.
pub trait EmailNotifier: Send + Sync {
    /// Delivers one email.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the message cannot be built or the
    /// transport refuses it.
    fn send(&self, email: &Email) -> impl std::future::Future<Output = Result<(), EmailError>> + Send;
}

/// Sends email through an SMTP relay using Lettre.
#[derive(Clone)]
pub struct SmtpNotifier {
    server: String,
    port: u16,
    credentials: Credentials,
    from_header: String,
}

impl SmtpNotifier {
    /// Creates a notifier from loaded SMTP settings.
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from_header: format!("{} <{}>", config.from_name, config.from_email),
        }
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&self.server)?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }
}

impl EmailNotifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_header
                    .parse()
                    .map_err(|e| EmailError::InvalidMessage(format!("from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| EmailError::InvalidMessage(format!("to address: {e}")))?)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| EmailError::InvalidMessage(format!("body: {e}")))?;

        let mailer = self.build_transport()?;
        mailer.send(message).await?;
        Ok(())
    }
}

/// Logs email to the console instead of sending it.
///
/// Used when SMTP is not configured, so local development never needs a
/// relay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

impl EmailNotifier for ConsoleNotifier {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body_bytes = email.html_body.len(),
            "email (console delivery)"
        );
        Ok(())
    }
}

/// Configured delivery backend.
///
/// Enum dispatch keeps [`EmailNotifier`] free to use `impl Future` returns
/// without boxing.
#[derive(Clone)]
pub enum Notifier {
    /// Real SMTP delivery.
    Smtp(SmtpNotifier),
    /// Console logging.
    Console(ConsoleNotifier),
}

impl Notifier {
    /// Picks the backend from loaded configuration.
    #[must_use]
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Self {
        match smtp {
            Some(config) => Self::Smtp(SmtpNotifier::new(config)),
            None => Self::Console(ConsoleNotifier),
        }
    }
}

impl EmailNotifier for Notifier {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        match self {
            Self::Smtp(notifier) => notifier.send(email).await,
            Self::Console(notifier) => notifier.send(email).await,
        }
    }
}
