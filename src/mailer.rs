use anyhow::{Context, Result};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SendmailTransport, SmtpTransport, Transport as _};
use std::time::Duration;

use crate::config::{Config, MailTransportKind, SmtpTls};

/// A fully addressed plain-text notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers notifications to the business mailbox.
///
/// `send` is blocking. Callers are expected to run it off the async
/// runtime and bound it with a timeout.
pub trait MailTransport: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

enum Backend {
    Smtp(SmtpTransport),
    Sendmail(SendmailTransport),
}

/// `lettre`-backed transport, either the local sendmail binary or an SMTP relay.
pub struct LettreMailer {
    backend: Backend,
}

impl LettreMailer {
    /// Builds the transport selected by `MAIL_TRANSPORT`.
    pub fn new(config: &Config) -> Result<Self> {
        let backend = match config.mail_transport {
            MailTransportKind::Sendmail => Backend::Sendmail(SendmailTransport::new()),
            MailTransportKind::Smtp => Backend::Smtp(build_smtp(config)?),
        };

        Ok(Self { backend })
    }
}

fn build_smtp(config: &Config) -> Result<SmtpTransport> {
    let host = config
        .smtp_host
        .as_deref()
        .context("SMTP_HOST is required when MAIL_TRANSPORT=smtp")?;

    let mut builder = match config.smtp_tls {
        SmtpTls::Tls => SmtpTransport::relay(host)
            .with_context(|| format!("invalid SMTP_HOST '{}'", host))?,
        SmtpTls::StartTls => SmtpTransport::starttls_relay(host)
            .with_context(|| format!("invalid SMTP_HOST '{}'", host))?,
        SmtpTls::None => SmtpTransport::builder_dangerous(host),
    };

    if let Some(port) = config.smtp_port {
        builder = builder.port(port);
    }

    builder = builder.timeout(Some(Duration::from_secs(config.mail_timeout_secs)));

    if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}

fn parse_mailbox(raw: &str, role: &str) -> Result<Mailbox> {
    raw.parse()
        .with_context(|| format!("invalid {} address '{}'", role, raw))
}

/// Converts an outgoing notification into a `lettre` message.
pub fn build_message(mail: &OutgoingMail) -> Result<Message> {
    let message = Message::builder()
        .from(parse_mailbox(&mail.from, "From")?)
        .reply_to(parse_mailbox(&mail.reply_to, "Reply-To")?)
        .to(parse_mailbox(&mail.to, "To")?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .context("failed to build notification message")?;

    Ok(message)
}

impl MailTransport for LettreMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let message = build_message(mail)?;

        match &self.backend {
            Backend::Smtp(transport) => {
                transport.send(&message).context("SMTP delivery failed")?;
            }
            Backend::Sendmail(transport) => {
                transport
                    .send(&message)
                    .context("sendmail delivery failed")?;
            }
        }

        tracing::debug!("✓ Notification handed to mail transport: {}", mail.subject);
        Ok(())
    }
}
