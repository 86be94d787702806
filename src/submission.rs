use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::mailer::{MailTransport, OutgoingMail};
use crate::models::{FieldMap, LeadSubmission, RequesterInfo};
use crate::notification;
use crate::submission_log::{Outcome, SubmissionLog, SubmissionLogEntry};
use crate::validation;

/// Message shown to the visitor after a successful submission.
pub const SUCCESS_MESSAGE: &str =
    "Заявка успешно отправлена! Мы свяжемся с вами в ближайшее время.";

/// Addressing for outgoing notifications.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub to: String,
    pub from: String,
    pub reply_to: String,
}

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub lead: LeadSubmission,
    pub message: &'static str,
}

/// Validates leads, mails them to the business and records the outcome.
///
/// Holds no mutable state; one instance is shared by all requests.
#[derive(Clone)]
pub struct LeadSubmitter {
    mail: MailSettings,
    transport: Arc<dyn MailTransport>,
    log: SubmissionLog,
    dispatch_timeout: Duration,
}

impl LeadSubmitter {
    pub fn new(
        mail: MailSettings,
        transport: Arc<dyn MailTransport>,
        log: SubmissionLog,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            mail,
            transport,
            log,
            dispatch_timeout,
        }
    }

    /// Wires a submitter from configuration and a transport.
    pub fn from_config(config: &Config, transport: Arc<dyn MailTransport>) -> Self {
        Self::new(
            MailSettings {
                to: config.mail_to.clone(),
                from: config.mail_from.clone(),
                reply_to: config.mail_reply_to.clone(),
            },
            transport,
            SubmissionLog::new(&config.success_log_path, &config.error_log_path),
            Duration::from_secs(config.mail_timeout_secs),
        )
    }

    /// Processes one submission end to end.
    ///
    /// Flow:
    /// 1. Validate and clean the fields (no side effects on failure).
    /// 2. Build the notification and dispatch it with a bounded timeout.
    /// 3. Append a success or failure entry to the matching log.
    ///
    /// # Arguments
    ///
    /// * `fields` - Decoded request fields.
    /// * `requester` - Remote address and user agent for the notification trailer.
    ///
    /// # Returns
    ///
    /// * `Result<SubmissionReceipt, AppError>` - The receipt, or a validation / dispatch error.
    pub async fn submit(
        &self,
        fields: &FieldMap,
        requester: &RequesterInfo,
    ) -> Result<SubmissionReceipt, AppError> {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!("submission", id = %submission_id);

        self.process(submission_id, fields, requester)
            .instrument(span)
            .await
    }

    async fn process(
        &self,
        submission_id: Uuid,
        fields: &FieldMap,
        requester: &RequesterInfo,
    ) -> Result<SubmissionReceipt, AppError> {
        let lead = validation::validate(fields)?;
        let form_type = lead.form_type();
        tracing::info!("Validated {} lead", form_type);
        tracing::debug!("Lead payload: {:?}", lead);

        let now = Local::now();
        let mail = OutgoingMail {
            to: self.mail.to.clone(),
            from: self.mail.from.clone(),
            reply_to: self.mail.reply_to.clone(),
            subject: notification::subject(&lead),
            body: notification::body(&lead, requester, &now),
        };

        match self.dispatch(mail).await {
            Ok(()) => {
                tracing::info!("✓ Notification sent for {} lead", form_type);
                self.record(&lead, Outcome::Success, None).await;
                Ok(SubmissionReceipt {
                    submission_id,
                    lead,
                    message: SUCCESS_MESSAGE,
                })
            }
            Err(detail) => {
                self.record(&lead, Outcome::Failure, Some(detail.as_str())).await;
                Err(AppError::MailDispatch(detail))
            }
        }
    }

    /// Runs the blocking transport on the blocking pool, bounded by the timeout.
    /// Timeouts and panics count as dispatch failures.
    async fn dispatch(&self, mail: OutgoingMail) -> Result<(), String> {
        let transport = Arc::clone(&self.transport);
        let task = tokio::task::spawn_blocking(move || transport.send(&mail));

        match tokio::time::timeout(self.dispatch_timeout, task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(format!("{:#}", e)),
            Ok(Err(e)) => Err(format!("mail transport task failed: {}", e)),
            Err(_) => Err(format!(
                "mail dispatch timed out after {}s",
                self.dispatch_timeout.as_secs_f32()
            )),
        }
    }

    /// Log write failures never change the response.
    async fn record(&self, lead: &LeadSubmission, outcome: Outcome, detail: Option<&str>) {
        let entry = SubmissionLogEntry {
            timestamp: Local::now(),
            outcome,
            payload: lead,
            error_detail: detail,
        };

        if let Err(e) = self.log.append(&entry).await {
            let path = match outcome {
                Outcome::Success => self.log.success_path(),
                Outcome::Failure => self.log.error_path(),
            };
            tracing::error!(
                "Failed to append submission log {}: {}",
                path.display(),
                e
            );
        }
    }
}
