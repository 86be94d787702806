use chrono::{DateTime, TimeZone};

use crate::models::{LeadSubmission, RequesterInfo};

const UNKNOWN: &str = "unknown";

/// Subject line for a lead notification.
pub fn subject(lead: &LeadSubmission) -> String {
    format!(
        "Новая заявка с сайта - {}",
        lead.form_type().subject_name()
    )
}

/// Plain-text notification body.
///
/// Title, form type and timestamp, then the labeled fields in fixed order,
/// then the requester's IP address and user agent as a trailer.
pub fn body<Tz>(lead: &LeadSubmission, requester: &RequesterInfo, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut message = String::from("Новая заявка с сайта\n\n");
    message.push_str(&format!(
        "Тип формы: {}\n",
        lead.form_type().display_name()
    ));
    message.push_str(&format!(
        "Дата и время: {}\n\n",
        at.format("%d.%m.%Y %H:%M:%S")
    ));

    message.push_str("Детали заявки:\n");
    for (label, value) in lead.labeled_fields() {
        message.push_str(&format!("{}: {}\n", label, value));
    }

    message.push_str("\n---\n");
    message.push_str(&format!(
        "IP адрес: {}\n",
        requester.ip.as_deref().unwrap_or(UNKNOWN)
    ));
    message.push_str(&format!(
        "User Agent: {}\n",
        requester.user_agent.as_deref().unwrap_or(UNKNOWN)
    ));

    message
}
