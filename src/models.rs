use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::phone::NormalizedPhone;

/// Raw request fields after body decoding, before any cleaning.
pub type FieldMap = HashMap<String, String>;

/// Discriminator carried in the `form_type` request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    /// Cost calculator wizard.
    Calculator,
    /// Final "book a diagnostic" form, also posted by the modal booking form.
    Final,
}

impl FormType {
    /// Parses an already-cleaned `form_type` value. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "calculator" => Some(FormType::Calculator),
            "final" => Some(FormType::Final),
            _ => None,
        }
    }

    /// Wire name, as written to the submission logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Calculator => "calculator",
            FormType::Final => "final",
        }
    }

    /// Short name used in the mail subject.
    pub fn subject_name(&self) -> &'static str {
        match self {
            FormType::Calculator => "Калькулятор",
            FormType::Final => "Финальная форма",
        }
    }

    /// Descriptive name used in the mail body.
    pub fn display_name(&self) -> &'static str {
        match self {
            FormType::Calculator => "Калькулятор стоимости",
            FormType::Final => "Запись на диагностику",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead captured by the cost calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculatorLead {
    pub problem: String,
    pub brand: String,
    pub model: String,
    pub phone: NormalizedPhone,
}

/// Lead captured by the final form or the modal booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalLead {
    pub name: String,
    pub phone: NormalizedPhone,
    pub car: String,
    pub model: String,
    pub problem: String,
}

/// A validated lead. Only `validation::validate` constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LeadSubmission {
    Calculator(CalculatorLead),
    Final(FinalLead),
}

impl LeadSubmission {
    pub fn form_type(&self) -> FormType {
        match self {
            LeadSubmission::Calculator(_) => FormType::Calculator,
            LeadSubmission::Final(_) => FormType::Final,
        }
    }

    pub fn phone(&self) -> &NormalizedPhone {
        match self {
            LeadSubmission::Calculator(lead) => &lead.phone,
            LeadSubmission::Final(lead) => &lead.phone,
        }
    }

    /// Labeled fields in the fixed order they appear in notifications.
    pub fn labeled_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            LeadSubmission::Calculator(lead) => vec![
                ("Проблема", lead.problem.clone()),
                ("Марка автомобиля", lead.brand.clone()),
                ("Модель автомобиля", lead.model.clone()),
                ("Телефон", lead.phone.format()),
            ],
            LeadSubmission::Final(lead) => vec![
                ("Имя", lead.name.clone()),
                ("Телефон", lead.phone.format()),
                ("Марка автомобиля", lead.car.clone()),
                ("Модель автомобиля", lead.model.clone()),
                ("Проблема", lead.problem.clone()),
            ],
        }
    }

    /// Payload as it appears in the submission logs: JSON with non-ASCII kept literal.
    pub fn to_log_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Requester metadata appended to notifications.
#[derive(Debug, Clone, Default)]
pub struct RequesterInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// JSON body returned by the submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl SubmissionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Some(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phone::normalize;

    #[test]
    fn test_form_type_parse_is_exact() {
        assert_eq!(FormType::parse("calculator"), Some(FormType::Calculator));
        assert_eq!(FormType::parse("final"), Some(FormType::Final));
        assert_eq!(FormType::parse("Final"), None);
        assert_eq!(FormType::parse("modal"), None);
        assert_eq!(FormType::parse(""), None);
    }

    #[test]
    fn test_log_json_keeps_field_order_and_cyrillic() {
        let lead = LeadSubmission::Final(FinalLead {
            name: "Иван".to_string(),
            phone: normalize("89991234567").unwrap(),
            car: "Toyota".to_string(),
            model: "Camry".to_string(),
            problem: "не работает стеклоподъемник".to_string(),
        });

        assert_eq!(
            lead.to_log_json().unwrap(),
            r#"{"name":"Иван","phone":"+7 (999) 123-45-67","car":"Toyota","model":"Camry","problem":"не работает стеклоподъемник"}"#
        );
    }

    #[test]
    fn test_response_omits_empty_errors() {
        let json = serde_json::to_value(SubmissionResponse::ok("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
