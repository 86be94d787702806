use crate::errors::{AppError, ValidationIssue};
use crate::models::{CalculatorLead, FieldMap, FinalLead, FormType, LeadSubmission};
use crate::phone::{self, NormalizedPhone};

/// Cleans a user-supplied value before it is stored, logged or mailed.
///
/// Trims surrounding whitespace, strips backslash escapes, then
/// HTML-escapes `& " ' < >`.
pub fn clean_input(raw: &str) -> String {
    html_escape(&strip_slashes(raw.trim()))
}

/// `\x` becomes `x` and `\\` becomes `\`. A trailing lone backslash is dropped.
fn strip_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Collects issues for one submission without stopping at the first one.
struct FieldReader<'a> {
    fields: &'a FieldMap,
    issues: Vec<ValidationIssue>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a FieldMap) -> Self {
        Self {
            fields,
            issues: Vec::new(),
        }
    }

    fn cleaned(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(|value| clean_input(value))
            .unwrap_or_default()
    }

    fn required(&mut self, field: &'static str, message: &'static str) -> String {
        let value = self.cleaned(field);
        if value.is_empty() {
            self.issues
                .push(ValidationIssue::MissingField { field, message });
        }
        value
    }

    /// Presence is judged on the cleaned value, but digits come from the raw
    /// input: escaping adds digits (`'` becomes `&#039;`).
    fn phone(&mut self) -> Option<NormalizedPhone> {
        if self.cleaned("phone").is_empty() {
            self.issues.push(ValidationIssue::MissingField {
                field: "phone",
                message: "Телефон не указан",
            });
            return None;
        }

        let raw = self.fields.get("phone").map(|v| v.trim()).unwrap_or_default();
        match phone::normalize(raw) {
            Ok(normalized) => Some(normalized),
            Err(_) => {
                self.issues.push(ValidationIssue::InvalidPhone);
                None
            }
        }
    }

    /// Returns the collected issues, or `Ok` with the phone when there are none.
    fn finish(self, phone: Option<NormalizedPhone>) -> Result<NormalizedPhone, AppError> {
        match phone {
            Some(phone) if self.issues.is_empty() => Ok(phone),
            _ => Err(AppError::Validation(self.issues)),
        }
    }
}

/// Validates a decoded field map and turns it into a typed lead.
///
/// Fails closed: any issue aborts before side effects. All issues for a
/// known form type are returned together. An unknown `form_type`
/// short-circuits.
///
/// # Arguments
///
/// * `fields` - Decoded request fields, including `form_type`.
///
/// # Returns
///
/// * `Result<LeadSubmission, AppError>` - The cleaned lead, or `UnknownFormType` / `Validation`.
pub fn validate(fields: &FieldMap) -> Result<LeadSubmission, AppError> {
    let form_type = fields
        .get("form_type")
        .map(|value| clean_input(value))
        .and_then(|value| FormType::parse(&value))
        .ok_or(AppError::UnknownFormType)?;

    let mut reader = FieldReader::new(fields);

    match form_type {
        FormType::Calculator => {
            let problem = reader.required("problem", "Проблема не указана");
            let brand = reader.required("brand", "Марка автомобиля не указана");
            let model = reader.required("model", "Модель автомобиля не указана");
            let phone = reader.phone();
            let phone = reader.finish(phone)?;

            Ok(LeadSubmission::Calculator(CalculatorLead {
                problem,
                brand,
                model,
                phone,
            }))
        }
        FormType::Final => {
            let name = reader.required("name", "Имя не указано");
            let phone = reader.phone();
            let car = reader.required("car", "Марка автомобиля не указана");
            let model = reader.required("model", "Модель автомобиля не указана");
            let problem = reader.required("problem", "Проблема не описана");
            let phone = reader.finish(phone)?;

            Ok(LeadSubmission::Final(FinalLead {
                name,
                phone,
                car,
                model,
                problem,
            }))
        }
    }
}
