use serde::{Serialize, Serializer};
use std::fmt;

/// Number of digits in a complete Russian phone number, country code included.
pub const PHONE_DIGITS: usize = 11;

/// Error returned by strict phone normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneError {
    /// Input did not reduce to 11 digits starting with 7 or 8.
    InvalidPhone,
}

impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneError::InvalidPhone => write!(f, "Invalid phone number"),
        }
    }
}

impl std::error::Error for PhoneError {}

/// A phone number reduced to 11 digits with the country code forced to `7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Canonical digit sequence, e.g. `79991234567`.
    pub fn as_digits(&self) -> &str {
        &self.0
    }

    /// Renders the number as `+7 (XXX) XXX-XX-XX`.
    pub fn format(&self) -> String {
        let d = &self.0;
        format!(
            "+7 ({}) {}-{}-{}",
            &d[1..4],
            &d[4..7],
            &d[7..9],
            &d[9..11]
        )
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

// Leads are logged and mailed with the display form, never the bare digits.
impl Serialize for NormalizedPhone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

/// Keeps only ASCII decimal digits.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Replaces a leading domestic trunk prefix `8` with the country code `7`.
fn with_country_code(mut digits: String) -> String {
    if digits.starts_with('8') {
        digits.replace_range(0..1, "7");
    }
    digits
}

/// Strict, all-or-nothing normalization used by the server validator.
///
/// Inputs with more or fewer than 11 digits are rejected rather than
/// truncated.
///
/// # Arguments
///
/// * `raw` - Free-text phone input, e.g. `"8 (999) 123-45-67"`.
///
/// # Returns
///
/// * `Result<NormalizedPhone, PhoneError>` - The canonical number or `InvalidPhone`.
pub fn normalize(raw: &str) -> Result<NormalizedPhone, PhoneError> {
    let extracted = digits(raw);
    if extracted.len() != PHONE_DIGITS {
        return Err(PhoneError::InvalidPhone);
    }

    let canonical = with_country_code(extracted);
    if !canonical.starts_with('7') {
        return Err(PhoneError::InvalidPhone);
    }

    Ok(NormalizedPhone(canonical))
}

/// Lenient, incremental rendering for live input masking.
///
/// Never used to accept a number. Partial input renders as far as it goes,
/// e.g. `"7123"` becomes `"+7 (123"`.
pub fn mask(raw: &str) -> String {
    let mut value = digits(raw);
    value.truncate(PHONE_DIGITS);
    if value.is_empty() {
        return String::new();
    }

    let value = with_country_code(value);
    if !value.starts_with('7') {
        return format!("+7 ({}", value);
    }

    let len = value.len();
    let slice = |from: usize, to: usize| &value[from.min(len)..to.min(len)];

    let mut out = String::from("+7");
    if len > 1 {
        out.push_str(" (");
        out.push_str(slice(1, 4));
    }
    if len >= 5 {
        out.push_str(") ");
        out.push_str(slice(4, 7));
    }
    if len >= 8 {
        out.push('-');
        out.push_str(slice(7, 9));
    }
    if len >= 10 {
        out.push('-');
        out.push_str(slice(9, 11));
    }
    out
}
