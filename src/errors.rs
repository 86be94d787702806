use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::models::SubmissionResponse;

/// Message returned for any non-POST request to the submission endpoint.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Метод не разрешен";
/// Message returned together with the itemized validation errors.
pub const VALIDATION_FAILED_MESSAGE: &str = "Ошибки валидации";
/// Generic retry-later message for infrastructure failures.
pub const DISPATCH_FAILED_MESSAGE: &str = "Произошла ошибка при отправке заявки. Пожалуйста, попробуйте позже или свяжитесь с нами по телефону.";
/// Error item returned when `form_type` is missing or unknown.
pub const UNKNOWN_FORM_TYPE_MESSAGE: &str = "Неизвестный тип формы";

/// Message for bodies over the configured size limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Слишком большой запрос";
/// Message for clients over the per-IP rate limit.
pub const TOO_MANY_REQUESTS_MESSAGE: &str =
    "Слишком много запросов. Пожалуйста, попробуйте позже.";

/// JSON content type sent with every response of the submission endpoint.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// A single user-correctable problem with a submitted lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required field was absent or empty after cleaning.
    MissingField {
        field: &'static str,
        message: &'static str,
    },
    /// The phone did not pass strict normalization.
    InvalidPhone,
}

impl ValidationIssue {
    /// Name of the request field the issue refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::MissingField { field, .. } => *field,
            ValidationIssue::InvalidPhone => "phone",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { message, .. } => f.write_str(message),
            ValidationIssue::InvalidPhone => f.write_str("Некорректный номер телефона"),
        }
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Request used a method other than POST.
    MethodNotAllowed,
    /// `form_type` was missing or not one of the known forms.
    UnknownFormType,
    /// One or more required fields failed validation.
    Validation(Vec<ValidationIssue>),
    /// The mail transport failed or timed out. Carries the transport detail.
    MailDispatch(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnknownFormType | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MailDispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent to the caller. Infrastructure detail never leaves the server.
    pub fn to_response_body(&self) -> SubmissionResponse {
        match self {
            AppError::MethodNotAllowed => SubmissionResponse::failure(METHOD_NOT_ALLOWED_MESSAGE),
            AppError::UnknownFormType => SubmissionResponse::with_errors(
                VALIDATION_FAILED_MESSAGE,
                vec![UNKNOWN_FORM_TYPE_MESSAGE.to_string()],
            ),
            AppError::Validation(issues) => SubmissionResponse::with_errors(
                VALIDATION_FAILED_MESSAGE,
                issues.iter().map(ToString::to_string).collect(),
            ),
            AppError::MailDispatch(_) => SubmissionResponse::failure(DISPATCH_FAILED_MESSAGE),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::UnknownFormType => write!(f, "Unknown form type"),
            AppError::Validation(issues) => {
                let fields: Vec<&str> = issues.iter().map(ValidationIssue::field).collect();
                write!(f, "Validation failed: {}", fields.join(", "))
            }
            AppError::MailDispatch(detail) => write!(f, "Mail dispatch failed: {}", detail),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to its status code and JSON body.
    /// Input errors are logged at warn, infrastructure errors at error.
    fn into_response(self) -> Response {
        match &self {
            AppError::MethodNotAllowed | AppError::UnknownFormType | AppError::Validation(_) => {
                tracing::warn!("Rejected submission: {}", self);
            }
            AppError::MailDispatch(_) => {
                tracing::error!("Submission failed: {}", self);
            }
        }

        json_response(self.status(), self.to_response_body())
    }
}

/// Builds a JSON response with an explicit UTF-8 charset.
pub fn json_response(status: StatusCode, body: SubmissionResponse) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    response
}
