use crate::config::Config;
use crate::errors::{
    json_response, AppError, PAYLOAD_TOO_LARGE_MESSAGE, TOO_MANY_REQUESTS_MESSAGE,
};
use crate::models::{FieldMap, RequesterInfo, SubmissionResponse};
use crate::submission::LeadSubmitter;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Stateless lead pipeline shared by all requests.
    pub submitter: LeadSubmitter,
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /send_form.php, POST /api/v1/leads
///
/// Accepts a lead from any of the site's forms. The body is decoded here,
/// everything else is re-validated by the submitter.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `connect_info` - Peer address, when the server was started with connect info.
/// * `headers` - Request headers (for the user agent).
/// * `body` - Raw request body, JSON or form-encoded.
///
/// # Returns
///
/// * `Result<Response, AppError>` - 200 with a success message, or the mapped error.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let fields = decode_fields(&body);
    let requester = RequesterInfo {
        ip: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    tracing::info!("Received lead submission ({} fields)", fields.len());

    let receipt = state.submitter.submit(&fields, &requester).await?;

    tracing::info!(
        "✅ Lead {} accepted ({})",
        receipt.submission_id,
        receipt.lead.form_type()
    );

    Ok(json_response(
        StatusCode::OK,
        SubmissionResponse::ok(receipt.message),
    ))
}

/// Fallback for every non-POST method on the submission routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Rewrites the plain-text rejections of the body limit and the rate limiter
/// into the JSON shape the site's forms parse.
pub async fn json_rejections(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => PAYLOAD_TOO_LARGE_MESSAGE,
        StatusCode::TOO_MANY_REQUESTS => TOO_MANY_REQUESTS_MESSAGE,
        _ => return response,
    };

    tracing::warn!("Rejected submission: {}", response.status());
    json_response(response.status(), SubmissionResponse::failure(message))
}

/// Decodes the request body into a flat field map.
///
/// JSON object first; if that fails or yields nothing, the body is read as
/// `application/x-www-form-urlencoded`.
pub fn decode_fields(body: &[u8]) -> FieldMap {
    let fields = decode_json(body);
    if !fields.is_empty() {
        return fields;
    }

    url::form_urlencoded::parse(body).into_owned().collect()
}

fn decode_json(body: &[u8]) -> FieldMap {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
            .collect(),
        _ => FieldMap::new(),
    }
}

/// Nested values and null are not lead fields and are dropped.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
