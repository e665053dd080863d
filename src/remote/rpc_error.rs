use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{
    already_exists, deadline_exceeded, internal_error, invalid_argument, not_found,
    permission_denied, resource_exhausted, unauthenticated, unavailable, FirestoreError,
};

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub(crate) fn map_http_error(status: StatusCode, body: &str) -> FirestoreError {
    let message = extract_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());
    match status {
        StatusCode::BAD_REQUEST => invalid_argument(message),
        StatusCode::UNAUTHORIZED => unauthenticated(message),
        StatusCode::FORBIDDEN => permission_denied(message),
        StatusCode::NOT_FOUND => not_found(message),
        StatusCode::CONFLICT => already_exists(message),
        StatusCode::TOO_MANY_REQUESTS => resource_exhausted(message),
        StatusCode::SERVICE_UNAVAILABLE => unavailable(message),
        StatusCode::GATEWAY_TIMEOUT => deadline_exceeded(message),
        StatusCode::REQUEST_TIMEOUT => deadline_exceeded(message),
        StatusCode::PRECONDITION_FAILED => invalid_argument(message),
        StatusCode::INTERNAL_SERVER_ERROR => internal_error(message),
        StatusCode::BAD_GATEWAY => unavailable(message),
        other => map_status_from_payload(other, &message, body),
    }
}

fn map_status_from_payload(
    status: StatusCode,
    fallback_message: &str,
    body: &str,
) -> FirestoreError {
    if let Some(payload) = extract_error_payload(body) {
        if let Some(status_string) = payload.status.as_deref() {
            return map_status_code(
                status_string,
                payload.message.as_deref().unwrap_or(fallback_message),
            );
        }
    }

    if status.is_client_error() {
        invalid_argument(fallback_message.to_string())
    } else {
        internal_error(fallback_message.to_string())
    }
}

fn map_status_code(status: &str, message: &str) -> FirestoreError {
    match status {
        "INVALID_ARGUMENT" => invalid_argument(message.to_string()),
        "FAILED_PRECONDITION" => invalid_argument(message.to_string()),
        "OUT_OF_RANGE" => invalid_argument(message.to_string()),
        "UNAUTHENTICATED" => unauthenticated(message.to_string()),
        "PERMISSION_DENIED" => permission_denied(message.to_string()),
        "NOT_FOUND" => not_found(message.to_string()),
        "ALREADY_EXISTS" => already_exists(message.to_string()),
        "RESOURCE_EXHAUSTED" => resource_exhausted(message.to_string()),
        "UNAVAILABLE" => unavailable(message.to_string()),
        "DEADLINE_EXCEEDED" => deadline_exceeded(message.to_string()),
        other => internal_error(format!("Unhandled error status: {other} ({message})")),
    }
}

fn extract_message(body: &str) -> Option<String> {
    extract_error_payload(body)
        .and_then(|payload| payload.message)
        .filter(|message| !message.is_empty())
}

fn extract_error_payload(body: &str) -> Option<GoogleError> {
    serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
}
