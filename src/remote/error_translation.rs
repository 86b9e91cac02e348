//! Translation of failed HTTP calls into one human-readable message
//!
//! Known status codes map to fixed messages regardless of the body. Other
//! codes fall back to `result.error`, then `result.status_message`, then the
//! raw transport message.

use crate::core::error::PublishError;
use serde::Deserialize;

/// Fixed message for a well-known status code
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("The user credentials are incorrect."),
        403 => Some("Forbidden. The user is not an admin or does not have the CICD role."),
        404 => Some("Not found. The requested item was not found."),
        405 => Some("Invalid method. The functionality is disabled."),
        409 => Some("Conflict. The requested item is not unique."),
        500 => Some(
            "Internal server error. An unexpected error occurred while processing the request.",
        ),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    result: ErrorResult,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

/// Build the error for a non-2xx response
///
/// `fallback` is the transport-level description of the failure
/// (e.g. "HTTP status client error (418 I'm a teapot)").
pub fn translate(status: u16, body: &str, fallback: &str) -> PublishError {
    let message = match status_message(status) {
        Some(fixed) => fixed.to_string(),
        None => {
            let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
            let result = envelope.result;
            result
                .error
                .filter(|m| !m.is_empty())
                .or(result.status_message.filter(|m| !m.is_empty()))
                .unwrap_or_else(|| fallback.to_string())
        }
    };

    PublishError::Remote {
        status: Some(status),
        message,
    }
}
