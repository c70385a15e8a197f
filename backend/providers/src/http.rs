//! Shared reqwest plumbing: client construction and reply reconciliation.
//!
//! Every service speaks JSON and reports failures either through the HTTP
//! status, through an `{ "error": ... }` payload, or through an
//! `{ "message": ... }` payload. Non-2xx replies become `Status` (message
//! from the payload when there is one), error payloads on a 2xx become
//! `Upstream`, and unparseable bodies become `Malformed`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use studio_core::{StudioError, StudioResult};
use tracing::debug;

use logging::redact_sensitive_data;

/// Build a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> StudioResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure to the transport side of the taxonomy.
pub fn map_send_error(err: reqwest::Error, timeout: Duration) -> StudioError {
    if err.is_timeout() {
        StudioError::Timeout(timeout)
    } else {
        StudioError::Transport(redact_sensitive_data(&err.to_string()))
    }
}

/// Pull a human-readable message out of an error payload, if there is one.
///
/// Accepts `{ "error": "msg" }`, `{ "error": { "message": "msg" } }` and
/// `{ "message": "msg" }`.
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(msg)) if !msg.is_empty() => return Some(msg.clone()),
        Some(Value::Object(obj)) => {
            if let Some(Value::String(msg)) = obj.get("message") {
                return Some(msg.clone());
            }
        }
        _ => {}
    }
    match body.get("message") {
        Some(Value::String(msg)) if !msg.is_empty() => Some(msg.clone()),
        _ => None,
    }
}

/// Read a JSON reply, turning every failure shape into a `StudioError`.
///
/// A 2xx reply whose body still carries an `error` field is an error: html
/// and error are never both reported.
pub async fn read_json(response: Response, timeout: Duration) -> StudioResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| map_send_error(e, timeout))?;
    let parsed = serde_json::from_str::<Value>(&text);

    if !status.is_success() {
        let structured = parsed.as_ref().ok().and_then(error_message);
        debug!(status = %status, structured = structured.is_some(), "Upstream returned an error status");
        let message = structured.unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("request failed with status {} ({reason})", status.as_u16()),
            None => format!("request failed with status {}", status.as_u16()),
        });
        return Err(StudioError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body = parsed.map_err(|e| StudioError::Malformed(e.to_string()))?;
    if let Some(err) = body.get("error").filter(|v| !v.is_null()) {
        let message = error_message(&body).unwrap_or_else(|| err.to_string());
        return Err(StudioError::Upstream(message));
    }
    Ok(body)
}

/// Extract a required string field from a success body.
pub fn string_field(body: &Value, field: &str) -> StudioResult<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StudioError::Malformed(format!("response has no '{field}' string field")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_shapes() {
        assert_eq!(error_message(&json!({"error": "bad"})).as_deref(), Some("bad"));
        assert_eq!(
            error_message(&json!({"error": {"message": "quota", "type": "insufficient_quota"}}))
                .as_deref(),
            Some("quota")
        );
        assert_eq!(
            error_message(&json!({"message": "Unauthorized"})).as_deref(),
            Some("Unauthorized")
        );
        assert_eq!(error_message(&json!({"html": "<p/>"})), None);
    }

    #[test]
    fn string_field_requires_string() {
        let body = json!({"html": "<p>hi</p>", "count": 3});
        assert_eq!(string_field(&body, "html").unwrap(), "<p>hi</p>");
        assert!(matches!(
            string_field(&body, "count"),
            Err(StudioError::Malformed(_))
        ));
    }
}
