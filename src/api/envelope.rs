use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SessionError};

/// The backend wraps every answer as `{"success": bool, "data": {...}, "errors": {...}}`.
/// Bodies without a `success` key are taken as bare data.
fn split_envelope(body: Value) -> (Option<bool>, Value, Value) {
    match body {
        Value::Object(mut map) if map.contains_key("success") => {
            let success = map.get("success").and_then(Value::as_bool);
            let data = map.remove("data").unwrap_or(Value::Null);
            let errors = map.remove("errors").unwrap_or(Value::Null);
            (success, data, errors)
        }
        other => (None, other.clone(), other),
    }
}

/// Best human-readable message in an `errors` payload.
fn error_message(errors: &Value) -> Option<String> {
    match errors {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!map.is_empty()).then(|| errors.to_string())),
        _ => None,
    }
}

/// Reads a response body and unwraps its `data`.
///
/// A 401 on a request that carried the bearer token is reported as
/// `AuthorizationExpired`; every other failure as `BackendRejected`.
pub async fn read_envelope<T: DeserializeOwned>(response: Response, authorized: bool) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    let parsed = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str::<Value>(&body).unwrap_or_else(|_| Value::String(body.clone()))
    };
    let (success, data, errors) = split_envelope(parsed);

    if status.is_success() && success != Some(false) {
        return serde_json::from_value(data).map_err(|e| {
            SessionError::MalformedResponse(format!("unexpected {} body: {}", status.as_u16(), e))
        });
    }

    let message = error_message(&errors).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });
    debug!(status = status.as_u16(), message = message.as_str(), "backend returned an error");

    if status == StatusCode::UNAUTHORIZED && authorized {
        Err(SessionError::AuthorizationExpired(message))
    } else {
        Err(SessionError::BackendRejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_success_envelope() {
        let (success, data, errors) = split_envelope(json!({
            "success": true,
            "data": {"access_token": "abc"},
            "errors": {}
        }));
        assert_eq!(success, Some(true));
        assert_eq!(data["access_token"], "abc");
        assert_eq!(errors, json!({}));
    }

    #[test]
    fn test_bare_body_is_data() {
        let (success, data, _) = split_envelope(json!({"access_token": "abc"}));
        assert_eq!(success, None);
        assert_eq!(data["access_token"], "abc");
    }

    #[test]
    fn test_error_message_prefers_error_key() {
        assert_eq!(
            error_message(&json!({"error": "Incorrect password"})).as_deref(),
            Some("Incorrect password")
        );
        assert_eq!(
            error_message(&json!({"message": "Refresh token expired"})).as_deref(),
            Some("Refresh token expired")
        );
        assert_eq!(error_message(&json!({})), None);
        assert_eq!(error_message(&Value::Null), None);
        assert_eq!(error_message(&json!("Forbidden")).as_deref(), Some("Forbidden"));
    }
}
