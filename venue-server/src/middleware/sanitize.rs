//! JSON body sanitizer
//!
//! Runs before routing on every `application/json` request. Strings lose
//! control characters (tab and newline survive) and angle brackets and are
//! trimmed. Object keys starting with `$` are dropped. Values under a
//! `password` key pass through byte-for-byte.

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::Response,
};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use shared::error::AppError;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const UNTOUCHED_KEYS: &[&str] = &["password"];

pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !key.starts_with('$'))
                .map(|(key, value)| {
                    if UNTOUCHED_KEYS.contains(&key.as_str()) {
                        (key, value)
                    } else {
                        (key, sanitize_value(value))
                    }
                })
                .collect(),
        ),
        other => other,
    }
}

fn sanitize_str(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();
    cleaned.trim().to_string()
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/json")
        })
}

/// Replace a JSON body with its sanitized form
pub async fn sanitize_json_body(request: Request, next: Next) -> Result<Response, AppError> {
    if !is_json(&request) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::payload_too_large(MAX_BODY_BYTES))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await);
    }

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;
    let sanitized = serde_json::to_vec(&sanitize_value(value))
        .map_err(|e| AppError::internal(format!("Failed to re-encode body: {e}")))?;

    parts.headers.remove(CONTENT_LENGTH);
    Ok(next
        .run(Request::from_parts(parts, Body::from(sanitized)))
        .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_tags_and_control_characters() {
        let value = sanitize_value(json!({
            "customerName": "  <script>alert(1)</script>Ana\u{0000}\u{0007} ",
            "specialInstructions": "no onions\n\textra\u{001b}[31m sauce",
        }));
        assert_eq!(value["customerName"], "scriptalert(1)/scriptAna");
        assert_eq!(value["specialInstructions"], "no onions\n\textra[31m sauce");
    }

    #[test]
    fn test_drops_dollar_keys_at_every_depth() {
        let value = sanitize_value(json!({
            "$where": "1 == 1",
            "email": {"$ne": null},
            "items": [{"name": "Tea", "$gt": ""}],
        }));
        assert!(value.get("$where").is_none());
        assert_eq!(value["email"], json!({}));
        assert_eq!(value["items"][0], json!({"name": "Tea"}));
    }

    #[test]
    fn test_password_left_intact() {
        let raw = "  <p@ss>\u{0001}word ";
        let value = sanitize_value(json!({"email": " A@B.test ", "password": raw}));
        assert_eq!(value["password"], raw);
        assert_eq!(value["email"], "A@B.test");
    }

    #[test]
    fn test_non_string_values_unchanged() {
        let input = json!({"price": 3.5, "quantity": 2, "paid": false, "note": null});
        assert_eq!(sanitize_value(input.clone()), input);
    }
}
