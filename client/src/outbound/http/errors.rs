//! Mapping from reqwest failures and error responses to `RemoteCallError`.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::RemoteCallError;

pub(super) fn map_transport_error(error: reqwest::Error) -> RemoteCallError {
    if error.is_timeout() {
        RemoteCallError::timeout(error.to_string())
    } else if error.is_decode() {
        RemoteCallError::decode(error.to_string())
    } else {
        RemoteCallError::transport(error.to_string())
    }
}

/// Translate a non-success response.
///
/// The body's `message` becomes the error message; when absent the message
/// is left blank so callers fall back to their own wording. An `errors`
/// member yields field-level errors.
pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteCallError {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default();
    debug!(status = status.as_u16(), body = %body_preview(body), "remote rejected request");

    if status == StatusCode::UNAUTHORIZED {
        return RemoteCallError::unauthorized(message);
    }

    let fields = parsed
        .as_ref()
        .and_then(|value| value.get("errors"))
        .map(field_errors)
        .unwrap_or_default();
    if !fields.is_empty() {
        return RemoteCallError::field_errors(message, fields);
    }
    RemoteCallError::rejected(status.as_u16(), message)
}

/// Accepts `{"field": "message"}` or `[{"path"|"param"|"field", "msg"|"message"}]`.
fn field_errors(errors: &Value) -> BTreeMap<String, String> {
    match errors {
        Value::Object(map) => map
            .iter()
            .filter_map(|(field, detail)| {
                let text = detail
                    .as_str()
                    .or_else(|| detail.get("message").and_then(Value::as_str))?;
                Some((field.clone(), text.to_owned()))
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let field = ["path", "param", "field"]
                    .into_iter()
                    .find_map(|key| item.get(key).and_then(Value::as_str))?;
                let text = ["msg", "message"]
                    .into_iter()
                    .find_map(|key| item.get(key).and_then(Value::as_str))?;
                Some((field.to_owned(), text.to_owned()))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for status mapping.
    use super::*;
    use rstest::rstest;

    #[test]
    fn unauthorized_keeps_the_remote_message() {
        let error = map_status_error(StatusCode::UNAUTHORIZED, br#"{"message":"Token expired"}"#);
        assert_eq!(error, RemoteCallError::unauthorized("Token expired"));
    }

    #[test]
    fn unauthorized_without_body_has_no_message() {
        let error = map_status_error(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(error, RemoteCallError::unauthorized(""));
        assert_eq!(
            error.to_domain_error(crate::domain::ErrorCode::Auth, "Login failed").message(),
            "Login failed"
        );
    }

    #[rstest]
    #[case::object(r#"{"message":"Validation failed","errors":{"email":"taken"}}"#)]
    #[case::array(r#"{"message":"Validation failed","errors":[{"path":"email","msg":"taken"}]}"#)]
    fn field_errors_are_collected(#[case] body: &str) {
        let error = map_status_error(StatusCode::BAD_REQUEST, body.as_bytes());
        assert_eq!(
            error,
            RemoteCallError::field_errors(
                "Validation failed",
                BTreeMap::from([("email".to_owned(), "taken".to_owned())])
            )
        );
    }

    #[rstest]
    #[case(StatusCode::CONFLICT, br#"{"message":"You have already applied"}"#.as_slice(), "You have already applied")]
    #[case(StatusCode::BAD_GATEWAY, b"<html>upstream</html>".as_slice(), "")]
    fn other_statuses_are_rejections(
        #[case] status: StatusCode,
        #[case] body: &[u8],
        #[case] message: &str,
    ) {
        assert_eq!(
            map_status_error(status, body),
            RemoteCallError::rejected(status.as_u16(), message)
        );
    }

    #[test]
    fn preview_is_compacted_and_truncated() {
        let body = format!("a  b\n{}", "x".repeat(200));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("a b "));
        assert!(preview.ends_with("..."));
    }
}
