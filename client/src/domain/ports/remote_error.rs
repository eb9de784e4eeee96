//! Failure shared by every port backed by the remote portal service.

use std::collections::BTreeMap;

use serde_json::json;

use super::define_port_error;
use crate::domain::{Error, ErrorCode};

define_port_error! {
    /// Errors surfaced while calling the remote service.
    pub enum RemoteCallError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "remote transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "remote call timed out: {message}",
        /// The bearer token was missing, invalid, or expired.
        Unauthorized { message: String } =>
            "{message}",
        /// The remote answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "{message}",
        /// The remote reported field-level problems.
        FieldErrors { message: String, fields: BTreeMap<String, String> } =>
            "{message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "remote response decode failed: {message}",
        /// The adapter refused to build the request.
        InvalidRequest { message: String } =>
            "remote request invalid: {message}",
    }
}

impl RemoteCallError {
    /// Whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Rejected { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Whether the session must be expired in response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message the remote provided, when it provided one.
    ///
    /// Transport-level failures have no remote message.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message }
            | Self::Rejected { message, .. }
            | Self::FieldErrors { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Translate into a domain [`Error`] with `code`.
    ///
    /// The remote message is preferred; `fallback` is used for transport-level
    /// failures and blank remote messages. Field errors and status codes are
    /// kept in the details.
    pub fn to_domain_error(&self, code: ErrorCode, fallback: &str) -> Error {
        let message = self
            .remote_message()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback);
        let error = Error::new(code, message);
        match self {
            Self::FieldErrors { fields, .. } => error.with_details(json!({ "fields": fields })),
            Self::Rejected { status, .. } => error.with_details(json!({ "status": status })),
            Self::Transport { message }
            | Self::Timeout { message }
            | Self::Decode { message }
            | Self::InvalidRequest { message } => error.with_details(json!({ "cause": message })),
            Self::Unauthorized { .. } => error,
        }
    }
}
