//! Domain-level error types.
//!
//! These errors are transport agnostic. Presentation layers render them as
//! inline messages, banners, or redirects; outbound adapters never construct
//! them directly but report [`RemoteCallError`](super::ports::RemoteCallError)
//! values that services translate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Credentials were rejected, the session is missing, or the token expired.
    Auth,
    /// Field-level input problems, reported locally or by the remote service.
    Validation,
    /// The applicant already holds an application for the opportunity.
    AlreadyApplied,
    /// The opportunity deadline has passed.
    DeadlineExpired,
    /// A selected file exceeds the ceiling for its upload context.
    FileTooLarge,
    /// A selected file type is not accepted for its upload context.
    UnsupportedType,
    /// Transport or remote failure while uploading a file.
    Upload,
    /// Required documents are not covered by the uploaded set.
    MissingDocuments,
    /// A question was left unanswered.
    RequiredAnswer,
    /// Network or remote failure on a read operation.
    Fetch,
    /// Network or remote failure on the final application submission.
    Submit,
    /// The requested composer transition is not permitted from its state.
    InvalidState,
    /// Local failure such as unreadable durable storage.
    Internal,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use portal_client::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::DeadlineExpired, "applications closed");
/// assert_eq!(err.code(), ErrorCode::DeadlineExpired);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    EmptyMessage,
}

impl std::fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// # Panics
    ///
    /// Panics when `message` is blank. Call sites pass literals or
    /// formatted text that always carries content.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message suitable for display.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use portal_client::domain::{Error, ErrorCode};
    /// use serde_json::json;
    ///
    /// let err = Error::validation("bad email").with_details(json!({ "field": "email" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::Auth`].
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Auth, message)
    }

    /// Convenience constructor for [`ErrorCode::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Convenience constructor for [`ErrorCode::AlreadyApplied`].
    pub fn already_applied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyApplied, message)
    }

    /// Convenience constructor for [`ErrorCode::DeadlineExpired`].
    pub fn deadline_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeadlineExpired, message)
    }

    /// Convenience constructor for [`ErrorCode::FileTooLarge`].
    pub fn file_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FileTooLarge, message)
    }

    /// Convenience constructor for [`ErrorCode::UnsupportedType`].
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedType, message)
    }

    /// Convenience constructor for [`ErrorCode::Upload`].
    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Upload, message)
    }

    /// Convenience constructor for [`ErrorCode::MissingDocuments`].
    pub fn missing_documents(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingDocuments, message)
    }

    /// Convenience constructor for [`ErrorCode::RequiredAnswer`].
    pub fn required_answer(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequiredAnswer, message)
    }

    /// Convenience constructor for [`ErrorCode::Fetch`].
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Fetch, message)
    }

    /// Convenience constructor for [`ErrorCode::Submit`].
    pub fn submit(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Submit, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}
