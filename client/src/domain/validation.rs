//! Completeness checks run before an application is submitted.

use std::fmt;

use serde_json::json;

use super::{AnswerSlot, DocumentReference, Error, ErrorCode};

/// One problem found while validating a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The answer at `index` is blank.
    RequiredAnswer {
        /// Zero-based question index.
        index: usize,
        /// Prompt text.
        question: String,
    },
    /// Required documents not covered by any upload, in declaration order.
    MissingDocuments {
        /// Names of the uncovered requirements.
        missing: Vec<String>,
    },
}

impl ValidationIssue {
    /// Error code matching the issue.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::RequiredAnswer { .. } => ErrorCode::RequiredAnswer,
            Self::MissingDocuments { .. } => ErrorCode::MissingDocuments,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredAnswer { .. } => write!(f, "This question is required"),
            Self::MissingDocuments { missing } => {
                write!(f, "Missing required documents: {}", missing.join(", "))
            }
        }
    }
}

impl From<&ValidationIssue> for Error {
    fn from(issue: &ValidationIssue) -> Self {
        let details = match issue {
            ValidationIssue::RequiredAnswer { index, question } => {
                json!({ "index": index, "question": question })
            }
            ValidationIssue::MissingDocuments { missing } => json!({ "missing": missing }),
        };
        Self::new(issue.code(), issue.to_string()).with_details(details)
    }
}

/// Summarise a non-empty issue list as a single validation [`Error`].
pub fn issues_to_error(issues: &[ValidationIssue]) -> Error {
    let rendered: Vec<_> = issues
        .iter()
        .map(|issue| {
            let error = Error::from(issue);
            json!({
                "code": error.code(),
                "message": error.message(),
                "details": error.details(),
            })
        })
        .collect();
    Error::validation("application is incomplete").with_details(json!({ "issues": rendered }))
}

fn stem(name: &str) -> String {
    let lowered = name.to_lowercase();
    match lowered.rsplit_once('.') {
        Some((head, extension)) if !extension.is_empty() && !extension.contains('/') => {
            head.to_owned()
        }
        _ => lowered,
    }
}

/// Whether an uploaded file name satisfies a required document name.
///
/// The extension of the uploaded name is dropped and both sides are
/// lowercased; either containing the other counts as a match. An upload
/// whose stem is empty matches nothing.
///
/// # Examples
/// ```
/// use portal_client::domain::document_satisfies;
///
/// assert!(document_satisfies("CV.pdf", "CV"));
/// assert!(document_satisfies("id", "Certified ID copy"));
/// assert!(!document_satisfies("transcript.pdf", "CV"));
/// ```
pub fn document_satisfies(uploaded: &str, required: &str) -> bool {
    let uploaded_stem = stem(uploaded);
    if uploaded_stem.is_empty() {
        return false;
    }
    let required_lower = required.to_lowercase();
    uploaded_stem.contains(&required_lower) || required_lower.contains(&uploaded_stem)
}

/// Required document names with no matching upload, in declaration order.
pub fn missing_documents(required: &[String], uploaded: &[DocumentReference]) -> Vec<String> {
    required
        .iter()
        .filter(|needed| {
            !uploaded
                .iter()
                .any(|document| document_satisfies(&document.name, needed))
        })
        .cloned()
        .collect()
}

/// Validate a draft.
///
/// Yields one [`ValidationIssue::RequiredAnswer`] per blank answer in
/// question order, then at most one aggregated
/// [`ValidationIssue::MissingDocuments`].
pub fn validate_draft(
    answers: &[AnswerSlot],
    required_documents: &[String],
    uploaded: &[DocumentReference],
) -> Vec<ValidationIssue> {
    let mut issues: Vec<_> = answers
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.is_answered())
        .map(|(index, slot)| ValidationIssue::RequiredAnswer {
            index,
            question: slot.question.clone(),
        })
        .collect();

    let missing = missing_documents(required_documents, uploaded);
    if !missing.is_empty() {
        issues.push(ValidationIssue::MissingDocuments { missing });
    }
    issues
}
