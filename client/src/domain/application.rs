//! Submitted applications, draft answers, and uploaded document references.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IdentityId, OpportunityId};

/// Remote-assigned identifier of a submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Wrap a remote identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for ApplicationId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status set by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    /// Awaiting review.
    #[default]
    Pending,
    /// Being reviewed.
    #[serde(rename = "Under Review")]
    UnderReview,
    /// Shortlisted for the next stage.
    Shortlisted,
    /// Accepted.
    Accepted,
    /// Rejected.
    Rejected,
}

impl ApplicationStatus {
    /// Wire label of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "Under Review",
            Self::Shortlisted => "Shortlisted",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        [
            Self::Pending,
            Self::UnderReview,
            Self::Shortlisted,
            Self::Accepted,
            Self::Rejected,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| format!("unknown application status: {raw}"))
    }
}

/// One question with the applicant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSlot {
    /// Prompt text, copied from the opportunity.
    pub question: String,
    /// Answer text; empty until the applicant fills it in.
    pub answer: String,
}

impl AnswerSlot {
    /// Empty slot for `question`.
    pub fn blank(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
        }
    }

    /// Whether the answer carries non-whitespace text.
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// Pointer to a file held by the remote object store.
///
/// Serialises in the shape the application ledger expects inside the
/// `documents` array, so a reference returned by an upload is submitted
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Human-readable file name.
    pub name: String,
    /// Storage-provider object key.
    #[serde(rename = "firebaseName", default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// Durable retrieval URL.
    #[serde(rename = "downloadURL")]
    pub url: String,
    /// When the upload completed.
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

/// Application record held by the remote ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Record identifier.
    pub id: ApplicationId,
    /// Opportunity applied for.
    pub opportunity_id: OpportunityId,
    /// Applicant, when the ledger reports one.
    pub applicant_id: Option<IdentityId>,
    /// Title of the opportunity, when the ledger expands it.
    pub opportunity_title: Option<String>,
    /// Ordered answers.
    pub answers: Vec<AnswerSlot>,
    /// Attached documents.
    pub documents: Vec<DocumentReference>,
    /// Review status.
    pub status: ApplicationStatus,
    /// Submission time, when reported.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Whether this record blocks `applicant` from applying to `opportunity`.
    ///
    /// Records without an applicant belong to the caller's own list and
    /// always match.
    pub fn blocks(&self, opportunity: &OpportunityId, applicant: Option<&IdentityId>) -> bool {
        if &self.opportunity_id != opportunity {
            return false;
        }
        match (&self.applicant_id, applicant) {
            (Some(owner), Some(current)) => owner == current,
            _ => true,
        }
    }
}

/// Payload posted to the application ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    /// Opportunity applied for.
    pub opportunity_id: OpportunityId,
    /// Ordered answers.
    pub answers: Vec<AnswerSlot>,
    /// Uploaded documents.
    pub documents: Vec<DocumentReference>,
}
