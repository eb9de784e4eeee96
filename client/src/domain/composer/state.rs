//! Composer states and the in-memory draft.

use super::super::{AnswerSlot, Application, DocumentReference, Error, Opportunity, ValidationIssue};

/// Where the composer is in its workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerState {
    /// No opportunity selected.
    Idle,
    /// Draft open for answers and uploads.
    Drafting,
    /// Uploading selected files one at a time.
    Uploading {
        /// Files not yet finished, including the one in flight.
        remaining: usize,
    },
    /// Checking answers and documents.
    Validating,
    /// Waiting on the ledger.
    Submitting,
    /// Ledger accepted the application. Terminal.
    Submitted(Application),
    /// Last step failed; [`retry`](super::ApplicationComposer::retry) reopens the draft.
    Failed(Error),
}

impl ComposerState {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Drafting => "drafting",
            Self::Uploading { .. } => "uploading",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Submitted(_) => "submitted",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the state only exists while a call is awaiting the remote.
    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Uploading { .. } | Self::Validating | Self::Submitting
        )
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Answers and uploads gathered for one opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub(super) opportunity: Opportunity,
    pub(super) answers: Vec<AnswerSlot>,
    pub(super) documents: Vec<DocumentReference>,
    pub(super) issues: Vec<ValidationIssue>,
}

impl Draft {
    pub(super) fn open(opportunity: Opportunity) -> Self {
        let answers = opportunity
            .questions
            .iter()
            .map(AnswerSlot::blank)
            .collect();
        Self {
            opportunity,
            answers,
            documents: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Opportunity being applied for.
    pub const fn opportunity(&self) -> &Opportunity {
        &self.opportunity
    }

    /// One slot per question, in question order.
    pub fn answers(&self) -> &[AnswerSlot] {
        &self.answers
    }

    /// Uploaded documents, in upload order.
    pub fn documents(&self) -> &[DocumentReference] {
        &self.documents
    }

    /// Problems from the last submit attempt.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

/// Per-file outcome of an upload batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    /// References appended to the draft, in selection order.
    pub uploaded: Vec<DocumentReference>,
    /// Files that failed, with the reason, in selection order.
    pub failed: Vec<(String, Error)>,
}

impl UploadReport {
    /// Whether every file was uploaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
