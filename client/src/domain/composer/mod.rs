//! Application composer: the workflow that drafts and submits one application.
//!
//! Transitions take `&mut self`, so one composer never runs two at once.
//! Uploads are processed sequentially in selection order. The duplicate and
//! deadline checks made when a draft opens are advisory; the ledger
//! re-validates both on submission.

mod state;

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use super::ports::{ApplicationLedger, DocumentStorage, RemoteCallError};
use super::{
    Application, ApplicationSubmission, AuthToken, DocumentReference, Error, ErrorCode,
    IdempotencyKey, Opportunity, SessionStore, UploadContext, UploadFile, ValidationIssue,
    check_upload, issues_to_error, rejection_to_error, validate_draft,
};

pub use state::{ComposerState, Draft, UploadReport};

/// Drafts, validates, and submits an application for one opportunity.
pub struct ApplicationComposer<L, D> {
    ledger: Arc<L>,
    storage: Arc<D>,
    session: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    state: ComposerState,
    draft: Option<Draft>,
    key: IdempotencyKey,
}

impl<L, D> ApplicationComposer<L, D> {
    /// Create an idle composer with a fresh idempotency key.
    pub fn new(
        ledger: Arc<L>,
        storage: Arc<D>,
        session: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            storage,
            session,
            clock,
            state: ComposerState::Idle,
            draft: None,
            key: IdempotencyKey::random(),
        }
    }

    /// Reuse a key saved from an earlier composer, so a submission whose
    /// outcome was never seen is deduplicated after a restart.
    #[must_use]
    pub fn with_key(mut self, key: IdempotencyKey) -> Self {
        self.key = key;
        self
    }

    /// Current state.
    ///
    /// After an upload or submission future is dropped before completing,
    /// this still reports the interrupted step; the next call that needs the
    /// draft reopens it.
    pub const fn state(&self) -> &ComposerState {
        &self.state
    }

    /// Open draft, if any.
    pub const fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Key sent with every submission attempt from this composer.
    pub const fn idempotency_key(&self) -> &IdempotencyKey {
        &self.key
    }

    /// Select `opportunity` and open a draft.
    ///
    /// `existing` is the caller's cached application list. Opening fails with
    /// [`ErrorCode::AlreadyApplied`] when it already holds an application for
    /// this opportunity, and with [`ErrorCode::DeadlineExpired`] once the
    /// deadline has passed. A failed check leaves the composer idle.
    pub fn begin(&mut self, opportunity: Opportunity, existing: &[Application]) -> Result<(), Error> {
        self.expect_state("select an opportunity", |state| {
            matches!(state, ComposerState::Idle)
        })?;

        let applicant = self.session.view().identity().map(|identity| identity.id);
        if existing
            .iter()
            .any(|application| application.blocks(&opportunity.id, applicant.as_ref()))
        {
            return Err(Error::already_applied("You have already applied for this opportunity")
                .with_details(json!({ "opportunityId": opportunity.id.as_ref() })));
        }

        let now = self.clock.utc();
        if !opportunity.is_open_at(now) {
            return Err(Error::deadline_expired(format!(
                "Applications for {} closed on {}",
                opportunity.title,
                opportunity.deadline.format("%Y-%m-%d")
            )));
        }

        debug!(opportunity_id = %opportunity.id, questions = opportunity.questions.len(), "draft opened");
        self.draft = Some(Draft::open(opportunity));
        self.transition(ComposerState::Drafting);
        Ok(())
    }

    /// Set the answer at `index`.
    pub fn answer(&mut self, index: usize, text: impl Into<String>) -> Result<(), Error> {
        let draft = self.drafting_mut("answer a question")?;
        let count = draft.answers.len();
        let Some(slot) = draft.answers.get_mut(index) else {
            return Err(Error::validation(format!(
                "question {index} does not exist; the form has {count}"
            )));
        };
        slot.answer = text.into();
        if slot.is_answered() {
            draft.issues.retain(|issue| {
                !matches!(issue, ValidationIssue::RequiredAnswer { index: stale, .. } if *stale == index)
            });
        }
        Ok(())
    }

    /// Drop the uploaded document at `index` from the draft.
    ///
    /// The stored file is not deleted remotely.
    pub fn remove_document(&mut self, index: usize) -> Result<DocumentReference, Error> {
        let draft = self.drafting_mut("remove a document")?;
        if index >= draft.documents.len() {
            return Err(Error::validation(format!("document {index} does not exist")));
        }
        let removed = draft.documents.remove(index);
        warn!(document = %removed.name, "document removed from draft; stored file left behind");
        Ok(removed)
    }

    /// Reopen the draft after a failure, keeping answers and uploads.
    ///
    /// Also reopens a draft whose upload or submission was abandoned
    /// mid-call. The idempotency key is unchanged, so resubmitting after an
    /// abandoned submission cannot create a second application.
    pub fn retry(&mut self) -> Result<(), Error> {
        if self.resume_interrupted() {
            return Ok(());
        }
        self.expect_state("retry", |state| matches!(state, ComposerState::Failed(_)))?;
        self.transition(ComposerState::Drafting);
        Ok(())
    }

    /// Close the composer, discarding the draft.
    ///
    /// Returns the references that were uploaded but never submitted. They
    /// stay in remote storage.
    pub fn cancel(self) -> Vec<DocumentReference> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        let orphans = self
            .draft
            .map(|draft| draft.documents)
            .unwrap_or_default();
        if !orphans.is_empty() {
            warn!(
                count = orphans.len(),
                state = self.state.name(),
                "composer cancelled with unsubmitted uploads"
            );
        }
        orphans
    }

    fn transition(&mut self, next: ComposerState) {
        debug!(from = self.state.name(), to = next.name(), "composer transition");
        self.state = next;
    }

    fn fail(&mut self, error: Error) -> Error {
        self.transition(ComposerState::Failed(error.clone()));
        error
    }

    fn expect_state(
        &self,
        action: &str,
        allowed: impl FnOnce(&ComposerState) -> bool,
    ) -> Result<(), Error> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(Error::invalid_state(format!(
                "cannot {action} while {}",
                self.state.name()
            )))
        }
    }

    /// Return to drafting when a previous call was dropped mid-flight.
    ///
    /// Holding `&mut self` means no other call is running, so an in-flight
    /// state seen here was abandoned.
    fn resume_interrupted(&mut self) -> bool {
        if !self.state.is_in_flight() || self.draft.is_none() {
            return false;
        }
        warn!(state = self.state.name(), "previous call was abandoned; reopening draft");
        self.transition(ComposerState::Drafting);
        true
    }

    fn drafting_mut(&mut self, action: &str) -> Result<&mut Draft, Error> {
        self.resume_interrupted();
        self.expect_state(action, |state| matches!(state, ComposerState::Drafting))?;
        self.draft
            .as_mut()
            .ok_or_else(|| Error::internal("drafting without a draft"))
    }

    fn token(&self) -> Result<AuthToken, Error> {
        self.session
            .view()
            .bearer_token()
            .ok_or_else(|| Error::auth("Sign in to apply"))
    }
}

impl<L, D> ApplicationComposer<L, D>
where
    L: ApplicationLedger,
    D: DocumentStorage,
{
    /// Upload `files` one at a time, in order.
    ///
    /// Each success is appended to the draft. A failing file is reported and
    /// the batch continues with the next one. A rejected token expires the
    /// session and fails the composer, leaving the rest unattempted.
    pub async fn upload_documents(&mut self, files: Vec<UploadFile>) -> Result<UploadReport, Error> {
        let opportunity_id = self.drafting_mut("upload documents")?.opportunity.id.clone();
        let token = self.token()?;
        let context = UploadContext::ApplicationDocument { opportunity_id };
        let mut report = UploadReport::default();
        let total = files.len();

        for (position, file) in files.into_iter().enumerate() {
            self.transition(ComposerState::Uploading {
                remaining: total.saturating_sub(position),
            });
            match self.upload_one(&token, &file, &context).await {
                Ok(reference) => {
                    if let Some(draft) = self.draft.as_mut() {
                        draft.documents.push(reference.clone());
                    }
                    report.uploaded.push(reference);
                }
                Err(UploadFailure::SessionExpired(error)) => {
                    report.failed.push((file.file_name, error.clone()));
                    return Err(self.fail(error));
                }
                Err(UploadFailure::File(error)) => {
                    warn!(file = %file.file_name, error = %error, "document upload failed");
                    report.failed.push((file.file_name, error));
                }
            }
        }

        self.transition(ComposerState::Drafting);
        Ok(report)
    }

    async fn upload_one(
        &self,
        token: &AuthToken,
        file: &UploadFile,
        context: &UploadContext,
    ) -> Result<DocumentReference, UploadFailure> {
        check_upload(context, file)
            .map_err(|rejection| UploadFailure::File(rejection_to_error(context, file, &rejection)))?;
        self.storage
            .upload(token, file, context)
            .await
            .map_err(|error| {
                let mapped =
                    error.to_domain_error(ErrorCode::Upload, &format!("Failed to upload {}", file.file_name));
                if self.session.expire_on_unauthorized(&error) {
                    UploadFailure::SessionExpired(mapped)
                } else {
                    UploadFailure::File(mapped)
                }
            })
    }

    /// Validate the draft and, when complete, submit it.
    ///
    /// Validation problems return the composer to drafting with the issues
    /// attached to the draft. Remote failures leave it in
    /// [`ComposerState::Failed`], preferring the ledger's own message.
    pub async fn submit(&mut self) -> Result<Application, Error> {
        self.drafting_mut("submit")?;
        self.transition(ComposerState::Validating);

        let (submission, issues) = match self.draft.as_mut() {
            Some(draft) => {
                draft.issues = validate_draft(
                    &draft.answers,
                    &draft.opportunity.required_documents,
                    &draft.documents,
                );
                let submission = ApplicationSubmission {
                    opportunity_id: draft.opportunity.id.clone(),
                    answers: draft.answers.clone(),
                    documents: draft.documents.clone(),
                };
                (submission, draft.issues.clone())
            }
            None => return Err(self.fail(Error::internal("validating without a draft"))),
        };
        if !issues.is_empty() {
            debug!(issues = issues.len(), "draft incomplete");
            self.transition(ComposerState::Drafting);
            return Err(issues_to_error(&issues));
        }

        let token = match self.token() {
            Ok(token) => token,
            Err(error) => return Err(self.fail(error)),
        };
        self.transition(ComposerState::Submitting);
        match self.ledger.submit(&token, &submission, &self.key).await {
            Ok(application) => {
                info!(
                    application_id = %application.id,
                    opportunity_id = %submission.opportunity_id,
                    "application submitted"
                );
                self.transition(ComposerState::Submitted(application.clone()));
                Ok(application)
            }
            Err(error) => {
                self.session.expire_on_unauthorized(&error);
                let mapped = submission_error(&error);
                warn!(error = %error, "application submission failed");
                Err(self.fail(mapped))
            }
        }
    }
}

enum UploadFailure {
    File(Error),
    SessionExpired(Error),
}

fn submission_error(error: &RemoteCallError) -> Error {
    match error {
        RemoteCallError::Unauthorized { .. } => {
            error.to_domain_error(ErrorCode::Auth, "Your session has expired")
        }
        _ => error.to_domain_error(ErrorCode::Submit, "Failed to submit application"),
    }
}

#[cfg(test)]
mod tests;
