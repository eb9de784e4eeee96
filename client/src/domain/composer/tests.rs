//! Composer workflow behaviour.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    ApplicationLedger, DocumentStorage, MockApplicationLedger, MockDocumentStorage,
};
use crate::domain::{
    ApplicationId, ApplicationStatus, AuthSession, Category, Funding, Identity, IdentityId,
    OpportunityId, Role, SessionState,
};
use crate::outbound::storage::InMemoryCredentialStore;
use crate::test_support::MutableClock;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0)
        .single()
        .expect("valid time")
}

fn opportunity(questions: &[&str], required: &[&str]) -> Opportunity {
    Opportunity {
        id: OpportunityId::new("opp-42").expect("id"),
        title: "Engineering Bursary".to_owned(),
        category: Category::Bursary,
        provider: "Acme Mining".to_owned(),
        field_of_study: "Engineering".to_owned(),
        location: "Johannesburg".to_owned(),
        funding: Funding::default(),
        minimum_average: Some(65),
        deadline: at(30, 0),
        questions: questions.iter().map(|q| (*q).to_owned()).collect(),
        required_documents: required.iter().map(|d| (*d).to_owned()).collect(),
        description: None,
    }
}

fn reference(name: &str) -> DocumentReference {
    DocumentReference {
        name: name.to_owned(),
        storage_key: Some(format!("uploads/{name}")),
        url: format!("https://files.example/{name}"),
        uploaded_at: at(10, 9),
    }
}

fn applicant() -> IdentityId {
    IdentityId::new("student-1").expect("id")
}

#[fixture]
fn session() -> Arc<SessionStore> {
    let store = Arc::new(SessionStore::new(Arc::new(InMemoryCredentialStore::default())));
    store.establish(AuthSession {
        identity: Identity {
            id: applicant(),
            first_name: "Naledi".to_owned(),
            last_name: "Khumalo".to_owned(),
            email: "naledi@example.com".to_owned(),
            role: Role::Standard,
            profile_photo_url: None,
        },
        token: AuthToken::new("tok-1").expect("token"),
    });
    store
}

/// Storage that echoes the file name back as a reference.
fn echo_storage() -> MockDocumentStorage {
    let mut storage = MockDocumentStorage::new();
    storage
        .expect_upload()
        .returning(|_, file, _| Ok(reference(&file.file_name)));
    storage
}

fn composer(
    ledger: MockApplicationLedger,
    storage: MockDocumentStorage,
    session: Arc<SessionStore>,
) -> ApplicationComposer<MockApplicationLedger, MockDocumentStorage> {
    ApplicationComposer::new(
        Arc::new(ledger),
        Arc::new(storage),
        session,
        Arc::new(MutableClock::new(at(15, 12))),
    )
}

fn record(opportunity_id: &str, applicant_id: Option<IdentityId>) -> Application {
    Application {
        id: ApplicationId::new("app-1"),
        opportunity_id: OpportunityId::new(opportunity_id).expect("id"),
        applicant_id,
        opportunity_title: None,
        answers: Vec::new(),
        documents: Vec::new(),
        status: ApplicationStatus::Pending,
        submitted_at: Some(at(12, 8)),
    }
}

fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, b"%PDF-1.7".to_vec())
}

#[rstest]
fn begin_opens_one_blank_slot_per_question(session: Arc<SessionStore>) {
    let mut composer = composer(MockApplicationLedger::new(), MockDocumentStorage::new(), session);
    composer
        .begin(opportunity(&["Why us?", "Your goals?"], &["CV"]), &[])
        .expect("open draft");

    assert_eq!(composer.state(), &ComposerState::Drafting);
    let draft = composer.draft().expect("draft");
    assert_eq!(draft.answers().len(), 2);
    assert!(draft.answers().iter().all(|slot| slot.answer.is_empty()));
    assert!(draft.documents().is_empty());
}

#[rstest]
#[case::own_record(Some(applicant()))]
#[case::unowned_record(None)]
fn existing_application_blocks_drafting(
    session: Arc<SessionStore>,
    #[case] owner: Option<IdentityId>,
) {
    let mut composer = composer(MockApplicationLedger::new(), MockDocumentStorage::new(), session);
    let error = composer
        .begin(opportunity(&[], &[]), &[record("opp-42", owner)])
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::AlreadyApplied);
    assert_eq!(composer.state(), &ComposerState::Idle);
}

#[rstest]
fn other_applicants_records_do_not_block(session: Arc<SessionStore>) {
    let mut composer = composer(MockApplicationLedger::new(), MockDocumentStorage::new(), session);
    let someone_else = IdentityId::new("student-2").expect("id");
    composer
        .begin(
            opportunity(&[], &[]),
            &[record("opp-42", Some(someone_else)), record("opp-7", Some(applicant()))],
        )
        .expect("open draft");
}

#[rstest]
fn past_deadline_blocks_drafting(session: Arc<SessionStore>) {
    let clock = Arc::new(MutableClock::new(at(15, 12)));
    let mut composer = ApplicationComposer::new(
        Arc::new(MockApplicationLedger::new()),
        Arc::new(MockDocumentStorage::new()),
        session,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    clock.set(at(30, 0) + chrono::TimeDelta::seconds(1));

    let error = composer
        .begin(opportunity(&["Why?"], &[]), &[])
        .expect_err("closed");
    assert_eq!(error.code(), ErrorCode::DeadlineExpired);
    assert_eq!(composer.state(), &ComposerState::Idle);
}

#[rstest]
fn transitions_out_of_order_are_refused(session: Arc<SessionStore>) {
    let mut composer = composer(MockApplicationLedger::new(), MockDocumentStorage::new(), session);
    assert_eq!(
        composer.answer(0, "hello").map_err(|e| e.code()),
        Err(ErrorCode::InvalidState)
    );
    assert_eq!(composer.retry().map_err(|e| e.code()), Err(ErrorCode::InvalidState));
}

#[rstest]
#[tokio::test]
async fn scenario_a_cv_pdf_satisfies_cv(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .withf(|token, submission, _| {
            token.expose() == "tok-1"
                && submission.answers.len() == 2
                && submission.documents == [reference("CV.pdf")]
        })
        .times(1)
        .returning(|_, submission, _| {
            let mut application = record("opp-42", Some(applicant()));
            application.answers = submission.answers.clone();
            application.documents = submission.documents.clone();
            Ok(application)
        });
    let mut composer = composer(ledger, echo_storage(), session);
    composer
        .begin(opportunity(&["Why us?", "Your goals?"], &["CV"]), &[])
        .expect("open draft");
    composer.answer(0, "Because").expect("answer");
    composer.answer(1, "Build bridges").expect("answer");

    let report = composer
        .upload_documents(vec![pdf("CV.pdf")])
        .await
        .expect("upload");
    assert!(report.is_complete());

    let application = composer.submit().await.expect("submitted");
    assert_eq!(application.documents, [reference("CV.pdf")]);
    assert!(matches!(composer.state(), ComposerState::Submitted(_)));
    assert!(composer.state().is_terminal());
}

#[rstest]
#[tokio::test]
async fn scenario_b_blank_second_answer(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger.expect_submit().never();
    let mut composer = composer(ledger, echo_storage(), session);
    composer
        .begin(opportunity(&["Why us?", "Your goals?"], &["CV"]), &[])
        .expect("open draft");
    composer.answer(0, "Because").expect("answer");
    composer.answer(1, "   ").expect("answer");
    composer
        .upload_documents(vec![pdf("CV.pdf")])
        .await
        .expect("upload");

    let error = composer.submit().await.expect_err("incomplete");
    assert_eq!(error.code(), ErrorCode::Validation);
    assert_eq!(composer.state(), &ComposerState::Drafting);
    assert_eq!(
        composer.draft().expect("draft").issues(),
        [ValidationIssue::RequiredAnswer {
            index: 1,
            question: "Your goals?".to_owned(),
        }]
    );
}

#[rstest]
#[tokio::test]
async fn scenario_c_transcript_does_not_cover_cv(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger.expect_submit().never();
    let mut composer = composer(ledger, echo_storage(), session);
    composer
        .begin(opportunity(&["Why us?", "Your goals?"], &["CV"]), &[])
        .expect("open draft");
    composer.answer(0, "Because").expect("answer");
    composer.answer(1, "Build bridges").expect("answer");
    composer
        .upload_documents(vec![pdf("transcript.pdf")])
        .await
        .expect("upload");

    composer.submit().await.expect_err("missing CV");
    assert_eq!(
        composer.draft().expect("draft").issues(),
        [ValidationIssue::MissingDocuments {
            missing: vec!["CV".to_owned()],
        }]
    );
}

#[rstest]
#[tokio::test]
async fn zero_questions_and_documents_submit_directly(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .times(1)
        .returning(|_, _, _| Ok(record("opp-42", None)));
    let mut composer = composer(ledger, MockDocumentStorage::new(), session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");
    composer.submit().await.expect("submitted");
}

#[rstest]
#[tokio::test]
async fn upload_failures_are_reported_per_file(session: Arc<SessionStore>) {
    let mut storage = MockDocumentStorage::new();
    storage
        .expect_upload()
        .withf(|_, file, _| file.file_name == "broken.pdf")
        .returning(|_, _, _| Err(RemoteCallError::rejected(500_u16, "Storage unavailable")));
    storage
        .expect_upload()
        .returning(|_, file, _| Ok(reference(&file.file_name)));
    let mut composer = composer(MockApplicationLedger::new(), storage, session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");

    let report = composer
        .upload_documents(vec![
            pdf("id.pdf"),
            UploadFile::new("virus.exe", vec![0; 8]),
            pdf("broken.pdf"),
            pdf("cv.pdf"),
        ])
        .await
        .expect("batch finishes");

    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|(name, error)| (name.as_str(), error.code()))
        .collect();
    assert_eq!(
        failed,
        [
            ("virus.exe", ErrorCode::UnsupportedType),
            ("broken.pdf", ErrorCode::Upload),
        ]
    );
    assert_eq!(
        composer.draft().expect("draft").documents(),
        [reference("id.pdf"), reference("cv.pdf")]
    );
    assert_eq!(composer.state(), &ComposerState::Drafting);
}

#[rstest]
#[tokio::test]
async fn uploads_run_in_selection_order(session: Arc<SessionStore>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut storage = MockDocumentStorage::new();
    storage.expect_upload().returning(move |_, file, _| {
        sink.lock().expect("lock").push(file.file_name.clone());
        Ok(reference(&file.file_name))
    });
    let mut composer = composer(MockApplicationLedger::new(), storage, session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");

    composer
        .upload_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .expect("uploads");
    assert_eq!(*seen.lock().expect("lock"), ["a.pdf", "b.pdf", "c.pdf"]);
}

#[rstest]
#[tokio::test]
async fn failed_submission_keeps_the_draft_and_the_key(session: Arc<SessionStore>) {
    let keys = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&keys);
    let mut attempts = 0_u32;
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .times(2)
        .returning(move |_, _, key| {
            sink.lock().expect("lock").push(key.clone());
            attempts += 1;
            if attempts == 1 {
                Err(RemoteCallError::rejected(409_u16, "You have already applied"))
            } else {
                Ok(record("opp-42", None))
            }
        });
    let mut composer = composer(ledger, echo_storage(), session);
    composer.begin(opportunity(&["Why?"], &[]), &[]).expect("open draft");
    composer.answer(0, "Because").expect("answer");

    let error = composer.submit().await.expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Submit);
    assert_eq!(error.message(), "You have already applied");
    assert!(matches!(composer.state(), ComposerState::Failed(_)));

    composer.retry().expect("reopen");
    assert_eq!(composer.draft().expect("draft").answers()[0].answer, "Because");
    composer.submit().await.expect("submitted");

    let keys = keys.lock().expect("lock");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
    assert_eq!(&keys[0], composer.idempotency_key());
}

#[rstest]
#[tokio::test]
async fn transport_failure_uses_the_generic_message(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .returning(|_, _, _| Err(RemoteCallError::timeout("30s elapsed")));
    let mut composer = composer(ledger, MockDocumentStorage::new(), session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");

    let error = composer.submit().await.expect_err("timeout");
    assert_eq!(error.message(), "Failed to submit application");
}

#[rstest]
#[tokio::test]
async fn rejected_token_during_submit_signs_out(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .returning(|_, _, _| Err(RemoteCallError::unauthorized("jwt expired")));
    let mut composer = composer(ledger, MockDocumentStorage::new(), Arc::clone(&session));
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");

    let error = composer.submit().await.expect_err("expired");
    assert_eq!(error.code(), ErrorCode::Auth);
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn cancel_returns_orphaned_uploads(session: Arc<SessionStore>) {
    let mut composer = composer(MockApplicationLedger::new(), echo_storage(), session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");
    composer
        .upload_documents(vec![pdf("a.pdf"), pdf("b.pdf")])
        .await
        .expect("uploads");
    let removed = composer.remove_document(0).expect("remove");
    assert_eq!(removed, reference("a.pdf"));

    assert_eq!(composer.cancel(), [reference("b.pdf")]);
}

#[rstest]
#[tokio::test]
async fn resumed_key_is_sent_with_the_submission(session: Arc<SessionStore>) {
    let saved = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("key");
    let expected = saved.clone();
    let mut ledger = MockApplicationLedger::new();
    ledger
        .expect_submit()
        .withf(move |_, _, key| *key == expected)
        .times(1)
        .returning(|_, _, _| Ok(record("opp-42", None)));
    let mut composer = composer(ledger, echo_storage(), session).with_key(saved);

    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");
    composer.submit().await.expect("submitted");
}

#[rstest]
#[tokio::test]
async fn blank_reanswer_keeps_the_required_issue(session: Arc<SessionStore>) {
    let mut ledger = MockApplicationLedger::new();
    ledger.expect_submit().never();
    let mut composer = composer(ledger, echo_storage(), session);
    composer
        .begin(opportunity(&["Why us?", "Your goals?"], &[]), &[])
        .expect("open draft");
    composer.answer(0, "Because").expect("answer");
    composer.submit().await.expect_err("incomplete");

    composer.answer(1, "  \t").expect("answer");
    assert_eq!(composer.draft().expect("draft").issues().len(), 1);

    composer.answer(1, "Build bridges").expect("answer");
    assert!(composer.draft().expect("draft").issues().is_empty());
}

/// Remote whose calls never complete.
struct Stalled;

#[async_trait]
impl ApplicationLedger for Stalled {
    async fn submit(
        &self,
        _token: &AuthToken,
        _submission: &ApplicationSubmission,
        _key: &IdempotencyKey,
    ) -> Result<Application, RemoteCallError> {
        std::future::pending().await
    }

    async fn my_applications(&self, _token: &AuthToken) -> Result<Vec<Application>, RemoteCallError> {
        std::future::pending().await
    }
}

#[async_trait]
impl DocumentStorage for Stalled {
    async fn upload(
        &self,
        _token: &AuthToken,
        _file: &UploadFile,
        _context: &UploadContext,
    ) -> Result<DocumentReference, RemoteCallError> {
        std::future::pending().await
    }
}

fn stalled_composer(session: Arc<SessionStore>) -> ApplicationComposer<Stalled, Stalled> {
    ApplicationComposer::new(
        Arc::new(Stalled),
        Arc::new(Stalled),
        session,
        Arc::new(MutableClock::new(at(15, 12))),
    )
}

#[rstest]
#[tokio::test]
async fn abandoned_submission_can_be_retried(session: Arc<SessionStore>) {
    let mut composer = stalled_composer(session);
    composer.begin(opportunity(&["Why?"], &[]), &[]).expect("open draft");
    composer.answer(0, "Because").expect("answer");
    let key = composer.idempotency_key().clone();

    let outcome = tokio::time::timeout(Duration::from_millis(20), composer.submit()).await;
    assert!(outcome.is_err(), "submission should still be pending");
    assert_eq!(composer.state(), &ComposerState::Submitting);

    composer.retry().expect("reopen");
    assert_eq!(composer.state(), &ComposerState::Drafting);
    assert_eq!(composer.draft().expect("draft").answers()[0].answer, "Because");
    assert_eq!(composer.idempotency_key(), &key);
}

#[rstest]
#[tokio::test]
async fn abandoned_upload_leaves_the_draft_editable(session: Arc<SessionStore>) {
    let mut composer = stalled_composer(session);
    composer.begin(opportunity(&["Why?"], &[]), &[]).expect("open draft");

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        composer.upload_documents(vec![pdf("CV.pdf")]),
    )
    .await;
    assert!(outcome.is_err(), "upload should still be pending");
    assert!(matches!(composer.state(), ComposerState::Uploading { .. }));

    composer.answer(0, "Because").expect("answer after abandoned upload");
    assert_eq!(composer.state(), &ComposerState::Drafting);
    assert!(composer.draft().expect("draft").documents().is_empty());
}

#[rstest]
fn retry_still_refuses_an_open_draft(session: Arc<SessionStore>) {
    let mut composer = stalled_composer(session);
    composer.begin(opportunity(&[], &[]), &[]).expect("open draft");

    let error = composer.retry().expect_err("nothing to retry");
    assert_eq!(error.code(), ErrorCode::InvalidState);
}
