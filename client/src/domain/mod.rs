//! Domain types, services, and the application composer.
//!
//! Purpose: model the candidate-facing workflow of the portal without
//! binding to HTTP or storage. Services talk to the outside world only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure with a stable code.
//! - SessionStore / SessionView / SessionService: who is signed in.
//! - CatalogService, ApplicationsService, ProfileService,
//!   NewsletterService: remote reads and writes with degraded fallbacks.
//! - ApplicationComposer: the draft, upload, validate, submit workflow.
//! - guard: access decisions for protected views.

pub mod application;
pub mod applications;
pub mod catalog;
pub mod composer;
pub mod error;
pub mod handoff;
pub mod idempotency;
pub mod identity;
pub mod navigation;
pub mod newsletter;
pub mod opportunity;
pub mod ports;
pub mod profile;
pub mod registration;
pub mod retry;
pub mod session;
pub mod upload_policy;
pub mod validation;

pub use self::application::{
    AnswerSlot, Application, ApplicationId, ApplicationStatus, ApplicationSubmission,
    DocumentReference,
};
pub use self::applications::ApplicationsService;
pub use self::catalog::{CatalogService, FetchOutcome, filter_by_category};
pub use self::composer::{ApplicationComposer, ComposerState, Draft, UploadReport};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::handoff::SelectionHandoff;
pub use self::idempotency::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey, IdempotencyKeyValidationError};
pub use self::identity::{
    AuthSession, AuthToken, Identity, IdentityId, IdentityValidationError, LoginCredentials, Role,
};
pub use self::navigation::{AccessLevel, GuardDecision, RouteTarget, guard};
pub use self::newsletter::NewsletterService;
pub use self::opportunity::{
    Category, CategoryFilter, Funding, Opportunity, OpportunityId, OpportunityValidationError,
    parse_deadline,
};
pub use self::profile::{ProfileAsset, ProfileService, ProfileSnapshot};
pub use self::registration::{
    Address, CandidateProfile, Education, FieldErrors, PASSWORD_MIN, Registration,
    RegistrationForm, RegistrationStep, RegistrationWizard, field_errors_to_error,
    is_plausible_email, validate_step,
};
pub use self::retry::{
    AttemptJitter, BackoffJitter, ReadRetry, ReadRetryPolicy, RetryRuntime, RetrySleeper,
    TokioSleeper,
};
pub use self::session::{SessionService, SessionState, SessionStore, SessionView};
pub use self::upload_policy::{
    DOCUMENT_EXTENSIONS, UploadContext, UploadFile, UploadRejection, check_upload,
    mime_for_name, rejection_to_error,
};
pub use self::validation::{
    ValidationIssue, document_satisfies, issues_to_error, missing_documents, validate_draft,
};
