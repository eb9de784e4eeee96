//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod application_ledger;
mod auth_gateway;
mod credential_store;
mod document_storage;
mod newsletter_gateway;
mod opportunity_source;
mod profile_gateway;
mod remote_error;

pub use application_ledger::ApplicationLedger;
#[cfg(test)]
pub use application_ledger::MockApplicationLedger;
pub use auth_gateway::AuthGateway;
#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{
    CredentialStore, CredentialStoreError, StoredCredentials, TOKEN_KEY, USER_KEY,
};
pub use document_storage::DocumentStorage;
#[cfg(test)]
pub use document_storage::MockDocumentStorage;
#[cfg(test)]
pub use newsletter_gateway::MockNewsletterGateway;
pub use newsletter_gateway::NewsletterGateway;
#[cfg(test)]
pub use opportunity_source::MockOpportunitySource;
pub use opportunity_source::OpportunitySource;
#[cfg(test)]
pub use profile_gateway::MockProfileGateway;
pub use profile_gateway::ProfileGateway;
pub use remote_error::RemoteCallError;
