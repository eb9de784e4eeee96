//! Headless client for the student opportunities portal.
//!
//! The crate covers the candidate side of the portal: signing in,
//! browsing the opportunity catalogue, and composing an application with
//! answers and uploaded documents. Presentation is left to the host.
//!
//! - [`domain`]: types, services, and the application composer.
//! - [`outbound`]: the reqwest adapter and credential storage.
//! - [`config`]: `ClientSettings` loaded through OrthoConfig.
//! - [`bootstrap`]: `PortalClient`, wiring everything together.
//! - [`telemetry`]: tracing subscriber installation.

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bootstrap::{BootstrapError, PortalClient};
pub use config::{ClientSettings, SettingsError};
