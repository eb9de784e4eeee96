//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::ReadRetryPolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READ_RETRIES: u32 = 1;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;
const DEFAULT_STORAGE_DIR: &str = ".portal-client";

/// Settings for the portal client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct ClientSettings {
    /// Base URL of the portal API.
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Automatic retries for idempotent reads.
    pub read_retries: Option<u32>,
    /// Delay before the first read retry, in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Directory holding the stored session.
    pub storage_dir: Option<String>,
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The API base URL does not parse.
    #[error("invalid api_base_url `{value}`: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// The request timeout is zero.
    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl ClientSettings {
    /// Parsed API base URL, defaulting to the local development server.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] when the value is not an
    /// absolute URL.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        Url::parse(raw.trim()).map_err(|error| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            reason: error.to_string(),
        })
    }

    /// Per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroTimeout`] for a zero timeout.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Retry policy for idempotent reads.
    pub fn retry_policy(&self) -> ReadRetryPolicy {
        ReadRetryPolicy {
            retries: self.read_retries.unwrap_or(DEFAULT_READ_RETRIES),
            initial_backoff: Duration::from_millis(
                self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
            ..ReadRetryPolicy::default()
        }
    }

    /// Session storage directory.
    pub fn storage_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.storage_dir.as_deref().unwrap_or(DEFAULT_STORAGE_DIR))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 5] = [
        "PORTAL_API_BASE_URL",
        "PORTAL_REQUEST_TIMEOUT_SECS",
        "PORTAL_READ_RETRIES",
        "PORTAL_RETRY_BACKOFF_MS",
        "PORTAL_STORAGE_DIR",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("portal-client")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("default url").as_str(),
            "http://localhost:5000/"
        );
        assert_eq!(
            settings.request_timeout().expect("default timeout"),
            Duration::from_secs(30)
        );
        assert_eq!(settings.retry_policy(), ReadRetryPolicy::default());
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from(".portal-client"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PORTAL_API_BASE_URL", Some("https://portal.example/api-root".to_owned())),
            ("PORTAL_REQUEST_TIMEOUT_SECS", Some("5".to_owned())),
            ("PORTAL_READ_RETRIES", Some("0".to_owned())),
            ("PORTAL_RETRY_BACKOFF_MS", Some("10".to_owned())),
            ("PORTAL_STORAGE_DIR", Some("/tmp/portal-session".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("url").as_str(),
            "https://portal.example/api-root"
        );
        assert_eq!(settings.request_timeout().expect("timeout"), Duration::from_secs(5));
        assert_eq!(settings.retry_policy().retries, 0);
        assert_eq!(
            settings.retry_policy().initial_backoff,
            Duration::from_millis(10)
        );
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from("/tmp/portal-session"));
    }

    #[rstest]
    #[case(Some("not a url"))]
    #[case(Some("/relative/only"))]
    fn malformed_base_url_is_reported(#[case] value: Option<&str>) {
        let settings = ClientSettings {
            api_base_url: value.map(str::to_owned),
            request_timeout_secs: None,
            read_retries: None,
            retry_backoff_ms: None,
            storage_dir: None,
        };
        assert!(matches!(
            settings.api_base_url(),
            Err(SettingsError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let settings = ClientSettings {
            api_base_url: None,
            request_timeout_secs: Some(0),
            read_retries: None,
            retry_backoff_ms: None,
            storage_dir: None,
        };
        assert_eq!(settings.request_timeout(), Err(SettingsError::ZeroTimeout));
    }
}
