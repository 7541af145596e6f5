//! Configuration types for the dyndns client
//!
//! [`DnsSettings`] is what the user configures (service and credentials),
//! [`CheckState`] is what the updater persists between runs and
//! [`UpdaterConfig`] holds the polling parameters.

use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;
use crate::provider::ProviderId;

/// Minimum length accepted for usernames and passwords
pub const MIN_CREDENTIAL_LEN: usize = 4;

/// Default interval between public IP checks (30 minutes)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default public-IP echo endpoint
pub const DEFAULT_ECHO_URL: &str = "http://checkip.dyndns.org";

// Dot-separated labels of 1-63 characters starting with a letter, ending in
// an alphabetic label of at least two characters.
static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9-]{0,62}\.)+[a-zA-Z]{2,}$").expect("static domain pattern")
});

/// Dynamic DNS service selection and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSettings {
    /// Selected provider
    #[serde(default)]
    pub service: ProviderId,

    /// Hostname to keep updated
    #[serde(default)]
    pub domain: String,

    /// Account username
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,
}

impl DnsSettings {
    /// Create settings for a provider
    pub fn new(
        service: ProviderId,
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            service,
            domain: domain.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate service, domain, username and password, in that order
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.service.descriptor().is_none() {
            return Err(CredentialError::NoService);
        }
        if !is_valid_domain(&self.domain) {
            return Err(CredentialError::InvalidDomain(self.domain.clone()));
        }
        if self.username.chars().count() < MIN_CREDENTIAL_LEN {
            return Err(CredentialError::UsernameTooShort {
                min: MIN_CREDENTIAL_LEN,
            });
        }
        if self.password.chars().count() < MIN_CREDENTIAL_LEN {
            return Err(CredentialError::PasswordTooShort {
                min: MIN_CREDENTIAL_LEN,
            });
        }
        Ok(())
    }
}

/// Returns true if `domain` matches the hostname grammar accepted by providers
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain)
}

/// Persisted result of the last public IP check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckState {
    /// When the last check or update was issued
    pub last_check: Option<DateTime<Utc>>,

    /// Last public IP reported to the provider
    pub last_ip: Option<IpAddr>,
}

/// Polling parameters for the updater
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Interval between public IP checks
    pub poll_interval: Duration,

    /// Endpoint that echoes the caller's public IP
    pub echo_url: String,

    /// User agent sent with every request
    pub user_agent: String,
}

impl UpdaterConfig {
    /// Override the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Override the echo endpoint
    pub fn with_echo_url(mut self, echo_url: impl Into<String>) -> Self {
        self.echo_url = echo_url.into();
        self
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            echo_url: DEFAULT_ECHO_URL.to_string(),
            user_agent: concat!("dyndns/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
