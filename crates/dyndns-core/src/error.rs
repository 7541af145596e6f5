//! Error types for the dyndns client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dyndns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndns client
#[derive(Error, Debug)]
pub enum Error {
    /// Settings store-related errors
    #[error("Settings store error: {0}")]
    Settings(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors (request could not be completed)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Update URL could not be assembled
    #[error("Invalid update URL: {0}")]
    Url(#[from] url::ParseError),

    /// Credentials failed validation
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a settings store error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// The credential rule that a configuration violates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No dynamic DNS service selected
    #[error("no dynamic DNS service selected")]
    NoService,

    /// Domain does not match the hostname grammar
    #[error("supplied domain name is invalid: '{0}'")]
    InvalidDomain(String),

    /// Username shorter than the minimum
    #[error("supplied username is too short (minimum {min} characters)")]
    UsernameTooShort {
        /// Minimum accepted length
        min: usize,
    },

    /// Password shorter than the minimum
    #[error("supplied password is too short (minimum {min} characters)")]
    PasswordTooShort {
        /// Minimum accepted length
        min: usize,
    },
}

/// Why an echo response did not yield an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EchoParseError {
    /// Body does not contain the expected pattern
    #[error("response does not contain a current IP address")]
    NoMatch,

    /// Pattern matched but the token is not an IP literal
    #[error("'{0}' is not a valid IP address")]
    InvalidAddress(String),
}
