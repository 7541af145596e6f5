//! Error types for address and subnet parsing

use thiserror::Error;

/// Result type alias for netutils operations
pub type Result<T> = std::result::Result<T, NetError>;

/// Parse failures reported by the netutils helpers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// Text is not an IPv4 or IPv6 literal
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// Text is not a valid `address/prefix` pair
    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),
}

impl NetError {
    /// Create an invalid address error
    pub fn invalid_address(text: impl Into<String>) -> Self {
        Self::InvalidAddress(text.into())
    }

    /// Create an invalid subnet error
    pub fn invalid_subnet(text: impl Into<String>) -> Self {
        Self::InvalidSubnet(text.into())
    }
}
