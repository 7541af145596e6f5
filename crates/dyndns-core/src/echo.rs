//! Public IP echo response parsing
//!
//! The echo endpoint answers with a small HTML page. Its format belongs to
//! the service and may change, so extraction sits behind [`EchoParser`]
//! and the updater never looks at the body itself.

use std::net::IpAddr;
use std::sync::LazyLock;

use dyndns_netutils::HostAddress;
use regex::Regex;

use crate::error::EchoParseError;

static CHECKIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Current IP Address:\s+([^<]+)</body>").expect("static checkip pattern")
});

/// Extracts the caller's public IP from an echo response body
pub trait EchoParser: Send + Sync {
    /// Return the address reported in `body`
    fn extract_ip(&self, body: &str) -> Result<IpAddr, EchoParseError>;
}

/// Parser for `checkip.dyndns.org`-style pages:
/// `Current IP Address: <ip></body>`
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckIpParser;

impl CheckIpParser {
    /// Return the raw token that follows `Current IP Address:`
    pub fn extract_token<'a>(&self, body: &'a str) -> Option<&'a str> {
        CHECKIP_PATTERN
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

impl EchoParser for CheckIpParser {
    fn extract_ip(&self, body: &str) -> Result<IpAddr, EchoParseError> {
        let token = self.extract_token(body).ok_or(EchoParseError::NoMatch)?;
        tracing::debug!(token, "Echo response captured token");

        token
            .parse::<HostAddress>()
            .map(|addr| addr.ip())
            .map_err(|_| EchoParseError::InvalidAddress(token.to_string()))
    }
}
