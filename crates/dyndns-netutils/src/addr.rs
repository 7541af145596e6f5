//! Address validation and IPv6 scope-id handling
//!
//! Link-local IPv6 addresses are only meaningful together with a scope id
//! (zone index), written after a `%`: `fe80::1%eth0` or `fe80::1%3`.
//! Socket APIs only accept the numeric form, so [`canonicalize_ipv6`]
//! rewrites interface names into interface indices.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::NetError;

/// An IP address with an optional textual IPv6 scope id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAddress {
    ip: IpAddr,
    scope_id: Option<String>,
}

impl HostAddress {
    /// Create an address without a scope id
    pub fn new(ip: IpAddr) -> Self {
        Self { ip, scope_id: None }
    }

    /// Create an IPv6 address qualified by a scope id
    pub fn with_scope(ip: Ipv6Addr, scope_id: impl Into<String>) -> Self {
        Self {
            ip: IpAddr::V6(ip),
            scope_id: Some(scope_id.into()),
        }
    }

    /// The bare address
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The scope id, if any
    pub fn scope_id(&self) -> Option<&str> {
        self.scope_id.as_deref()
    }
}

impl From<IpAddr> for HostAddress {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip)
    }
}

impl FromStr for HostAddress {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        if let Some((addr, scope)) = text.split_once('%') {
            // Only IPv6 literals carry a zone index
            let ip: Ipv6Addr = addr.parse().map_err(|_| NetError::invalid_address(s))?;
            if scope.is_empty() || scope.contains('%') {
                return Err(NetError::invalid_address(s));
            }
            return Ok(Self::with_scope(ip, scope));
        }

        let ip: IpAddr = text.parse().map_err(|_| NetError::invalid_address(s))?;
        Ok(Self::new(ip))
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope_id {
            Some(scope) => write!(f, "{}%{}", self.ip, scope),
            None => write!(f, "{}", self.ip),
        }
    }
}

/// Returns true if `text` is an IPv4 or IPv6 literal (an IPv6 scope id is allowed)
pub fn is_valid_ip(text: &str) -> bool {
    text.parse::<HostAddress>().is_ok()
}

/// Returns true for `127.0.0.1`, `::1` and `::ffff:127.0.0.1`
pub fn is_loopback(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4 == Ipv4Addr::LOCALHOST,
        IpAddr::V6(v6) => {
            v6 == Ipv6Addr::LOCALHOST || v6 == Ipv4Addr::LOCALHOST.to_ipv6_mapped()
        }
    }
}

/// Resolve a network interface name to its index
///
/// Returns `None` when no interface carries that name (including when the
/// name is already numeric).
#[cfg(unix)]
pub fn interface_index(name: &str) -> Option<u32> {
    let name = std::ffi::CString::new(name).ok()?;
    // SAFETY: `name` is a valid NUL-terminated string for the duration of the call
    let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
    (index != 0).then_some(index)
}

/// Resolve a network interface name to its index
#[cfg(not(unix))]
pub fn interface_index(_name: &str) -> Option<u32> {
    None
}

/// Rewrite an interface-name scope id into the numeric interface index
///
/// IPv4 input is promoted to its IPv4-mapped IPv6 form. Addresses without a
/// scope id, or whose scope id does not name a local interface, are returned
/// unchanged.
pub fn canonicalize_ipv6(addr: &HostAddress) -> HostAddress {
    canonicalize_ipv6_with(addr, interface_index)
}

/// Same as [`canonicalize_ipv6`] with a caller-provided interface resolver
pub fn canonicalize_ipv6_with<F>(addr: &HostAddress, resolve: F) -> HostAddress
where
    F: Fn(&str) -> Option<u32>,
{
    let v6 = match addr.ip {
        IpAddr::V4(v4) => return HostAddress::new(IpAddr::V6(v4.to_ipv6_mapped())),
        IpAddr::V6(v6) => v6,
    };

    let Some(scope) = addr.scope_id.as_deref() else {
        return addr.clone();
    };

    match resolve(scope) {
        Some(index) => {
            tracing::trace!(scope, index, "Resolved IPv6 scope id");
            HostAddress::with_scope(v6, index.to_string())
        }
        None => addr.clone(),
    }
}
