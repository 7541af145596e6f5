//! Subnet parsing and range membership
//!
//! A subnet is written `address/prefix`. IPv4 subnets may also use a dotted
//! netmask (`192.0.2.0/255.255.255.0`). The stored network address always
//! has its host bits cleared.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::error::{NetError, Result};

/// A network address plus prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    network: IpNetwork,
}

impl Subnet {
    /// Build a subnet from an address and prefix length, masking host bits
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let net = IpNetwork::new(addr, prefix_len)
            .map_err(|e| NetError::invalid_subnet(format!("{}/{}: {}", addr, prefix_len, e)))?;
        let network = IpNetwork::new(net.network(), prefix_len)
            .map_err(|e| NetError::invalid_subnet(format!("{}/{}: {}", addr, prefix_len, e)))?;
        Ok(Self { network })
    }

    /// The network address
    pub fn network_address(&self) -> IpAddr {
        self.network.network()
    }

    /// The prefix length
    pub fn prefix_len(&self) -> u8 {
        self.network.prefix()
    }

    /// Returns true if `addr` lies inside this subnet (same address family only)
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.network.contains(addr)
    }
}

impl FromStr for Subnet {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| NetError::invalid_subnet(s))?;

        let addr: IpAddr = addr.parse().map_err(|_| NetError::invalid_subnet(s))?;

        let prefix_len = match prefix.parse::<u8>() {
            Ok(len) => len,
            Err(_) => match (addr, prefix.parse::<Ipv4Addr>()) {
                (IpAddr::V4(_), Ok(mask)) => {
                    ipnetwork::ipv4_mask_to_prefix(mask).map_err(|_| NetError::invalid_subnet(s))?
                }
                _ => return Err(NetError::invalid_subnet(s)),
            },
        };

        Self::new(addr, prefix_len).map_err(|_| NetError::invalid_subnet(s))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_address(), self.prefix_len())
    }
}

/// Parse CIDR notation
pub fn parse_subnet(text: &str) -> Result<Subnet> {
    text.parse()
}

/// Returns true if `text` is a valid subnet
pub fn can_parse_subnet(text: &str) -> bool {
    parse_subnet(text).is_ok()
}

/// Canonical `address/prefix` rendering
pub fn subnet_to_string(subnet: &Subnet) -> String {
    subnet.to_string()
}

/// Returns true if `addr`, or its equivalent in the other address family,
/// falls inside any of `subnets`
///
/// IPv4 addresses are also checked in their IPv4-mapped IPv6 form, and
/// IPv4-mapped IPv6 addresses are also checked as plain IPv4.
pub fn is_in_range(addr: IpAddr, subnets: &[Subnet]) -> bool {
    let equivalent = match addr {
        IpAddr::V4(v4) => Some(IpAddr::V6(v4.to_ipv6_mapped())),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4),
    };

    subnets.iter().any(|subnet| {
        subnet.contains(addr) || equivalent.is_some_and(|other| subnet.contains(other))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_cidr() {
        let subnet = parse_subnet("192.0.2.0/24").unwrap();
        assert_eq!(subnet.network_address(), ip("192.0.2.0"));
        assert_eq!(subnet.prefix_len(), 24);

        let v6 = parse_subnet("2001:db8::/32").unwrap();
        assert_eq!(v6.prefix_len(), 32);
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let subnet = parse_subnet("192.0.2.77/24").unwrap();
        assert_eq!(subnet_to_string(&subnet), "192.0.2.0/24");
    }

    #[test]
    fn test_parse_dotted_netmask() {
        let subnet = parse_subnet("10.1.2.3/255.255.0.0").unwrap();
        assert_eq!(subnet.to_string(), "10.1.0.0/16");

        assert!(!can_parse_subnet("10.1.2.3/255.0.255.0"));
        assert!(!can_parse_subnet("2001:db8::/255.255.0.0"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(!can_parse_subnet(""));
        assert!(!can_parse_subnet("192.0.2.0"));
        assert!(!can_parse_subnet("192.0.2.0/33"));
        assert!(!can_parse_subnet("2001:db8::/129"));
        assert!(!can_parse_subnet("nope/8"));
        assert!(matches!(
            parse_subnet("192.0.2.0/x"),
            Err(NetError::InvalidSubnet(_))
        ));
    }

    #[test]
    fn test_in_range_same_family() {
        let subnets = [parse_subnet("192.0.2.0/24").unwrap()];
        assert!(is_in_range(ip("192.0.2.5"), &subnets));
        assert!(!is_in_range(ip("198.51.100.1"), &subnets));
    }

    #[test]
    fn test_in_range_mapped_address_matches_v4_subnet() {
        let subnets = [parse_subnet("192.0.2.0/24").unwrap()];
        assert!(is_in_range(ip("::ffff:192.0.2.5"), &subnets));
        assert!(!is_in_range(ip("::ffff:198.51.100.1"), &subnets));
    }

    #[test]
    fn test_in_range_v4_address_matches_mapped_subnet() {
        let subnets = [parse_subnet("::ffff:192.0.2.0/120").unwrap()];
        assert!(is_in_range(ip("192.0.2.200"), &subnets));
    }

    #[test]
    fn test_in_range_checks_every_subnet() {
        let subnets = [
            parse_subnet("10.0.0.0/8").unwrap(),
            parse_subnet("2001:db8::/32").unwrap(),
        ];
        assert!(is_in_range(ip("2001:db8::1"), &subnets));
        assert!(is_in_range(ip("10.200.0.1"), &subnets));
        assert!(!is_in_range(ip("2001:db9::1"), &subnets));
        assert!(!is_in_range(ip("10.0.0.1"), &[]));
    }
}
