// # dyndns-netutils
//
// Stateless address, subnet and certificate helpers.
//
// ## Contents
//
// - **addr**: IP literal validation, loopback detection, scope-id handling
// - **subnet**: CIDR parsing and range membership
// - **tls**: PEM certificate bundles and private keys
//
// Nothing in here performs network I/O or keeps state, so every function
// is safe to call from any thread.

pub mod addr;
pub mod error;
pub mod subnet;
pub mod tls;

pub use addr::{
    HostAddress, canonicalize_ipv6, canonicalize_ipv6_with, interface_index, is_loopback,
    is_valid_ip,
};
pub use error::{NetError, Result};
pub use subnet::{Subnet, can_parse_subnet, is_in_range, parse_subnet, subnet_to_string};
pub use tls::{
    Certificate, KeyAlgorithm, PrivateKey, is_certificate_bundle_valid, is_private_key_valid,
    load_certificates, load_private_key,
};
