//! PEM certificate bundles and private keys
//!
//! Certificate bundles are loaded all-or-nothing: if any `CERTIFICATE` block
//! fails to decode, the whole bundle is rejected. Private keys are tried as
//! RSA first and then as elliptic-curve keys.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;
use x509_parser::der_parser::ber::{BerObject, BerObjectContent};
use x509_parser::der_parser::parse_der;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PKCS1_RSA_TAG: &str = "RSA PRIVATE KEY";
const SEC1_EC_TAG: &str = "EC PRIVATE KEY";
const PKCS8_TAG: &str = "PRIVATE KEY";

const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";
const EC_PUBLIC_KEY_OID: &str = "1.2.840.10045.2.1";

/// A parsed X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    fn from_der(der: &[u8]) -> Option<Self> {
        let (_, cert) = match x509_parser::parse_x509_certificate(der) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "Rejecting certificate");
                return None;
            }
        };

        let validity = cert.validity();
        Some(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: Utc.timestamp_opt(validity.not_before.timestamp(), 0).single()?,
            not_after: Utc.timestamp_opt(validity.not_after.timestamp(), 0).single()?,
        })
    }

    /// DER encoding of the certificate
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Start of the validity period
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity period
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }
}

/// Parse a concatenated PEM certificate bundle
///
/// Returns an empty list if the bundle holds no certificates or if any
/// certificate in it is malformed.
pub fn load_certificates(data: &[u8]) -> Vec<Certificate> {
    let blocks = match pem::parse_many(data) {
        Ok(blocks) => blocks,
        Err(e) => {
            debug!(error = %e, "Certificate bundle is not valid PEM");
            return Vec::new();
        }
    };

    blocks
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(|block| Certificate::from_der(block.contents()))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// Returns true if `data` holds at least one certificate and all of them parse
pub fn is_certificate_bundle_valid(data: &[u8]) -> bool {
    !load_certificates(data).is_empty()
}

/// Private key algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA (PKCS#1 or PKCS#8)
    Rsa,
    /// Elliptic curve (SEC1 or PKCS#8)
    Ec,
}

/// A structurally valid private key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    algorithm: KeyAlgorithm,
    der: Vec<u8>,
}

impl PrivateKey {
    /// Key algorithm
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// DER encoding of the PEM block the key was read from
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Load a PEM private key, trying RSA first and elliptic curve second
pub fn load_private_key(data: &[u8]) -> Option<PrivateKey> {
    let blocks = pem::parse_many(data).ok()?;

    [KeyAlgorithm::Rsa, KeyAlgorithm::Ec]
        .into_iter()
        .find_map(|algorithm| {
            blocks
                .iter()
                .find(|block| block_holds_key(block, algorithm))
                .map(|block| PrivateKey {
                    algorithm,
                    der: block.contents().to_vec(),
                })
        })
}

/// Returns true if `data` holds a loadable private key
pub fn is_private_key_valid(data: &[u8]) -> bool {
    load_private_key(data).is_some()
}

fn block_holds_key(block: &pem::Pem, algorithm: KeyAlgorithm) -> bool {
    match (block.tag(), algorithm) {
        (PKCS1_RSA_TAG, KeyAlgorithm::Rsa) => is_pkcs1_rsa(block.contents()),
        (SEC1_EC_TAG, KeyAlgorithm::Ec) => is_sec1_ec(block.contents()),
        (PKCS8_TAG, _) => pkcs8_algorithm(block.contents()) == Some(algorithm),
        _ => false,
    }
}

fn is_integer(obj: &BerObject) -> bool {
    matches!(obj.content, BerObjectContent::Integer(_))
}

// RSAPrivateKey ::= SEQUENCE { version, n, e, d, p, q, dp, dq, qinv, ... }
fn is_pkcs1_rsa(der: &[u8]) -> bool {
    let Ok((_, obj)) = parse_der(der) else {
        return false;
    };
    obj.as_sequence()
        .is_ok_and(|fields| fields.len() >= 9 && fields.iter().take(9).all(is_integer))
}

// ECPrivateKey ::= SEQUENCE { version(1), privateKey OCTET STRING, [0] params, [1] publicKey }
fn is_sec1_ec(der: &[u8]) -> bool {
    let Ok((_, obj)) = parse_der(der) else {
        return false;
    };
    let Ok(fields) = obj.as_sequence() else {
        return false;
    };
    fields.len() >= 2
        && matches!(fields[0].as_u32(), Ok(1))
        && matches!(fields[1].content, BerObjectContent::OctetString(_))
}

// PrivateKeyInfo ::= SEQUENCE { version, AlgorithmIdentifier, privateKey OCTET STRING, ... }
fn pkcs8_algorithm(der: &[u8]) -> Option<KeyAlgorithm> {
    let (_, obj) = parse_der(der).ok()?;
    let fields = obj.as_sequence().ok()?;
    if fields.len() < 3 || !is_integer(&fields[0]) {
        return None;
    }

    let oid = fields[1].as_sequence().ok()?.first()?.as_oid().ok()?.to_id_string();
    let inner = fields[2].as_slice().ok()?;

    match oid.as_str() {
        RSA_ENCRYPTION_OID if is_pkcs1_rsa(inner) => Some(KeyAlgorithm::Rsa),
        EC_PUBLIC_KEY_OID if is_sec1_ec(inner) => Some(KeyAlgorithm::Ec),
        _ => None,
    }
}
