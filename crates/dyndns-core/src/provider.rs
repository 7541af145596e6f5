//! Dynamic DNS provider table
//!
//! Every supported service is one row in [`PROVIDERS`]. Adding a provider
//! that speaks the `/nic/update` protocol means adding a [`ProviderId`]
//! variant and a descriptor row; the updater itself does not change.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DnsSettings;
use crate::error::{Error, Result};

/// Identifies the active dynamic DNS service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// No service selected
    #[default]
    None,
    /// Dyn (dyndns.org)
    DynDns,
    /// No-IP (no-ip.com)
    NoIp,
}

impl ProviderId {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::None => "none",
            ProviderId::DynDns => "dyndns",
            ProviderId::NoIp => "noip",
        }
    }

    /// Descriptor row for this provider, `None` for [`ProviderId::None`]
    pub fn descriptor(&self) -> Option<&'static ProviderDescriptor> {
        PROVIDERS.iter().find(|p| p.id == *self)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(ProviderId::None),
            "dyndns" => Ok(ProviderId::DynDns),
            "noip" | "no-ip" => Ok(ProviderId::NoIp),
            other => Err(Error::config(format!(
                "Unknown dynamic DNS service '{}'. Supported: dyndns, noip",
                other
            ))),
        }
    }
}

/// Static description of a provider's endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Provider identifier
    pub id: ProviderId,
    /// Host that receives update requests
    pub update_host: &'static str,
    /// Path of the update endpoint
    pub update_path: &'static str,
    /// Sign-up page shown to users
    pub registration_url: &'static str,
}

/// All supported providers
pub const PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: ProviderId::DynDns,
        update_host: "members.dyndns.org",
        update_path: "/nic/update",
        registration_url: "https://account.dyn.com/entrance/",
    },
    ProviderDescriptor {
        id: ProviderId::NoIp,
        update_host: "dynupdate.no-ip.com",
        update_path: "/nic/update",
        registration_url: "https://www.noip.com/remote-access",
    },
];

/// Sign-up page for a provider, `None` when no provider is selected
pub fn registration_url(id: ProviderId) -> Option<Url> {
    id.descriptor()
        .and_then(|descriptor| Url::parse(descriptor.registration_url).ok())
}

/// URL scheme used for update requests
pub fn update_scheme() -> &'static str {
    if cfg!(feature = "tls") { "https" } else { "http" }
}

/// Build the update request for `ip`
///
/// Credentials travel as URL user-info; `hostname` and `myip` are passed as
/// query parameters.
pub fn build_update_url(
    descriptor: &ProviderDescriptor,
    settings: &DnsSettings,
    ip: IpAddr,
) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}://{}{}",
        update_scheme(),
        descriptor.update_host,
        descriptor.update_path
    ))?;

    url.set_username(&settings.username)
        .map_err(|_| Error::config("update URL cannot carry a username"))?;
    url.set_password(Some(&settings.password))
        .map_err(|_| Error::config("update URL cannot carry a password"))?;

    url.query_pairs_mut()
        .append_pair("hostname", &settings.domain)
        .append_pair("myip", &ip.to_string());

    Ok(url)
}
