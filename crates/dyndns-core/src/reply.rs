//! Provider reply codes and the policy applied to each
//!
//! The first whitespace-delimited token of an update response is the
//! status code. [`ReplyCode::policy`] maps every code to a [`ReplyPolicy`]
//! describing what the updater does next.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::traits::Severity;
use crate::updater::UpdaterState;

/// Status code returned by the update endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyCode {
    /// `good`: record updated
    Good,
    /// `nochg`: record already had this address
    NoChange,
    /// `911`: provider outage
    ServerError,
    /// `dnserr`: provider DNS failure
    DnsError,
    /// `nohost`: hostname unknown to the account
    NoHost,
    /// `badauth`: authentication rejected
    BadAuth,
    /// `badagent`: client blocked by the provider
    BadAgent,
    /// `!donator`: feature needs a paid account
    NotDonator,
    /// `abuse`: account blocked for abuse
    Abuse,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl ReplyCode {
    /// Classify a full response body
    pub fn parse(reply: &str) -> Self {
        Self::from_token(reply.split_whitespace().next().unwrap_or_default())
    }

    /// Classify a single status token
    pub fn from_token(token: &str) -> Self {
        match token {
            "good" => ReplyCode::Good,
            "nochg" => ReplyCode::NoChange,
            "911" => ReplyCode::ServerError,
            "dnserr" => ReplyCode::DnsError,
            "nohost" => ReplyCode::NoHost,
            "badauth" => ReplyCode::BadAuth,
            "badagent" => ReplyCode::BadAgent,
            "!donator" => ReplyCode::NotDonator,
            "abuse" => ReplyCode::Abuse,
            other => ReplyCode::Unknown(other.to_string()),
        }
    }

    /// Wire form of the code
    pub fn as_str(&self) -> &str {
        match self {
            ReplyCode::Good => "good",
            ReplyCode::NoChange => "nochg",
            ReplyCode::ServerError => "911",
            ReplyCode::DnsError => "dnserr",
            ReplyCode::NoHost => "nohost",
            ReplyCode::BadAuth => "badauth",
            ReplyCode::BadAgent => "badagent",
            ReplyCode::NotDonator => "!donator",
            ReplyCode::Abuse => "abuse",
            ReplyCode::Unknown(token) => token,
        }
    }

    /// What the updater does in response to this code
    pub fn policy(&self) -> ReplyPolicy {
        use ReplyCode::*;

        match self {
            Good | NoChange => ReplyPolicy::SUCCESS,
            ServerError | DnsError => ReplyPolicy::TRANSIENT,
            NoHost | BadAuth => ReplyPolicy::INVALID_CREDENTIALS,
            BadAgent | NotDonator | Abuse => ReplyPolicy::FATAL,
            Unknown(_) => ReplyPolicy::UNCLASSIFIED,
        }
    }

    /// User-facing log message for this code
    pub fn message(&self) -> String {
        match self {
            ReplyCode::Good | ReplyCode::NoChange => {
                "Your dynamic DNS was successfully updated.".to_string()
            }
            ReplyCode::ServerError | ReplyCode::DnsError => {
                "Dynamic DNS error: the service is temporarily unavailable, \
                 the update will be retried on the next check."
                    .to_string()
            }
            ReplyCode::NoHost => {
                "Dynamic DNS error: hostname supplied does not exist under specified account."
                    .to_string()
            }
            ReplyCode::BadAuth => "Dynamic DNS error: invalid username/password.".to_string(),
            ReplyCode::BadAgent => {
                "Dynamic DNS error: this client was blacklisted by the service.".to_string()
            }
            ReplyCode::NotDonator => format!(
                "Dynamic DNS error: {} was returned by the service, \
                 the requested feature needs a paid account.",
                self.as_str()
            ),
            ReplyCode::Abuse => {
                "Dynamic DNS error: your username was blocked due to abuse.".to_string()
            }
            ReplyCode::Unknown(token) => format!(
                "Dynamic DNS error: unrecognized reply '{}', updates paused until the settings change.",
                token
            ),
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction to a reply code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyPolicy {
    /// Severity of the log message
    pub severity: Severity,
    /// State to enter, `None` keeps the current state
    pub transition: Option<UpdaterState>,
    /// Stop the poll timer
    pub stop_timer: bool,
    /// Forget the last known IP so the next check re-submits
    pub clear_ip: bool,
}

impl ReplyPolicy {
    /// `good`, `nochg`
    pub const SUCCESS: Self = Self {
        severity: Severity::Info,
        transition: None,
        stop_timer: false,
        clear_ip: false,
    };

    /// `911`, `dnserr`: the timer keeps running and acts as the retry
    pub const TRANSIENT: Self = Self {
        severity: Severity::Critical,
        transition: None,
        stop_timer: false,
        clear_ip: true,
    };

    /// `nohost`, `badauth`
    pub const INVALID_CREDENTIALS: Self = Self {
        severity: Severity::Critical,
        transition: Some(UpdaterState::InvalidCredentials),
        stop_timer: true,
        clear_ip: true,
    };

    /// `badagent`, `!donator`, `abuse`
    pub const FATAL: Self = Self {
        severity: Severity::Critical,
        transition: Some(UpdaterState::Fatal),
        stop_timer: true,
        clear_ip: true,
    };

    /// Unrecognized codes pause updates without changing state
    pub const UNCLASSIFIED: Self = Self {
        severity: Severity::Critical,
        transition: None,
        stop_timer: true,
        clear_ip: true,
    };
}
