// # dyndns-core
//
// Core library for the dynamic DNS maintenance client.
//
// ## Architecture Overview
//
// This library keeps one hostname at a dynamic DNS provider pointed at the
// machine's current public IP:
// - **DnsUpdater**: State machine that polls, detects changes and submits updates
// - **ProviderId**: Table of supported providers and their update endpoints
// - **ReplyCode**: Provider reply classification and the policy for each code
// - **SettingsStore**: Trait for credentials and persisted check state
// - **HttpFetcher**: Trait for the HTTP download facility
//
// ## Design Principles
//
// 1. **Single Owner**: All updater state lives in one task, requests report back
// 2. **Injected I/O**: HTTP, storage, logging and time are traits
// 3. **Table-Driven**: Providers and reply codes are data, not branches
// 4. **Library-First**: The daemon is a thin shell around this crate

pub mod config;
pub mod echo;
pub mod error;
pub mod provider;
pub mod reply;
pub mod state;
pub mod traits;
pub mod updater;

// Re-export core types for convenience
pub use config::{CheckState, DnsSettings, UpdaterConfig};
pub use echo::{CheckIpParser, EchoParser};
pub use error::{CredentialError, EchoParseError, Error, Result};
pub use provider::{ProviderDescriptor, ProviderId};
pub use reply::{ReplyCode, ReplyPolicy};
pub use state::{FileSettingsStore, MemorySettingsStore};
pub use traits::{Clock, HttpFetcher, LogSink, ManualClock, SettingsStore, Severity, SystemClock};
pub use updater::{DnsUpdater, UpdaterContext, UpdaterHandle, UpdaterState, UpdaterStatus};
