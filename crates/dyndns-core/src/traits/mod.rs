//! Collaborator interfaces for the updater
//!
//! The updater owns no I/O of its own. Everything it talks to is injected
//! through these traits so tests can substitute fakes.
//!
//! - [`HttpFetcher`]: Asynchronous HTTP GET
//! - [`SettingsStore`]: Credentials in, check state out
//! - [`LogSink`]: User-facing messages
//! - [`Clock`]: Wall-clock time

pub mod clock;
pub mod http_fetcher;
pub mod log_sink;
pub mod settings_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use http_fetcher::HttpFetcher;
pub use log_sink::{LogSink, Severity, TracingLogSink};
pub use settings_store::SettingsStore;
