//! Test doubles and common utilities for updater contract tests
//!
//! The fakes here script HTTP responses, record user-facing messages and
//! let tests drive time by hand.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use dyndns_core::{
    CheckState, DnsSettings, DnsUpdater, Error, HttpFetcher, LogSink, ManualClock,
    MemorySettingsStore, ProviderId, Severity, UpdaterConfig, UpdaterContext,
};

/// Echo endpoint used by every test updater
pub const ECHO_URL: &str = "http://echo.test/";

/// Poll interval used by every test updater
pub const POLL_MINUTES: i64 = 30;

/// A request seen by the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub user_agent: String,
}

/// HttpFetcher answering from per-endpoint queues
///
/// Requests to [`ECHO_URL`] pop from the echo queue, everything else pops
/// from the update queue. An empty queue yields a transport error.
#[derive(Default)]
pub struct ScriptedFetcher {
    echo: Mutex<VecDeque<Result<String, String>>>,
    update: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an echo page reporting `ip`
    pub fn push_echo_ip(&self, ip: &str) {
        self.push_echo(Ok(checkip_page(ip)));
    }

    pub fn push_echo(&self, response: Result<String, String>) {
        self.echo.lock().unwrap().push_back(response);
    }

    /// Queue an update reply body
    pub fn push_update(&self, reply: &str) {
        self.update.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_update_failure(&self, reason: &str) {
        self.update.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn echo_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url == ECHO_URL)
            .count()
    }

    /// URLs of every update request, in order
    pub fn update_urls(&self) -> Vec<url::Url> {
        self.requests()
            .into_iter()
            .filter(|r| r.url != ECHO_URL)
            .map(|r| url::Url::parse(&r.url).unwrap())
            .collect()
    }
}

#[async_trait::async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>, Error> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            user_agent: user_agent.to_string(),
        });

        let queue = if url == ECHO_URL {
            &self.echo
        } else {
            &self.update
        };

        match queue.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body.into_bytes()),
            Some(Err(reason)) => Err(Error::http(reason)),
            None => Err(Error::http("no scripted response")),
        }
    }
}

/// LogSink that keeps every message
#[derive(Default)]
pub struct RecordingLogSink {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingLogSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn critical(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(_, severity)| *severity == Severity::Critical)
            .map(|(message, _)| message)
            .collect()
    }

    pub fn info(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(_, severity)| *severity == Severity::Info)
            .map(|(message, _)| message)
            .collect()
    }
}

impl LogSink for RecordingLogSink {
    fn add_message(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

/// Everything a test needs to drive an updater
pub struct Harness {
    pub fetcher: Arc<ScriptedFetcher>,
    pub store: MemorySettingsStore,
    pub log: Arc<RecordingLogSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Harness with valid settings and no check history
    pub fn new() -> Self {
        Self::with_store(MemorySettingsStore::new(valid_settings()))
    }

    pub fn with_store(store: MemorySettingsStore) -> Self {
        Self {
            fetcher: ScriptedFetcher::new(),
            store,
            log: RecordingLogSink::new(),
            clock: Arc::new(ManualClock::new(start_time())),
        }
    }

    /// Harness whose store already holds a check state
    pub fn with_check_state(check_state: CheckState) -> Self {
        Self::with_store(MemorySettingsStore::with_check_state(
            valid_settings(),
            check_state,
        ))
    }

    pub fn config() -> UpdaterConfig {
        UpdaterConfig::default()
            .with_echo_url(ECHO_URL)
            .with_poll_interval(std::time::Duration::from_secs(POLL_MINUTES as u64 * 60))
    }

    pub fn context(&self) -> UpdaterContext {
        UpdaterContext::new(self.fetcher.clone(), Arc::new(self.store.clone()))
            .with_log_sink(self.log.clone())
            .with_clock(self.clock.clone())
    }

    pub async fn updater(&self) -> DnsUpdater {
        DnsUpdater::new(self.context(), Self::config())
            .await
            .expect("updater construction succeeds")
    }

    /// Move time forward by one poll interval (plus a second)
    pub fn advance_interval(&self) {
        self.clock
            .advance(chrono::Duration::minutes(POLL_MINUTES) + chrono::Duration::seconds(1));
    }
}

/// Handle in-flight requests until none remain
pub async fn drain(updater: &mut DnsUpdater) {
    while updater.process_next_completion().await {}
}

pub fn valid_settings() -> DnsSettings {
    DnsSettings::new(ProviderId::DynDns, "home.example.com", "alice", "s3cret")
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn checkip_page(ip: &str) -> String {
    format!(
        "<html><head><title>Current IP Check</title></head>\
         <body>Current IP Address: {}</body></html>\r\n",
        ip
    )
}
