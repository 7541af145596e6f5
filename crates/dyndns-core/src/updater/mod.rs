//! Dynamic DNS updater
//!
//! The DnsUpdater is responsible for:
//! - Polling the public IP echo endpoint on a fixed interval
//! - Detecting changes against the last known IP
//! - Submitting provider updates and interpreting their replies
//! - Validating credentials and suspending itself when they are rejected
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!   PollTimer ──▶│  DnsUpdater  │◀── UpdaterHandle (settings changed, reset, shutdown)
//!                └──────────────┘
//!                        │
//!         ┌──────────────┼──────────────┬──────────────┐
//!         ▼              ▼              ▼              ▼
//! ┌─────────────┐ ┌─────────────┐ ┌──────────┐ ┌──────────────┐
//! │ HttpFetcher │ │SettingsStore│ │ LogSink  │ │ EchoParser   │
//! │ (echo/upd.) │ │ (creds/ip)  │ │ (notify) │ │ (echo body)  │
//! └─────────────┘ └─────────────┘ └──────────┘ └──────────────┘
//! ```
//!
//! ## State Machine
//!
//! - `Ok`: polling active, updates are submitted
//! - `InvalidCredentials`: polling stopped until the settings change
//! - `Fatal`: terminal until [`DnsUpdater::reset`]
//!
//! ## Threading
//!
//! All state lives in one task. HTTP requests run as spawned tasks whose
//! results come back through a `JoinSet` and are applied by the owning
//! task, so no locking is needed. Stopping the timer does not cancel a
//! request that is already in flight; its reply is still processed.

pub mod timer;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{CheckState, DnsSettings, UpdaterConfig};
use crate::echo::{CheckIpParser, EchoParser};
use crate::error::{Error, Result};
use crate::provider::build_update_url;
use crate::reply::ReplyCode;
use crate::traits::{
    Clock, HttpFetcher, LogSink, SettingsStore, Severity, SystemClock, TracingLogSink,
};

pub use timer::PollTimer;

/// Updater state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdaterState {
    /// Normal operation
    #[default]
    Ok,
    /// Credentials invalid or rejected; waiting for new settings
    InvalidCredentials,
    /// Provider refused service; waiting for an explicit reset
    Fatal,
}

/// Snapshot of the updater published to observers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdaterStatus {
    /// Current state
    pub state: UpdaterState,
    /// Last known public IP
    pub last_ip: Option<IpAddr>,
    /// When the last check or update was issued
    pub last_check: Option<DateTime<Utc>>,
    /// Whether the poll timer is running
    pub timer_active: bool,
}

/// Collaborators injected into the updater
#[derive(Clone)]
pub struct UpdaterContext {
    /// HTTP download facility
    pub fetcher: Arc<dyn HttpFetcher>,
    /// Settings and check state persistence
    pub store: Arc<dyn SettingsStore>,
    /// User-facing messages
    pub log: Arc<dyn LogSink>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Echo response parser
    pub echo_parser: Arc<dyn EchoParser>,
}

impl UpdaterContext {
    /// Create a context with the tracing log sink, system clock and checkip parser
    pub fn new(fetcher: Arc<dyn HttpFetcher>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            fetcher,
            store,
            log: Arc::new(TracingLogSink),
            clock: Arc::new(SystemClock),
            echo_parser: Arc::new(CheckIpParser),
        }
    }

    /// Use a different log sink
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Use a different clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different echo parser
    pub fn with_echo_parser(mut self, echo_parser: Arc<dyn EchoParser>) -> Self {
        self.echo_parser = echo_parser;
        self
    }
}

/// Result of a spawned request
enum Completion {
    Echo(Result<Vec<u8>>),
    Update(Result<Vec<u8>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    SettingsChanged,
    Reset,
    Shutdown,
}

/// Remote control for a running [`DnsUpdater`]
#[derive(Debug, Clone)]
pub struct UpdaterHandle {
    control_tx: mpsc::UnboundedSender<Control>,
    status_rx: watch::Receiver<UpdaterStatus>,
}

impl UpdaterHandle {
    /// Ask the updater to re-read its settings now
    pub fn settings_changed(&self) {
        let _ = self.control_tx.send(Control::SettingsChanged);
    }

    /// Leave `Fatal`/`InvalidCredentials` and start over with fresh settings
    pub fn reset(&self) {
        let _ = self.control_tx.send(Control::Reset);
    }

    /// Stop the updater; it saves its check state before returning from `run()`
    pub fn shutdown(&self) {
        let _ = self.control_tx.send(Control::Shutdown);
    }

    /// Latest published status
    pub fn status(&self) -> UpdaterStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<UpdaterStatus> {
        self.status_rx.clone()
    }
}

/// Dynamic DNS maintenance client
///
/// ## Lifecycle
///
/// 1. Create with [`DnsUpdater::new()`] (loads settings and check state)
/// 2. Optionally take an [`UpdaterHandle`] with [`DnsUpdater::handle()`]
/// 3. Drive with [`DnsUpdater::run()`] until shutdown
/// 4. On shutdown the check state is written back to the store
pub struct DnsUpdater {
    ctx: UpdaterContext,
    config: UpdaterConfig,

    state: UpdaterState,

    /// Settings as last read from the store
    settings: Option<DnsSettings>,

    last_ip: Option<IpAddr>,
    last_check: Option<DateTime<Utc>>,

    /// Drives public IP checks
    timer: PollTimer,

    /// Re-reads settings while in `InvalidCredentials`
    repair_timer: PollTimer,

    in_flight: JoinSet<Completion>,

    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: Option<mpsc::UnboundedReceiver<Control>>,
    status_tx: watch::Sender<UpdaterStatus>,
}

impl DnsUpdater {
    /// Create an updater
    ///
    /// Loads the persisted check state and the settings. Invalid settings
    /// put the updater in `InvalidCredentials` with polling stopped.
    /// Otherwise polling starts, and a check is issued right away if the
    /// last one is missing or older than the poll interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn new(ctx: UpdaterContext, config: UpdaterConfig) -> Result<Self> {
        let check_state = ctx.store.load_check_state().await?;
        let settings = ctx.store.load_settings().await?;

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(UpdaterStatus::default());

        let mut updater = Self {
            timer: PollTimer::new(config.poll_interval),
            repair_timer: PollTimer::new(config.poll_interval),
            ctx,
            config,
            state: UpdaterState::Ok,
            settings: None,
            last_ip: check_state.last_ip,
            last_check: check_state.last_check,
            in_flight: JoinSet::new(),
            control_tx,
            control_rx: Some(control_rx),
            status_tx,
        };

        let now = updater.ctx.clock.now();
        updater.timer.start(now);
        updater.apply_settings(settings);

        if updater.state == UpdaterState::Ok && updater.check_is_stale(now) {
            debug!("Last check missing or stale, checking immediately");
            updater.check_public_ip();
        }

        updater.publish_status();
        Ok(updater)
    }

    /// Get a handle for controlling the updater once it runs
    pub fn handle(&self) -> UpdaterHandle {
        UpdaterHandle {
            control_tx: self.control_tx.clone(),
            status_rx: self.status_tx.subscribe(),
        }
    }

    /// Current state
    pub fn state(&self) -> UpdaterState {
        self.state
    }

    /// Last known public IP
    pub fn last_ip(&self) -> Option<IpAddr> {
        self.last_ip
    }

    /// When the last check or update was issued
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Whether the poll timer is running
    pub fn is_timer_active(&self) -> bool {
        self.timer.is_active()
    }

    /// Settings as last read from the store
    pub fn settings(&self) -> Option<&DnsSettings> {
        self.settings.as_ref()
    }

    /// Number of requests still in flight
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// Snapshot of the current status
    pub fn status(&self) -> UpdaterStatus {
        UpdaterStatus {
            state: self.state,
            last_ip: self.last_ip,
            last_check: self.last_check,
            timer_active: self.timer.is_active(),
        }
    }

    /// Issue a public IP echo request
    ///
    /// Only valid in the `Ok` state. The attempt time is recorded when the
    /// request is issued, so a hung request cannot cause a burst of checks.
    pub fn check_public_ip(&mut self) {
        if self.state != UpdaterState::Ok {
            warn!(state = ?self.state, "Public IP check requested while updates are suspended");
            return;
        }

        debug!(url = %self.config.echo_url, "Checking public IP");
        let fetcher = Arc::clone(&self.ctx.fetcher);
        let url = self.config.echo_url.clone();
        let user_agent = self.config.user_agent.clone();
        self.in_flight
            .spawn(async move { Completion::Echo(fetcher.fetch(&url, &user_agent).await) });

        self.last_check = Some(self.ctx.clock.now());
    }

    /// Handle the result of an echo request
    ///
    /// Transport and parse failures are logged and otherwise ignored; the
    /// next tick tries again.
    pub fn on_echo_finished(&mut self, result: Result<Vec<u8>>) {
        let body = match result {
            Ok(body) => body,
            Err(e) => {
                warn!("IP request failed: {}", e);
                return;
            }
        };

        if self.state != UpdaterState::Ok {
            debug!(state = ?self.state, "Ignoring echo response, updates are suspended");
            return;
        }

        let body = String::from_utf8_lossy(&body);
        let ip = match self.ctx.echo_parser.extract_ip(&body) {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Failed to read public IP from echo response: {}", e);
                return;
            }
        };

        if self.last_ip == Some(ip) {
            debug!(%ip, "Public IP unchanged");
            return;
        }

        info!(
            "Public IP changed: {} -> {}",
            self.last_ip
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            ip
        );
        self.last_ip = Some(ip);
        self.submit_update(ip);
    }

    /// Send the provider update request for `ip`
    fn submit_update(&mut self, ip: IpAddr) {
        let Some(settings) = self.settings.as_ref() else {
            warn!("No dynamic DNS settings loaded, skipping update");
            return;
        };
        let Some(descriptor) = settings.service.descriptor() else {
            warn!("No dynamic DNS service selected, skipping update");
            return;
        };

        let url = match build_update_url(descriptor, settings, ip) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build update URL: {}", e);
                return;
            }
        };

        debug!(
            host = descriptor.update_host,
            hostname = %settings.domain,
            %ip,
            "Submitting dynamic DNS update"
        );

        self.last_check = Some(self.ctx.clock.now());
        let fetcher = Arc::clone(&self.ctx.fetcher);
        let user_agent = self.config.user_agent.clone();
        self.in_flight.spawn(async move {
            Completion::Update(fetcher.fetch(url.as_str(), &user_agent).await)
        });
    }

    /// Handle the result of an update request
    pub fn on_update_finished(&mut self, result: Result<Vec<u8>>) {
        match result {
            Ok(body) => {
                self.process_update_reply(&String::from_utf8_lossy(&body));
            }
            Err(e) => warn!("IP update failed: {}", e),
        }
    }

    /// Interpret an update reply and apply its policy
    pub fn process_update_reply(&mut self, reply: &str) -> ReplyCode {
        let code = ReplyCode::parse(reply);
        let policy = code.policy();
        debug!(%code, ?policy, "Update reply");

        if let ReplyCode::Unknown(_) = code {
            warn!(reply = %reply.trim(), "Unrecognized dynamic DNS reply");
        }

        self.ctx.log.add_message(&code.message(), policy.severity);

        if policy.clear_ip {
            self.last_ip = None;
        }
        if policy.stop_timer {
            self.timer.stop();
        }
        if let Some(next) = policy.transition {
            self.enter_state(next);
        }

        code
    }

    /// Compare `settings` against the cached copy and re-validate on change
    ///
    /// Ignored while `Fatal`. Invalid settings stop polling and enter
    /// `InvalidCredentials`; valid settings received in that state resume
    /// polling with an immediate check.
    pub fn apply_settings(&mut self, settings: DnsSettings) {
        if self.state == UpdaterState::Fatal {
            debug!("Updater is in fatal state, ignoring settings change");
            return;
        }
        if self.settings.as_ref() == Some(&settings) {
            return;
        }

        let validation = settings.validate();
        self.settings = Some(settings);

        if let Err(e) = validation {
            self.ctx
                .log
                .add_message(&format!("Dynamic DNS error: {}.", e), Severity::Critical);
            self.last_ip = None;
            self.timer.stop();
            self.enter_state(UpdaterState::InvalidCredentials);
            return;
        }

        if self.state == UpdaterState::InvalidCredentials {
            info!("Dynamic DNS settings changed, resuming updates");
            self.enter_state(UpdaterState::Ok);
            self.timer.start(self.ctx.clock.now());
            self.check_public_ip();
        }
    }

    /// Re-read settings from the store and apply them
    pub async fn refresh_settings(&mut self) {
        if self.state == UpdaterState::Fatal {
            return;
        }

        match self.ctx.store.load_settings().await {
            Ok(settings) => self.apply_settings(settings),
            Err(e) => warn!("Failed to reload dynamic DNS settings: {}", e),
        }
    }

    /// Fire whichever timers are due according to the clock
    pub async fn poll_timers(&mut self) {
        let now = self.ctx.clock.now();

        if self.timer.fire(now) {
            self.refresh_settings().await;
            if self.state == UpdaterState::Ok && self.timer.is_active() {
                self.check_public_ip();
            }
        }

        if self.repair_timer.fire(now) {
            self.refresh_settings().await;
        }

        self.publish_status();
    }

    /// Wait for the next in-flight request and handle its result
    ///
    /// Returns `false` if nothing was in flight.
    pub async fn process_next_completion(&mut self) -> bool {
        match self.in_flight.join_next().await {
            Some(joined) => {
                self.handle_joined(joined);
                true
            }
            None => false,
        }
    }

    /// Clear every error state and start over with freshly loaded settings
    pub async fn reset(&mut self) {
        info!(from = ?self.state, "Resetting dynamic DNS updater");

        self.state = UpdaterState::Ok;
        self.repair_timer.stop();
        self.settings = None;
        self.last_ip = None;
        self.timer.start(self.ctx.clock.now());

        self.refresh_settings().await;
        if self.state == UpdaterState::Ok {
            self.check_public_ip();
        }

        self.publish_status();
    }

    /// Stop polling, drop in-flight requests and persist the check state
    pub async fn shutdown(&mut self) -> Result<()> {
        self.timer.stop();
        self.repair_timer.stop();
        self.in_flight.abort_all();

        let check_state = CheckState {
            last_check: self.last_check,
            last_ip: self.last_ip,
        };
        self.ctx.store.save_check_state(&check_state).await?;
        self.publish_status();

        info!("Check state saved, updater stopped");
        Ok(())
    }

    /// Run until [`UpdaterHandle::shutdown`] is called
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown, check state saved
    /// - `Err(Error)`: The check state could not be saved
    pub async fn run(mut self) -> Result<()> {
        let Some(mut control_rx) = self.control_rx.take() else {
            return Err(Error::Other("updater is already running".to_string()));
        };

        info!(
            state = ?self.state,
            interval = ?self.config.poll_interval,
            "Dynamic DNS updater running"
        );

        loop {
            let wait = self.next_deadline();

            tokio::select! {
                Some(joined) = self.in_flight.join_next() => {
                    self.handle_joined(joined);
                }

                _ = sleep_for(wait) => {
                    self.poll_timers().await;
                }

                control = control_rx.recv() => match control {
                    Some(Control::SettingsChanged) => {
                        self.refresh_settings().await;
                        self.publish_status();
                    }
                    Some(Control::Reset) => self.reset().await,
                    Some(Control::Shutdown) | None => {
                        info!("Shutdown requested");
                        break;
                    }
                },
            }
        }

        self.shutdown().await
    }

    fn handle_joined(&mut self, joined: std::result::Result<Completion, JoinError>) {
        match joined {
            Ok(Completion::Echo(result)) => self.on_echo_finished(result),
            Ok(Completion::Update(result)) => self.on_update_finished(result),
            Err(e) => error!("Request task failed: {}", e),
        }
        self.publish_status();
    }

    fn enter_state(&mut self, next: UpdaterState) {
        if self.state == next {
            return;
        }
        if self.state == UpdaterState::Fatal {
            debug!(?next, "Fatal state is sticky, ignoring transition");
            return;
        }

        info!("Updater state: {:?} -> {:?}", self.state, next);
        self.state = next;

        if next == UpdaterState::InvalidCredentials {
            self.repair_timer.start(self.ctx.clock.now());
        } else {
            self.repair_timer.stop();
        }
    }

    fn check_is_stale(&self, now: DateTime<Utc>) -> bool {
        let interval = chrono::Duration::from_std(self.config.poll_interval)
            .unwrap_or_else(|_| chrono::Duration::weeks(52));
        self.last_check.is_none_or(|last| now - last > interval)
    }

    fn next_deadline(&self) -> Option<Duration> {
        let now = self.ctx.clock.now();
        match (self.timer.remaining(now), self.repair_timer.remaining(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
