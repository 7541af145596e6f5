// # dyndnsd - Dynamic DNS Daemon
//
// The dyndnsd daemon is a thin integration layer responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the reqwest fetcher and the file settings store into the updater
// 4. Running the updater until SIGTERM/SIGINT
//
// All update logic lives in dyndns-core.
//
// ## Configuration
//
// ### Settings File
// - `DYNDNS_SETTINGS_PATH`: JSON settings file (required)
//
// ### Settings Seeds
// Written into the settings file at startup when set:
// - `DYNDNS_SERVICE`: Provider (dyndns, noip)
// - `DYNDNS_DOMAIN`: Hostname to keep updated
// - `DYNDNS_USERNAME`: Account username
// - `DYNDNS_PASSWORD`: Account password
//
// ### Polling
// - `DYNDNS_POLL_INTERVAL_SECS`: Seconds between checks (60-86400, default 1800)
// - `DYNDNS_ECHO_URL`: Public IP echo endpoint (default http://checkip.dyndns.org)
//
// ### Logging
// - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DYNDNS_SETTINGS_PATH=/var/lib/dyndns/settings.json
// export DYNDNS_SERVICE=dyndns
// export DYNDNS_DOMAIN=home.example.com
// export DYNDNS_USERNAME=alice
// export DYNDNS_PASSWORD=secret
//
// dyndnsd
// ```

use anyhow::{Context, Result};
use dyndns_core::{
    DnsUpdater, FileSettingsStore, ProviderId, SettingsStore, UpdaterConfig, UpdaterContext,
};
use dyndns_http::ReqwestFetcher;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for the updater to save its state after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DyndnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default)]
struct Config {
    settings_path: PathBuf,
    service: Option<String>,
    domain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    poll_interval_secs: Option<u64>,
    echo_url: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            settings_path: env::var("DYNDNS_SETTINGS_PATH")
                .context("DYNDNS_SETTINGS_PATH is required")?
                .into(),
            service: env::var("DYNDNS_SERVICE").ok(),
            domain: env::var("DYNDNS_DOMAIN").ok(),
            username: env::var("DYNDNS_USERNAME").ok(),
            password: env::var("DYNDNS_PASSWORD").ok(),
            poll_interval_secs: env::var("DYNDNS_POLL_INTERVAL_SECS")
                .ok()
                .map(|s| {
                    s.trim().parse().with_context(|| {
                        format!("DYNDNS_POLL_INTERVAL_SECS is not a number: '{}'", s)
                    })
                })
                .transpose()?,
            echo_url: env::var("DYNDNS_ECHO_URL").ok(),
            log_level: env::var("DYNDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Credentials themselves are validated by the updater, which reports
    /// problems through its state instead of refusing to start.
    fn validate(&self) -> Result<()> {
        if self.settings_path.as_os_str().is_empty() {
            anyhow::bail!(
                "DYNDNS_SETTINGS_PATH cannot be empty. \
                Set it via: export DYNDNS_SETTINGS_PATH=/var/lib/dyndns/settings.json"
            );
        }

        if let Some(service) = &self.service {
            service
                .parse::<ProviderId>()
                .map_err(|_| {
                    anyhow::anyhow!(
                        "DYNDNS_SERVICE '{}' is not supported. Supported services: dyndns, noip",
                        service
                    )
                })?;
        }

        if let Some(interval) = self.poll_interval_secs
            && !(60..=86400).contains(&interval)
        {
            anyhow::bail!(
                "DYNDNS_POLL_INTERVAL_SECS must be between 60 and 86400 seconds. Got: {}",
                interval
            );
        }

        if let Some(url) = &self.echo_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!("DYNDNS_ECHO_URL must use HTTP or HTTPS scheme. Got: {}", url);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DYNDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn has_seeds(&self) -> bool {
        self.service.is_some()
            || self.domain.is_some()
            || self.username.is_some()
            || self.password.is_some()
    }

    fn updater_config(&self) -> UpdaterConfig {
        let mut config = UpdaterConfig::default();
        if let Some(secs) = self.poll_interval_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(url) = &self.echo_url {
            config = config.with_echo_url(url.clone());
        }
        config
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    info!("Starting dyndnsd {}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let updater = match start_updater(&config).await {
            Ok(updater) => updater,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DyndnsExitCode::ConfigError;
            }
        };

        match run_daemon(updater).await {
            Ok(()) => DyndnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DyndnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Open the settings file, apply seeds and construct the updater
async fn start_updater(config: &Config) -> Result<DnsUpdater> {
    let store = FileSettingsStore::new(&config.settings_path)
        .await
        .context("failed to open settings file")?;

    if config.has_seeds() {
        seed_settings(&store, config).await?;
    }

    let ctx = UpdaterContext::new(Arc::new(ReqwestFetcher::new()), Arc::new(store));
    let updater = DnsUpdater::new(ctx, config.updater_config())
        .await
        .context("failed to start updater")?;

    if let Some(settings) = updater.settings() {
        info!(
            service = %settings.service,
            domain = %settings.domain,
            state = ?updater.state(),
            "Updater initialized"
        );
    }

    Ok(updater)
}

/// Overlay the environment seeds on the stored settings and save them
async fn seed_settings(store: &FileSettingsStore, config: &Config) -> Result<()> {
    let mut settings = store.load_settings().await?;

    if let Some(service) = &config.service {
        settings.service = service.parse()?;
    }
    if let Some(domain) = &config.domain {
        settings.domain = domain.clone();
    }
    if let Some(username) = &config.username {
        settings.username = username.clone();
    }
    if let Some(password) = &config.password {
        settings.password = password.clone();
    }

    store.save_settings(&settings).await?;
    info!("Settings seeded from environment");
    Ok(())
}

/// Run the updater until a shutdown signal arrives
async fn run_daemon(updater: DnsUpdater) -> Result<()> {
    let handle = updater.handle();
    let mut task = tokio::spawn(updater.run());

    tokio::select! {
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
        }
        result = &mut task => {
            warn!("Updater stopped without a shutdown signal");
            return result.context("updater task panicked")?.map_err(Into::into);
        }
    }

    handle.shutdown();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(joined) => {
            joined.context("updater task panicked")??;
            info!("Shutdown complete");
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        )),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
