// # Memory Settings Store
//
// In-memory implementation of SettingsStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for embedding the updater in an application that
// keeps its own configuration and pushes edits through `set_settings`.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - First run after a restart has no last check, so it checks immediately

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::{CheckState, DnsSettings};
use crate::traits::settings_store::SettingsStore;

#[derive(Debug, Default)]
struct Inner {
    settings: DnsSettings,
    check_state: CheckState,
}

/// In-memory settings store implementation
///
/// Clones share the same underlying data, so a test or host application
/// can keep a clone and edit settings while the updater runs.
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::{DnsSettings, MemorySettingsStore, ProviderId, SettingsStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySettingsStore::new(DnsSettings::new(
///         ProviderId::DynDns,
///         "home.example.com",
///         "user",
///         "secret",
///     ));
///
///     let settings = store.load_settings().await?;
///     assert_eq!(settings.domain, "home.example.com");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemorySettingsStore {
    /// Create a store holding `settings` and no check state
    pub fn new(settings: DnsSettings) -> Self {
        Self::with_check_state(settings, CheckState::default())
    }

    /// Create a store holding `settings` and a previous check state
    pub fn with_check_state(settings: DnsSettings, check_state: CheckState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                settings,
                check_state,
            })),
        }
    }

    /// Replace the settings
    pub async fn set_settings(&self, settings: DnsSettings) {
        self.inner.write().await.settings = settings;
    }

    /// The last saved check state
    pub async fn check_state(&self) -> CheckState {
        self.inner.read().await.check_state.clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_settings(&self) -> Result<DnsSettings, Error> {
        Ok(self.inner.read().await.settings.clone())
    }

    async fn load_check_state(&self) -> Result<CheckState, Error> {
        Ok(self.inner.read().await.check_state.clone())
    }

    async fn save_check_state(&self, state: &CheckState) -> Result<(), Error> {
        self.inner.write().await.check_state = state.clone();
        Ok(())
    }
}
