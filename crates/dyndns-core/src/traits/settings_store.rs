// # Settings Store Trait
//
// Defines the interface to persisted configuration.
//
// ## Purpose
//
// The store provides two things:
// - The user's dynamic DNS settings (service, domain, credentials)
// - The result of the last check (timestamp and last known IP)
//
// Settings are read at startup and on every poll tick, so edits made while
// the updater runs are picked up. The check state is read once at startup
// and written back at shutdown.
//
// ## Implementations
//
// - In-memory: `MemorySettingsStore`
// - File-based: `FileSettingsStore` (JSON)
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::SettingsStore;
//
// let settings = store.load_settings().await?;
// let mut check = store.load_check_state().await?;
// check.last_ip = Some("203.0.113.9".parse()?);
// store.save_check_state(&check).await?;
// ```

use async_trait::async_trait;

use crate::config::{CheckState, DnsSettings};

/// Trait for settings store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// ## Implementation Guidelines
///
/// - **Async I/O only**: Use async file/database operations, never blocking I/O
/// - **Fresh reads**: `load_settings()` must reflect external edits
/// - **No business logic**: Validation belongs to the updater
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the current dynamic DNS settings
    ///
    /// # Returns
    ///
    /// - `Ok(DnsSettings)`: The settings (defaults if none were saved)
    /// - `Err(Error)`: Storage error
    async fn load_settings(&self) -> Result<DnsSettings, crate::Error>;

    /// Read the persisted check state
    ///
    /// # Returns
    ///
    /// - `Ok(CheckState)`: The saved state (empty if none was saved)
    /// - `Err(Error)`: Storage error
    async fn load_check_state(&self) -> Result<CheckState, crate::Error>;

    /// Persist the check state
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully written
    /// - `Err(Error)`: Storage error
    async fn save_check_state(&self, state: &CheckState) -> Result<(), crate::Error>;
}
