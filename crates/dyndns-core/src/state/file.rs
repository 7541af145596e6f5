// # File Settings Store
//
// File-based implementation of SettingsStore with crash recovery.
//
// ## Purpose
//
// Keeps the dynamic DNS settings and the last check result in one JSON
// document, so the last known IP survives daemon restarts. The file is
// re-read on every `load_settings()` call, which lets an operator edit the
// credentials while the daemon runs.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "settings": {
//     "service": "dyndns",
//     "domain": "home.example.com",
//     "username": "user",
//     "password": "secret"
//   },
//   "check_state": {
//     "last_check": "2025-01-09T12:00:00Z",
//     "last_ip": "203.0.113.9"
//   }
// }
// ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::{CheckState, DnsSettings};
use crate::traits::settings_store::SettingsStore;

/// Settings file format version
const SETTINGS_FILE_VERSION: &str = "1.0";

/// Serializable settings file format
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct SettingsFileFormat {
    version: String,
    #[serde(default)]
    settings: DnsSettings,
    #[serde(default)]
    check_state: CheckState,
}

/// Why a settings file could not be loaded
enum LoadFailure {
    /// The file could not be read
    Io(Error),
    /// The file was read but is not valid JSON
    Corrupt(Error),
}

/// File-based settings store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::{FileSettingsStore, SettingsStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSettingsStore::new("/var/lib/dyndns/settings.json").await?;
///
///     let settings = store.load_settings().await?;
///     println!("Updating {}", settings.domain);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    cache: Arc<RwLock<SettingsFileFormat>>,
}

impl FileSettingsStore {
    /// Create or load a file settings store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing settings file
    /// 3. If corruption is detected, try to load from backup
    /// 4. If both fail, start with empty settings
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create settings directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let contents = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            cache: Arc::new(RwLock::new(contents)),
        })
    }

    /// Replace the stored settings and write them to disk
    ///
    /// The stored check state is kept as it currently is on disk.
    pub async fn save_settings(&self, settings: &DnsSettings) -> Result<(), Error> {
        self.update_file(|contents| contents.settings = settings.clone()).await
    }

    /// Apply `edit` to the current file contents and write the result
    ///
    /// The file is re-read under the write lock, so fields edited outside
    /// this store since the last load are preserved. An unreadable file
    /// falls back to the cached contents.
    async fn update_file<F>(&self, edit: F) -> Result<(), Error>
    where
        F: FnOnce(&mut SettingsFileFormat),
    {
        let mut guard = self.cache.write().await;

        match Self::load_file(&self.path).await {
            Ok(current) => *guard = current,
            Err(LoadFailure::Io(e) | LoadFailure::Corrupt(e)) => {
                tracing::warn!("Rewriting settings file from cache: {}", e);
            }
        }

        edit(&mut guard);
        self.write_file(&guard).await
    }

    /// Load the file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main settings file
    /// 2. If JSON parse error, try loading backup
    /// 3. If backup also fails, start with empty settings
    async fn load_with_recovery(path: &Path) -> Result<SettingsFileFormat, Error> {
        let e = match Self::load_file(path).await {
            Ok(contents) => return Ok(contents),
            Err(LoadFailure::Io(e)) => return Err(e),
            Err(LoadFailure::Corrupt(e)) => e,
        };

        tracing::warn!(
            "Settings file appears corrupted: {}. Attempting recovery from backup.",
            e
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty settings.");
            return Ok(Self::empty());
        }

        match Self::load_file(&backup_path).await {
            Ok(contents) => {
                tracing::info!("Recovered settings from backup");
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(
                        "Failed to restore settings file from backup: {}",
                        restore_err
                    );
                }
                Ok(contents)
            }
            Err(LoadFailure::Io(backup_err) | LoadFailure::Corrupt(backup_err)) => {
                tracing::error!(
                    "Backup also unusable: {}. Starting with empty settings.",
                    backup_err
                );
                Ok(Self::empty())
            }
        }
    }

    /// Load the settings file, treating a missing file as empty
    async fn load_file(path: &Path) -> Result<SettingsFileFormat, LoadFailure> {
        if !path.exists() {
            tracing::debug!("Settings file does not exist: {}", path.display());
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Io(Error::settings(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            )))
        })?;

        let contents: SettingsFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(Error::settings(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            )))
        })?;

        if contents.version != SETTINGS_FILE_VERSION {
            tracing::warn!(
                "Settings file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                SETTINGS_FILE_VERSION,
                contents.version
            );
        }

        Ok(contents)
    }

    /// Write the file atomically, keeping a backup of the previous version
    async fn write_file(&self, contents: &SettingsFileFormat) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(contents)
            .map_err(|e| Error::settings(format!("Failed to serialize settings: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::settings(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::settings(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::settings(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::settings(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Settings written to file: {}", self.path.display());
        Ok(())
    }

    fn empty() -> SettingsFileFormat {
        SettingsFileFormat {
            version: SETTINGS_FILE_VERSION.to_string(),
            ..Default::default()
        }
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load_settings(&self) -> Result<DnsSettings, Error> {
        match Self::load_file(&self.path).await {
            Ok(contents) => {
                let settings = contents.settings.clone();
                *self.cache.write().await = contents;
                Ok(settings)
            }
            Err(LoadFailure::Io(e) | LoadFailure::Corrupt(e)) => {
                tracing::warn!("Using cached settings: {}", e);
                Ok(self.cache.read().await.settings.clone())
            }
        }
    }

    async fn load_check_state(&self) -> Result<CheckState, Error> {
        Ok(self.cache.read().await.check_state.clone())
    }

    async fn save_check_state(&self, state: &CheckState) -> Result<(), Error> {
        self.update_file(|contents| contents.check_state = state.clone()).await
    }
}
