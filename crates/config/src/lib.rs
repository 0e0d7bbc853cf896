use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notes_core::ExportFormat;
use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 2;
pub const APP_DIR_NAME: &str = "legendary-notes";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub default_export_format: ExportFormat,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

fn default_log_filter() -> String {
    "info,notes_store=debug,notes_services=debug".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            data_dir: None,
            storage: StorageBackend::Sqlite,
            log_filter: default_log_filter(),
            default_export_format: ExportFormat::Markdown,
            export_dir: None,
        }
    }
}

impl AppConfig {
    /// Configured data dir, or `fallback` when unset.
    pub fn data_dir_or(&self, fallback: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    pub fn export_dir_or(&self, fallback: &Path) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

pub fn default_data_dir() -> PathBuf {
    let mut dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push(APP_DIR_NAME);
    dir
}

/// A loaded config plus the schema version it was migrated from, if any.
/// Callers report the migration once logging is up.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub migrated_from: Option<u32>,
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("config.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_init(&self) -> Result<LoadedConfig> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            return Ok(LoadedConfig {
                config,
                migrated_from: None,
            });
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).context("failed to parse app config json")?;
        let migrated_from = self.migrate(&mut config);
        if migrated_from.is_some() {
            self.save(&config)?;
        }
        Ok(LoadedConfig {
            config,
            migrated_from,
        })
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn migrate(&self, config: &mut AppConfig) -> Option<u32> {
        if config.schema_version >= CURRENT_SCHEMA_VERSION {
            return None;
        }

        let from = config.schema_version;
        // v1 had no log filter; serde filled in the default already
        if config.log_filter.trim().is_empty() {
            config.log_filter = default_log_filter();
        }
        config.schema_version = CURRENT_SCHEMA_VERSION;
        Some(from)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::from_dir(dir.path());
        let loaded = store.load_or_init().expect("load default");
        assert_eq!(loaded.migrated_from, None);
        let config = loaded.config;
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.default_export_format, ExportFormat::Markdown);
        assert!(store.path().exists());
    }

    #[test]
    fn migrates_older_schema_and_fills_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::from_dir(dir.path());
        fs::write(
            store.path(),
            r#"{"schema_version":1,"storage":"memory","default_export_format":"plain"}"#,
        )
        .expect("write v1 config");

        let loaded = store.load_or_init().expect("load v1");
        assert_eq!(loaded.migrated_from, Some(1));
        let config = loaded.config;
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.default_export_format, ExportFormat::Plain);
        assert_eq!(config.log_filter, "info,notes_store=debug,notes_services=debug");

        let reloaded = store.load_or_init().expect("reload");
        assert_eq!(reloaded.migrated_from, None);
        assert_eq!(reloaded.config.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn unset_dirs_fall_back() {
        let config = AppConfig::default();
        let fallback = Path::new("/tmp/notes");
        assert_eq!(config.data_dir_or(fallback), fallback);
        assert_eq!(config.export_dir_or(fallback), fallback);
    }
}
