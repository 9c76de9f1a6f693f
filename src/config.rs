//! Store configuration.
//!
//! Loaded from a JSON file split into `resource`, `general`, `privacy` and
//! `lock` sections. Every field has a default, so a partial file (or no file
//! at all) is valid. Relative resource paths resolve against `data_dir`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HISTORY_RETENTION_SECS, DEFAULT_LINKS_PER_PAGE};
use crate::lock::{LockSettings, LockTimeoutPolicy};
use crate::types::Visibility;
use crate::{LinkshelfError, Result};

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Datastore envelope.
    pub datastore: PathBuf,
    /// Names of migrations already applied.
    pub updates: PathBuf,
    /// JSON history log.
    pub history: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            datastore: PathBuf::from("datastore.bin"),
            updates: PathBuf::from("updates.txt"),
            history: PathBuf::from("history.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub links_per_page: usize,
    /// Visibility applied when a request leaves it unset.
    pub default_visibility: Visibility,
    pub history_retention_secs: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            links_per_page: DEFAULT_LINKS_PER_PAGE,
            default_visibility: Visibility::All,
            history_retention_secs: DEFAULT_HISTORY_RETENTION_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Anonymous callers get an empty datastore instead of the public links.
    pub hide_public_links: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    pub resource: ResourceConfig,
    pub general: GeneralConfig,
    pub privacy: PrivacyConfig,
    pub lock: LockSettings,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            resource: ResourceConfig::default(),
            general: GeneralConfig::default(),
            privacy: PrivacyConfig::default(),
            lock: LockSettings::default(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Read a JSON configuration file. A missing file yields the defaults.
    /// A relative `data_dir` is taken relative to the file's directory.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read(path) {
            Ok(bytes) => serde_json::from_slice::<Self>(&bytes).map_err(|err| {
                LinkshelfError::Config {
                    reason: format!("could not parse {}: {err}", path.display()).into(),
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(config.path = %path.display(), "config file missing, using defaults");
                Self::default()
            }
            Err(err) => return Err(err.into()),
        };
        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON, replacing `path` atomically.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let json = serde_json::to_vec_pretty(self)?;
        let mut file = AtomicWriteFile::open(path.as_ref())?;
        file.write_all(&json)?;
        file.commit()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.links_per_page == 0 {
            return Err(LinkshelfError::Config {
                reason: "general.links_per_page must be at least 1".into(),
            });
        }
        if self.general.history_retention_secs <= 0 {
            return Err(LinkshelfError::Config {
                reason: "general.history_retention_secs must be positive".into(),
            });
        }
        for (name, path) in [
            ("resource.datastore", &self.resource.datastore),
            ("resource.updates", &self.resource.updates),
            ("resource.history", &self.resource.history),
        ] {
            if path.as_os_str().is_empty() {
                return Err(LinkshelfError::Config {
                    reason: format!("{name} must not be empty").into(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn datastore_path(&self) -> PathBuf {
        self.resolve(&self.resource.datastore)
    }

    #[must_use]
    pub fn updates_path(&self) -> PathBuf {
        self.resolve(&self.resource.updates)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.resolve(&self.resource.history)
    }

    #[must_use]
    pub fn history_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.general.history_retention_secs)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    inner: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.inner.data_dir = dir.into();
        self
    }

    pub fn datastore<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.resource.datastore = path.into();
        self
    }

    pub fn updates<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.resource.updates = path.into();
        self
    }

    pub fn history<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.resource.history = path.into();
        self
    }

    #[must_use]
    pub fn links_per_page(mut self, links_per_page: usize) -> Self {
        self.inner.general.links_per_page = links_per_page;
        self
    }

    #[must_use]
    pub fn default_visibility(mut self, visibility: Visibility) -> Self {
        self.inner.general.default_visibility = visibility;
        self
    }

    #[must_use]
    pub fn hide_public_links(mut self, hide: bool) -> Self {
        self.inner.privacy.hide_public_links = hide;
        self
    }

    #[must_use]
    pub fn lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.inner.lock.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn on_lock_timeout(mut self, policy: LockTimeoutPolicy) -> Self {
        self.inner.lock.on_timeout = policy;
        self
    }

    pub fn build(self) -> Result<StoreConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults_under_its_directory() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::from_json_file(dir.path().join("config.json")).unwrap();
        assert_eq!(config.general.links_per_page, DEFAULT_LINKS_PER_PAGE);
        assert_eq!(config.lock.timeout_ms, 250);
        assert_eq!(
            config.datastore_path(),
            dir.path().join("data").join("datastore.bin")
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            br#"{"privacy": {"hide_public_links": true}, "lock": {"on_timeout": "fail"}}"#,
        )
        .unwrap();

        let config = StoreConfig::from_json_file(&path).unwrap();
        assert!(config.privacy.hide_public_links);
        assert_eq!(config.lock.on_timeout, LockTimeoutPolicy::Fail);
        assert_eq!(config.lock.timeout_ms, 250);
        assert_eq!(config.resource.updates, PathBuf::from("updates.txt"));
    }

    #[test]
    fn absolute_resource_paths_are_kept() {
        let config = StoreConfig::builder()
            .data_dir("/srv/links")
            .history("/var/log/links-history.json")
            .build()
            .unwrap();
        assert_eq!(config.datastore_path(), PathBuf::from("/srv/links/datastore.bin"));
        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/log/links-history.json")
        );
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = StoreConfig::builder().links_per_page(0).build().unwrap_err();
        assert!(matches!(err, LinkshelfError::Config { .. }));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = StoreConfig::builder()
            .data_dir(dir.path())
            .links_per_page(50)
            .default_visibility(Visibility::Public)
            .build()
            .unwrap();
        config.to_json_file(&path).unwrap();
        assert_eq!(StoreConfig::from_json_file(&path).unwrap(), config);
    }
}
