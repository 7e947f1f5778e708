//! Catalog Store
//!
//! JSON persistence for the three editable catalogs:
//!
//! ```text
//! <base>/<kind>/current.json
//! <base>/<kind>/history/<version>.json
//! ```
//!
//! An absent `current.json` is bootstrapped. Unparseable JSON is moved aside to
//! `current.json.bad` and bootstrapped; JSON that parses but fails validation is
//! an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::archetypes::library::pattern_library;
use crate::archetypes::model::{BridgeConfig, HumanCatalog, SystemArchetypeCatalog};
use crate::error::InputResult;

use super::bootstrap;
use super::Catalogs;

const CURRENT_FILE: &str = "current.json";
const HISTORY_DIR: &str = "history";
const VERSION_FORMAT: &str = "%Y-%m-%dT%H%M%S%z";

/// A versioned catalog the store can persist
pub trait StoredCatalog: Serialize + DeserializeOwned + Sized {
    /// Directory name under the store root
    const KIND: &'static str;

    fn bootstrap(now: DateTime<Utc>) -> Self;
    fn validated(self) -> InputResult<Self>;
    fn stamp(&mut self, version: String, updated_at: DateTime<Utc>);
}

impl StoredCatalog for HumanCatalog {
    const KIND: &'static str = "human_catalog";

    fn bootstrap(now: DateTime<Utc>) -> Self {
        bootstrap::human_catalog(now)
    }

    fn validated(self) -> InputResult<Self> {
        HumanCatalog::validated(self)
    }

    fn stamp(&mut self, version: String, updated_at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = updated_at;
    }
}

impl StoredCatalog for BridgeConfig {
    const KIND: &'static str = "bridge_config";

    fn bootstrap(now: DateTime<Utc>) -> Self {
        bootstrap::bridge_config(now)
    }

    fn validated(self) -> InputResult<Self> {
        BridgeConfig::validated(self)
    }

    fn stamp(&mut self, version: String, updated_at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = updated_at;
    }
}

impl StoredCatalog for SystemArchetypeCatalog {
    const KIND: &'static str = "system_archetypes";

    fn bootstrap(now: DateTime<Utc>) -> Self {
        bootstrap::system_catalog(now)
    }

    fn validated(self) -> InputResult<Self> {
        SystemArchetypeCatalog::validated(self)
    }

    fn stamp(&mut self, version: String, updated_at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = updated_at;
    }
}

/// Version string for a save at `at`, e.g. `2024-05-01T120000+0000`
pub fn version_stamp(at: DateTime<Utc>) -> String {
    at.format(VERSION_FORMAT).to_string()
}

/// Write via `<path>.tmp` and rename over the target.
async fn atomic_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

pub struct CatalogStore {
    base_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn current_path<T: StoredCatalog>(&self) -> PathBuf {
        self.base_dir.join(T::KIND).join(CURRENT_FILE)
    }

    pub fn history_dir<T: StoredCatalog>(&self) -> PathBuf {
        self.base_dir.join(T::KIND).join(HISTORY_DIR)
    }

    /// Raw JSON of `current.json`, `None` when absent or quarantined
    async fn read_current(&self, path: &Path) -> Result<Option<serde_json::Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let mut bad = path.as_os_str().to_owned();
                bad.push(".bad");
                warn!("Quarantining malformed catalog {}: {}", path.display(), e);
                if let Err(e) = fs::rename(path, PathBuf::from(bad)).await {
                    warn!("Could not quarantine {}: {}", path.display(), e);
                }
                Ok(None)
            }
        }
    }

    /// Load a catalog, bootstrapping (and saving) defaults when none is usable.
    pub async fn load<T: StoredCatalog>(&self) -> Result<T> {
        let path = self.current_path::<T>();
        let Some(raw) = self.read_current(&path).await? else {
            info!("Bootstrapping {} catalog at {}", T::KIND, path.display());
            return self.save(T::bootstrap(Utc::now())).await;
        };

        let catalog: T = serde_json::from_value(raw)
            .with_context(|| format!("Invalid {} catalog {}", T::KIND, path.display()))?;
        let catalog = catalog
            .validated()
            .with_context(|| format!("Invalid {} catalog {}", T::KIND, path.display()))?;
        debug!("Loaded {} catalog from {}", T::KIND, path.display());
        Ok(catalog)
    }

    /// Validate, stamp with the current time and persist (history snapshot first).
    pub async fn save<T: StoredCatalog>(&self, catalog: T) -> Result<T> {
        self.save_at(catalog, Utc::now()).await
    }

    pub async fn save_at<T: StoredCatalog>(&self, catalog: T, now: DateTime<Utc>) -> Result<T> {
        let mut catalog = catalog
            .validated()
            .with_context(|| format!("Refusing to save invalid {} catalog", T::KIND))?;
        let version = version_stamp(now);
        catalog.stamp(version.clone(), now);

        let content = serde_json::to_string_pretty(&catalog)?;
        atomic_write(&self.history_dir::<T>().join(format!("{}.json", version)), &content).await?;
        atomic_write(&self.current_path::<T>(), &content).await?;
        debug!("Saved {} catalog version {}", T::KIND, version);
        Ok(catalog)
    }

    pub async fn load_human_catalog(&self) -> Result<HumanCatalog> {
        self.load().await
    }

    pub async fn save_human_catalog(&self, catalog: HumanCatalog) -> Result<HumanCatalog> {
        self.save(catalog).await
    }

    pub async fn load_bridge_config(&self) -> Result<BridgeConfig> {
        self.load().await
    }

    pub async fn save_bridge_config(&self, config: BridgeConfig) -> Result<BridgeConfig> {
        self.save(config).await
    }

    pub async fn load_system_archetypes(&self) -> Result<SystemArchetypeCatalog> {
        self.load().await
    }

    pub async fn save_system_archetypes(&self, catalog: SystemArchetypeCatalog) -> Result<SystemArchetypeCatalog> {
        self.save(catalog).await
    }

    /// Every catalog the pipeline reads, plus the built-in pattern library.
    pub async fn load_all(&self) -> Result<Catalogs> {
        Ok(Catalogs {
            human: self.load_human_catalog().await?,
            bridge: self.load_bridge_config().await?,
            system: self.load_system_archetypes().await?,
            library: pattern_library(),
        })
    }
}
