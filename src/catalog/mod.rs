//! Catalog Module
//!
//! Persistent, versioned catalogs and the bundle the pipeline reads from.

pub mod bootstrap;
pub mod store;

pub use store::{version_stamp, CatalogStore, StoredCatalog};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archetypes::library::{pattern_library, PatternDefinition};
use crate::archetypes::model::{BridgeConfig, HumanCatalog, SystemArchetypeCatalog};

/// Everything the pipeline consumes, read-only for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogs {
    pub human: HumanCatalog,
    pub bridge: BridgeConfig,
    pub system: SystemArchetypeCatalog,
    pub library: Vec<PatternDefinition>,
}

impl Catalogs {
    /// Bootstrap catalogs without touching disk
    pub fn builtin(now: DateTime<Utc>) -> Self {
        Self {
            human: bootstrap::human_catalog(now),
            bridge: bootstrap::bridge_config(now),
            system: bootstrap::system_catalog(now),
            library: pattern_library(),
        }
    }
}
