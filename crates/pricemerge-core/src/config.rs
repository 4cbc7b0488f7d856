use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterThresholds;
use crate::error::Result;

/// Root application configuration, loaded from
/// `~/.config/pricemerge/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub consolidation: ConsolidationConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the consolidated catalog database.
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Source whose category taxonomy is canonical as-is.
    pub base_source: String,
    /// Lower bound of the fuzzy product-grouping interval (inclusive).
    /// Known deployments ran with both 50 and 60 here; the default is
    /// 50 and the choice stays configurable.
    pub similar_min: u32,
    /// Upper bound of the fuzzy product-grouping interval (exclusive).
    pub similar_max: u32,
    /// Minimum category similarity for merging a non-base category
    /// onto the base taxonomy.
    pub category_merge_threshold: u32,
}

/// One scraped source: identity plus where its raw records live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub display_name: String,
    pub db_path: String,
    pub table: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            consolidation: ConsolidationConfig::default(),
            sources: vec![
                SourceConfig {
                    id: "okey".to_string(),
                    display_name: "Окей".to_string(),
                    db_path: "parsers/okey_products.db".to_string(),
                    table: "okey_products".to_string(),
                },
                SourceConfig {
                    id: "svetofor".to_string(),
                    display_name: "Светофор".to_string(),
                    db_path: "parsers/svetofor_products.db".to_string(),
                    table: "svetofor_products".to_string(),
                },
            ],
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pricemerge");
        Self {
            db_path: data_dir.join("catalog.db").to_string_lossy().to_string(),
        }
    }
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            base_source: "okey".to_string(),
            similar_min: 50,
            similar_max: 95,
            category_merge_threshold: 75,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/pricemerge/config.toml`
    pub fn config_path() -> PathBuf {
        // Allow override via env var
        if let Ok(path) = std::env::var("PRICEMERGE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pricemerge")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived values ────────────────────────────────────

    pub fn catalog_db_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.db_path)
    }

    pub fn cluster_thresholds(&self) -> ClusterThresholds {
        ClusterThresholds {
            similar_min: self.consolidation.similar_min,
            similar_max: self.consolidation.similar_max,
        }
    }
}
