use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in pricemerge-core.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Source database unavailable: {0}")]
    SourceUnavailable(PathBuf),

    #[error("Base source '{0}' is not among the configured sources")]
    MissingBaseSource(String),

    #[error("No usable category survived normalization in any source; refusing to build a catalog")]
    EmptyCanonicalCategorySet,

    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
