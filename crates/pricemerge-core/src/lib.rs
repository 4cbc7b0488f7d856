pub mod catmap;
pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod similarity;
pub mod storage;

pub use config::{AppConfig, CatalogConfig, ConsolidationConfig, SourceConfig};
pub use error::{CatalogError, Result};
pub use models::*;

pub use catmap::{CanonicalCategory, CategoryCatalog, build_canonical_categories};
pub use cluster::{CategoryView, ClusterThresholds, ProductGroup, cluster_category};
pub use normalize::{normalize, normalize_category, title_case};
pub use pipeline::{
    Catalog, ConsolidationOptions, ConsolidationReport, consolidate, run_pipeline,
};
pub use similarity::{category_similarity, similarity};

pub use storage::database::{ConnectionPool, Database, write_catalog_atomic};
pub use storage::queries::{CatalogStats, ProductMatch};
pub use storage::sources::read_source_records;
