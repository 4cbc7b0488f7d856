mod product_search;
mod stats;

pub use product_search::{ProductMatch, ProductSearchQuery};
pub use stats::{CatalogStats, CatalogStatsQuery};
