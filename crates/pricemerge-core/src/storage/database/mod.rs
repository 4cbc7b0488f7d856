mod connection;
mod schema;

pub use connection::ConnectionPool;
pub use schema::{apply_pragmas, create_indexes, create_tables, init_schema};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rusqlite::params;
use tracing::info;

use crate::cluster::{CategoryView, ClusterThresholds, cluster_category};
use crate::error::{CatalogError, Result};
use crate::models::{Category, Product, Store};
use crate::pipeline::Catalog;

use super::queries::{CatalogStats, CatalogStatsQuery, ProductMatch, ProductSearchQuery};
use super::repositories::{
    CategoryRepository, ProductRepository, Repository, SqliteCategoryRepository,
    SqliteProductRepository, SqliteStoreRepository, StoreRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        schema::init_schema(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        schema::init_schema(&conn)?;
    }
    Ok(pool)
}

/// Facade over the consolidated catalog database.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    /// Replace the entire catalog in one transaction.
    ///
    /// Full-rebuild semantics: previous Store/Category/Product rows are
    /// gone afterwards. Callers that must not expose partial state on
    /// failure go through [`write_catalog_atomic`] instead of calling
    /// this on the live database.
    pub fn replace_catalog(&self, catalog: &Catalog) -> Result<()> {
        let conn = self.pool.get_connection();
        conn.execute_batch(
            "BEGIN;
             DELETE FROM products;
             DELETE FROM categories;
             DELETE FROM stores;",
        )?;

        let result = (|| -> Result<()> {
            {
                let mut stmt = conn
                    .prepare("INSERT INTO stores (id, display_name) VALUES (?1, ?2)")?;
                for store in &catalog.stores {
                    stmt.execute(params![store.id, store.display_name])?;
                }
            }
            {
                let mut stmt = conn
                    .prepare("INSERT INTO categories (id, canonical_name) VALUES (?1, ?2)")?;
                for category in &catalog.categories {
                    stmt.execute(params![category.id, category.canonical_name])?;
                }
            }
            {
                let mut stmt = conn.prepare(
                    "INSERT INTO products (id, name, price, store_id, category_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for product in &catalog.products {
                    stmt.execute(params![
                        product.id,
                        product.name,
                        product.price,
                        product.store_id,
                        product.category_id
                    ])?;
                }
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK;");
                Err(e)
            }
        }
    }

    pub fn list_stores(&self) -> Result<Vec<Store>> {
        let conn = self.pool.get_connection();
        let repo = SqliteStoreRepository::new(conn);
        repo.list()
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.pool.get_connection();
        let repo = SqliteCategoryRepository::new(conn);
        repo.list()
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.pool.get_connection();
        let repo = SqliteCategoryRepository::new(conn);
        repo.find_by_id(&id)
    }

    pub fn products_in_category(&self, category_id: i64) -> Result<Vec<Product>> {
        let conn = self.pool.get_connection();
        let repo = SqliteProductRepository::new(conn);
        repo.list_by_category(category_id)
    }

    /// Grouped view of one category, computed on demand — nothing of
    /// the clustering result is persisted.
    pub fn category_view(
        &self,
        category_id: i64,
        thresholds: ClusterThresholds,
    ) -> Result<CategoryView> {
        if self.get_category(category_id)?.is_none() {
            return Err(CatalogError::CategoryNotFound(category_id));
        }

        let products = self.products_in_category(category_id)?;
        let stores: HashMap<i64, Store> = self
            .list_stores()?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(cluster_category(&products, &stores, thresholds))
    }

    pub fn search_products(&self, query: &str) -> Result<Vec<ProductMatch>> {
        let conn = self.pool.get_connection();
        let search = ProductSearchQuery::new(conn);
        search.contains(query)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let conn = self.pool.get_connection();
        let stats = CatalogStatsQuery::new(conn);
        stats.totals()
    }
}

/// Persist a catalog with an atomic swap.
///
/// The catalog is written to a staging file next to the target and the
/// staging file is renamed over the live one only after every row is
/// in. A failed run therefore leaves the previous catalog untouched.
pub fn write_catalog_atomic(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| CatalogError::ConfigError(format!("invalid catalog path: {path:?}")))?;
    let mut staging_name = file_name.to_os_string();
    staging_name.push(".staging");
    let staging = path.with_file_name(staging_name);

    if staging.exists() {
        fs::remove_file(&staging)?;
    }

    {
        let db = Database::open(&staging)?;
        db.replace_catalog(catalog)?;
    }

    fs::rename(&staging, path)?;
    info!(path = %path.display(), products = catalog.products.len(), "catalog swapped in");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_catalog() -> Catalog {
        Catalog {
            stores: vec![Store::new(1, "Окей"), Store::new(2, "Светофор")],
            categories: vec![Category::new(1, "Молочные продукты")],
            products: vec![
                Product::new(1, "Молоко 1л", 79.9, 1, 1),
                Product::new(2, "молоко 1л", 59.5, 2, 1),
                Product::new(3, "Кефир 1%", 65.0, 1, 1),
            ],
        }
    }

    #[test]
    fn test_replace_catalog_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.replace_catalog(&sample_catalog()).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.stores, 2);
        assert_eq!(stats.categories, 1);
        assert_eq!(stats.products, 3);

        let categories = db.list_categories().unwrap();
        assert_eq!(categories[0].canonical_name, "Молочные продукты");
    }

    #[test]
    fn test_replace_catalog_drops_previous_contents() {
        let db = Database::open_in_memory().unwrap();
        db.replace_catalog(&sample_catalog()).unwrap();

        let smaller = Catalog {
            stores: vec![Store::new(1, "Окей")],
            categories: vec![Category::new(1, "Бакалея")],
            products: vec![Product::new(1, "Рис 900г", 65.0, 1, 1)],
        };
        db.replace_catalog(&smaller).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.stores, 1);
        assert_eq!(stats.products, 1);
        assert_eq!(db.list_categories().unwrap()[0].canonical_name, "Бакалея");
    }

    #[test]
    fn test_category_view_groups_exact_match() {
        let db = Database::open_in_memory().unwrap();
        db.replace_catalog(&sample_catalog()).unwrap();

        let view = db.category_view(1, ClusterThresholds::default()).unwrap();
        assert_eq!(view.exact_multi_store.len(), 1);
        assert_eq!(view.exact_multi_store[0].members.len(), 2);
    }

    #[test]
    fn test_category_view_unknown_id() {
        let db = Database::open_in_memory().unwrap();
        db.replace_catalog(&sample_catalog()).unwrap();

        let err = db.category_view(99, ClusterThresholds::default()).unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(99)));
    }

    #[test]
    fn test_search_is_case_insensitive_for_cyrillic() {
        let db = Database::open_in_memory().unwrap();
        db.replace_catalog(&sample_catalog()).unwrap();

        let hits = db.search_products("МОЛОКО").unwrap();
        assert_eq!(hits.len(), 2);
        // Store-then-name ordering.
        assert_eq!(hits[0].store_name, "Окей");
        assert_eq!(hits[1].store_name, "Светофор");

        assert!(db.search_products("").unwrap().is_empty());
    }

    #[test]
    fn test_write_catalog_atomic_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");

        write_catalog_atomic(&path, &sample_catalog()).unwrap();
        assert!(path.exists());

        let smaller = Catalog {
            stores: vec![Store::new(1, "Окей")],
            categories: vec![Category::new(1, "Бакалея")],
            products: vec![Product::new(1, "Рис 900г", 65.0, 1, 1)],
        };
        write_catalog_atomic(&path, &smaller).unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.stats().unwrap().products, 1);
        assert!(!dir.path().join("catalog.db.staging").exists());
    }
}
