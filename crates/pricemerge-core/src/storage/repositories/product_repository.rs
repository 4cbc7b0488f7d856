use rusqlite::{Connection, params};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::Product;

use super::Repository;

pub trait ProductRepository: Repository<Entity = Product, Id = i64> {
    fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteProductRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteProductRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_product(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            store_id: row.get(3)?,
            category_id: row.get(4)?,
        })
    }
}

impl<'a> Repository for SqliteProductRepository<'a> {
    type Entity = Product;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let result = self.conn.query_row(
            "SELECT id, name, price, store_id, category_id FROM products WHERE id = ?1",
            params![id],
            Self::row_to_product,
        );

        match result {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, product: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO products (id, name, price, store_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                product.id,
                product.name,
                product.price,
                product.store_id,
                product.category_id
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> ProductRepository for SqliteProductRepository<'a> {
    fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, price, store_id, category_id
             FROM products WHERE category_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![category_id], Self::row_to_product)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
