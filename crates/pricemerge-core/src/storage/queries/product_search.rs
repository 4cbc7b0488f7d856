use rusqlite::Connection;
use serde::Serialize;
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::Product;

/// One search hit with its store and category labels resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMatch {
    pub product: Product,
    pub store_name: String,
    pub category_name: String,
}

pub struct ProductSearchQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> ProductSearchQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    /// Case-insensitive substring match on product name over the whole
    /// catalog, ordered store-then-name.
    ///
    /// Case folding happens in Rust rather than through SQL `LIKE`,
    /// which only folds ASCII and would miss Cyrillic names.
    pub fn contains(&self, query: &str) -> Result<Vec<ProductMatch>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.price, p.store_id, p.category_id,
                    s.display_name, c.canonical_name
             FROM products p
             JOIN stores s     ON s.id = p.store_id
             JOIN categories c ON c.id = p.category_id
             ORDER BY s.display_name, p.name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ProductMatch {
                product: Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    price: row.get(2)?,
                    store_id: row.get(3)?,
                    category_id: row.get(4)?,
                },
                store_name: row.get(5)?,
                category_name: row.get(6)?,
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let hit = row?;
            if hit.product.name.to_lowercase().contains(&needle) {
                matches.push(hit);
            }
        }
        Ok(matches)
    }
}
