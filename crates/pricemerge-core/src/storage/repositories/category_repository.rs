use rusqlite::{Connection, params};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::Category;

use super::Repository;

pub trait CategoryRepository: Repository<Entity = Category, Id = i64> {
    fn list(&self) -> Result<Vec<Category>>;
}

pub struct SqliteCategoryRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteCategoryRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqliteCategoryRepository<'a> {
    type Entity = Category;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let result = self.conn.query_row(
            "SELECT id, canonical_name FROM categories WHERE id = ?1",
            params![id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    canonical_name: row.get(1)?,
                })
            },
        );

        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, category: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO categories (id, canonical_name) VALUES (?1, ?2)",
            params![category.id, category.canonical_name],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> CategoryRepository for SqliteCategoryRepository<'a> {
    fn list(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, canonical_name FROM categories ORDER BY canonical_name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                canonical_name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
