use rusqlite::{Connection, params};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::Store;

use super::Repository;

pub trait StoreRepository: Repository<Entity = Store, Id = i64> {
    fn list(&self) -> Result<Vec<Store>>;
}

pub struct SqliteStoreRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteStoreRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqliteStoreRepository<'a> {
    type Entity = Store;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let result = self.conn.query_row(
            "SELECT id, display_name FROM stores WHERE id = ?1",
            params![id],
            |row| {
                Ok(Store {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                })
            },
        );

        match result {
            Ok(store) => Ok(Some(store)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, store: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO stores (id, display_name) VALUES (?1, ?2)",
            params![store.id, store.display_name],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM stores WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> StoreRepository for SqliteStoreRepository<'a> {
    fn list(&self) -> Result<Vec<Store>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, display_name FROM stores ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Store {
                id: row.get(0)?,
                display_name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
