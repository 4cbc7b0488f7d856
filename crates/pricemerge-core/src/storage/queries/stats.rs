use rusqlite::Connection;
use serde::Serialize;
use std::sync::MutexGuard;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogStats {
    pub stores: usize,
    pub categories: usize,
    pub products: usize,
}

pub struct CatalogStatsQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> CatalogStatsQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    pub fn totals(&self) -> Result<CatalogStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(n as usize)
        };

        Ok(CatalogStats {
            stores: count("stores")?,
            categories: count("categories")?,
            products: count("products")?,
        })
    }
}
