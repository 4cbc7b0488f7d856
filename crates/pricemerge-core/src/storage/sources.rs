//! Readers for the per-source databases the scrapers leave behind.
//!
//! Each scraper writes one SQLite file with a single table of
//! `(category, name, price, url)` rows. The engine only ever reads
//! these files; a missing or unreadable one aborts the run before any
//! catalog write.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::error::{CatalogError, Result};
use crate::models::RawRecord;

fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        Value::Real(real) => real.to_string(),
        Value::Integer(int) => int.to_string(),
        Value::Blob(_) | Value::Null => String::new(),
    }
}

/// Read all raw records of one source.
///
/// The table name comes from configuration, not user input, but it is
/// still validated before being spliced into the statement.
pub fn read_source_records(source_id: &str, db_path: &Path, table: &str) -> Result<Vec<RawRecord>> {
    if !is_valid_table_name(table) {
        return Err(CatalogError::ConfigError(format!(
            "invalid source table name: {table:?}"
        )));
    }
    if !db_path.exists() {
        return Err(CatalogError::SourceUnavailable(db_path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT category, name, price, url FROM {table}"
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok(RawRecord {
            raw_category: value_to_string(row.get(0)?),
            name: value_to_string(row.get(1)?),
            price: value_to_string(row.get(2)?),
            source_url: value_to_string(row.get(3)?),
            source_id: source_id.to_string(),
        })
    })?;

    let records: Vec<RawRecord> = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    info!(source = source_id, rows = records.len(), "source read");
    Ok(records)
}
