//! Schema migrations for the SQLite content store.
//!
//! `MIGRATIONS[i]` moves the schema from version `i` to `i + 1`. Applied
//! versions are recorded in `store_schema`.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};

/// Migration batches, in order.
const MIGRATIONS: &[&str] = &[
    // v1: content-addressed blobs
    r#"
    CREATE TABLE blobs (
        digest BLOB PRIMARY KEY,      -- Blake3 of data, 32 bytes
        data BLOB NOT NULL,
        size INTEGER NOT NULL,
        stored_at INTEGER NOT NULL    -- Unix ms
    );
    "#,
];

/// Schema version this build writes.
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the database up to [`SCHEMA_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS store_schema (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let found = schema_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "content store schema v{found} is newer than supported v{SCHEMA_VERSION}"
        )));
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (index, batch) in MIGRATIONS.iter().enumerate().skip(found as usize) {
        let version = index as u32 + 1;
        tx.execute_batch(batch)
            .map_err(|e| StoreError::Migration(format!("v{version}: {e}")))?;
        tx.execute(
            "INSERT INTO store_schema (version, applied_at) VALUES (?1, ?2)",
            params![version, unix_millis()],
        )?;
        tracing::debug!(version, "applied store migration");
    }
    tx.commit()?;

    Ok(())
}

/// Highest applied schema version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT IFNULL(MAX(version), 0) FROM store_schema",
        [],
        |row| row.get(0),
    )?)
}

fn unix_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
