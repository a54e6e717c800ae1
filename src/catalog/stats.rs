use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Catalog-level statistics.
#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub total_items: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_open_status: BTreeMap<String, u64>,
    pub by_category: BTreeMap<String, u64>,
    pub distinct_tags: u64,
    pub photos: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_item: Option<String>,
}

/// Compute catalog statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn catalog_stats(conn: &Connection, db_path: Option<&Path>) -> Result<CatalogStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    let distinct_tags: i64 =
        conn.query_row("SELECT COUNT(DISTINCT tag) FROM item_tags", [], |row| row.get(0))?;
    let photos: i64 = conn.query_row("SELECT COUNT(*) FROM item_photos", [], |row| row.get(0))?;

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(added_at), MAX(added_at) FROM items",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(CatalogStats {
        total_items: total as u64,
        by_status: group_count(conn, "status")?,
        by_open_status: group_count(conn, "open_status")?,
        by_category: group_count(conn, "category")?,
        distinct_tags: distinct_tags as u64,
        photos: photos as u64,
        db_size_bytes,
        oldest_item: oldest,
        newest_item: newest,
    })
}

/// `column` is always one of our own column names, never user input.
fn group_count(conn: &Connection, column: &str) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM items GROUP BY {column}"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut map = BTreeMap::new();
    for row in rows {
        let (key, count) = row?;
        map.insert(key, count as u64);
    }
    Ok(map)
}
