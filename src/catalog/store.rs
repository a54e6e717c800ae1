//! Read and write paths for the `items` table and its tag/photo side tables.
//!
//! [`load_items`] produces the catalog snapshot consumed by the feed engine.
//! [`insert_item`] writes one item with its tags and photos inside a transaction.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use super::types::{Item, ItemStatus, OpenStatus};

/// Result returned from an insert.
#[derive(Debug, Serialize)]
pub struct InsertItemResult {
    pub id: String,
    /// `false` when an item with the same ID already existed and nothing was written.
    pub inserted: bool,
}

/// Generate a fresh time-sortable item ID.
pub fn new_item_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Insert an item with its tags and photos. An empty `id` gets a fresh UUID v7.
///
/// Existing IDs are skipped, never overwritten.
pub fn insert_item(conn: &mut Connection, item: &Item) -> Result<InsertItemResult> {
    if item.name.trim().is_empty() {
        bail!("item name must not be empty");
    }
    if matches!(item.price, Some(p) if !p.is_finite() || p < 0.0) {
        bail!("item price must be a non-negative number");
    }

    let id = if item.id.is_empty() {
        new_item_id()
    } else {
        item.id.clone()
    };

    let tx = conn.transaction()?;

    let exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM items WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(InsertItemResult {
            id,
            inserted: false,
        });
    }

    tx.execute(
        "INSERT INTO items (id, name, category, brand, price, added_at, open_status, status, location) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            item.name,
            item.category,
            item.brand,
            item.price,
            item.added_at.to_rfc3339(),
            item.open_status.as_str(),
            item.status.as_str(),
            item.location,
        ],
    )?;

    for tag in &item.tags {
        tx.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag) VALUES (?1, ?2)",
            params![id, tag],
        )?;
    }

    for (position, path) in item.photos.iter().enumerate() {
        tx.execute(
            "INSERT INTO item_photos (item_id, position, path) VALUES (?1, ?2, ?3)",
            params![id, position as i64, path],
        )?;
    }

    tx.commit()?;
    tracing::debug!(id = %id, name = %item.name, "item inserted");

    Ok(InsertItemResult { id, inserted: true })
}

/// Load the full catalog, tags and photos included, ordered by `added_at`.
pub fn load_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut tags = load_tags(conn)?;
    let mut photos = load_photos(conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, name, category, brand, price, added_at, open_status, status, location \
         FROM items ORDER BY added_at, id",
    )?;
    let mut items = stmt
        .query_map([], item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for item in &mut items {
        item.tags = tags.remove(&item.id).unwrap_or_default();
        item.photos = photos.remove(&item.id).unwrap_or_default();
    }

    Ok(items)
}

/// Fetch a single item by ID.
pub fn get_item(conn: &Connection, id: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT id, name, category, brand, price, added_at, open_status, status, location \
             FROM items WHERE id = ?1",
            params![id],
            item_from_row,
        )
        .optional()?;

    let Some(mut item) = item else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT tag FROM item_tags WHERE item_id = ?1")?;
    item.tags = stmt
        .query_map(params![id], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut stmt =
        conn.prepare("SELECT path FROM item_photos WHERE item_id = ?1 ORDER BY position")?;
    item.photos = stmt
        .query_map(params![id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(item))
}

/// Number of items in the catalog.
pub fn count_items(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let added_at: String = row.get(5)?;
    let open_status: String = row.get(6)?;
    let status: String = row.get(7)?;

    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        brand: row.get(3)?,
        price: row.get(4)?,
        added_at: parse_timestamp(5, &added_at)?,
        open_status: open_status
            .parse::<OpenStatus>()
            .map_err(|e| conversion_error(6, e))?,
        status: status
            .parse::<ItemStatus>()
            .map_err(|e| conversion_error(7, e))?,
        location: row.get(8)?,
        tags: BTreeSet::new(),
        photos: Vec::new(),
    })
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn load_tags(conn: &Connection) -> Result<HashMap<String, BTreeSet<String>>> {
    let mut stmt = conn.prepare("SELECT item_id, tag FROM item_tags")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();
    for (item_id, tag) in rows {
        map.entry(item_id).or_default().insert(tag);
    }
    Ok(map)
}

fn load_photos(conn: &Connection) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt =
        conn.prepare("SELECT item_id, path FROM item_photos ORDER BY item_id, position")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (item_id, path) in rows {
        map.entry(item_id).or_default().push(path);
    }
    Ok(map)
}
