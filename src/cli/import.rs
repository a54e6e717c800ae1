use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::catalog::store::insert_item;
use crate::catalog::types::Item;
use crate::config::LaneConfig;

/// Import format: `{ "items": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct ImportData {
    items: Vec<Item>,
}

/// Import items from a JSON file.
///
/// Items whose ID already exists are skipped. Items without an ID get a fresh one.
/// An invalid item is reported and skipped; the rest of the file still imports.
pub fn import(config: &LaneConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: ImportData = serde_json::from_str(&json).context("failed to parse import JSON")?;

    let db_path = config.resolved_db_path();
    let mut conn = crate::db::open_database(&db_path)?;

    let mut imported = 0u64;
    let mut skipped = 0u64;
    let mut failed = 0u64;

    println!("Importing {} items...", data.items.len());

    for item in &data.items {
        match insert_item(&mut conn, item) {
            Ok(result) if result.inserted => imported += 1,
            Ok(_) => skipped += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(name = %item.name, error = %e, "item rejected");
                eprintln!("  skipped {:?}: {e}", item.name);
            }
        }
    }

    println!("Import complete: {imported} imported, {skipped} already present, {failed} rejected.");
    Ok(())
}
