use anyhow::Result;

use crate::config::LaneConfig;

/// Display catalog statistics in the terminal.
pub fn stats(config: &LaneConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::catalog::stats::catalog_stats(&conn, Some(&db_path))?;

    println!("Catalog Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total items:         {}", response.total_items);
    println!("  Distinct tags:       {}", response.distinct_tags);
    println!("  Photos:              {}", response.photos);
    println!();

    println!("By Status:");
    for status in crate::catalog::types::ItemStatus::ALL {
        let count = response.by_status.get(status.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", status.as_str(), count);
    }
    println!();

    println!("By Open Status:");
    for (status, count) in &response.by_open_status {
        println!("  {:<12} {}", status, count);
    }
    println!();

    if !response.by_category.is_empty() {
        println!("By Category:");
        for (category, count) in &response.by_category {
            println!("  {:<20} {}", category, count);
        }
        println!();
    }

    println!("Database size:         {} bytes", response.db_size_bytes);
    if let Some(ref oldest) = response.oldest_item {
        println!("Oldest item:           {oldest}");
    }
    if let Some(ref newest) = response.newest_item {
        println!("Newest item:           {newest}");
    }

    Ok(())
}
