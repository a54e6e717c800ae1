#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use memlane::catalog::store::insert_item;
use memlane::catalog::types::{Item, ItemStatus, OpenStatus};
use memlane::catalog::ItemSource;
use memlane::config::LaneConfig;
use memlane::db;
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed reference instant for age-dependent assertions.
pub fn test_now() -> DateTime<Utc> {
    "2026-06-01T12:00:00Z".parse().unwrap()
}

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Defaults with a fixed seed, ignoring any config file or environment.
pub fn seeded_config(seed: u64) -> LaneConfig {
    let mut config = LaneConfig::default();
    config.feed.seed = Some(seed);
    config
}

/// A plain in-stock item added `age_days` before [`test_now`].
pub fn test_item(id: &str, category: &str, age_days: i64) -> Item {
    Item {
        id: id.to_string(),
        name: format!("Item {id}"),
        category: category.to_string(),
        brand: None,
        price: None,
        added_at: test_now() - Duration::days(age_days),
        open_status: OpenStatus::Opened,
        status: ItemStatus::InStock,
        location: None,
        tags: Default::default(),
        photos: Vec::new(),
    }
}

/// A varied catalog of `n` items across a few categories, brands and locations.
pub fn varied_catalog(n: usize) -> Vec<Item> {
    const CATEGORIES: [&str; 4] = ["Kitchen", "Outdoor", "Electronics", "Books"];
    const BRANDS: [&str; 3] = ["Apple", "Muji", "Patagonia"];
    const LOCATIONS: [&str; 3] = ["Garage", "Closet", "Office"];

    (0..n)
        .map(|i| {
            let mut item = test_item(&format!("item-{i:03}"), CATEGORIES[i % 4], (i * 17 % 400) as i64);
            if i % 2 == 0 {
                item.brand = Some(BRANDS[i % 3].to_string());
            }
            if i % 3 != 0 {
                item.price = Some((i * 37 % 2500) as f64);
            }
            if i % 5 == 0 {
                item.open_status = OpenStatus::Unopened;
            }
            if i % 7 == 0 {
                item.status = ItemStatus::Expired;
            }
            item.location = Some(LOCATIONS[i % 3].to_string());
            item.tags.insert(format!("tag-{}", i % 6));
            item
        })
        .collect()
}

/// Insert items into the database, panicking on failure.
pub fn seed_items(conn: &mut Connection, items: &[Item]) {
    for item in items {
        let result = insert_item(conn, item).unwrap();
        assert!(result.inserted, "item {} was not inserted", item.id);
    }
}

/// An item source that always fails, counting how often it was asked.
#[derive(Default)]
pub struct FailingSource {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ItemSource for FailingSource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("catalog unavailable")
    }
}
