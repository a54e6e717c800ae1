//! The inventory catalog as seen by the feed engine.
//!
//! The engine only ever reads whole snapshots through [`ItemSource`]. Two sources
//! ship with the crate: [`InMemorySource`] for library callers and tests, and
//! [`SqliteItemSource`] backed by the `items` table.

pub mod stats;
pub mod store;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, RwLock};

use types::Item;

/// Asynchronous provider of the current full item catalog.
///
/// Each call is a one-shot snapshot. Errors are passed through to the caller of
/// the feed untouched.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<Item>>;
}

/// A catalog held in memory. Cloning shares the underlying list.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    items: Arc<RwLock<Vec<Item>>>,
}

impl InMemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Replace the whole catalog. Later snapshots see the new list.
    pub fn replace(&self, items: Vec<Item>) {
        let mut guard = self.items.write().unwrap_or_else(|e| e.into_inner());
        *guard = items;
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ItemSource for InMemorySource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        Ok(self.items.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

/// Catalog read from the SQLite `items` table.
///
/// Queries run on the blocking pool so the feed's async flow never stalls on disk.
#[derive(Clone)]
pub struct SqliteItemSource {
    db: Arc<Mutex<Connection>>,
}

impl SqliteItemSource {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self::new(Arc::new(Mutex::new(conn)))
    }

    /// Shared handle to the underlying connection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }
}

#[async_trait]
impl ItemSource for SqliteItemSource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let db = Arc::clone(&self.db);
        let items = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            store::load_items(&conn)
        })
        .await
        .map_err(|e| anyhow::anyhow!("catalog task failed: {e}"))??;

        tracing::debug!(count = items.len(), "catalog snapshot loaded");
        Ok(items)
    }
}
