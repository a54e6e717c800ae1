pub mod feed;
pub mod import;
pub mod inspect;
pub mod stats;

use anyhow::Result;
use std::sync::Arc;

use crate::catalog::SqliteItemSource;
use crate::config::LaneConfig;
use crate::feed::FeedOrchestrator;

/// Open the configured database and build a fresh feed session over it.
pub fn open_orchestrator(config: &LaneConfig) -> Result<FeedOrchestrator> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    tracing::debug!(db = %db_path.display(), "catalog opened");

    let source = Arc::new(SqliteItemSource::from_connection(conn));
    Ok(FeedOrchestrator::new(source, config))
}
