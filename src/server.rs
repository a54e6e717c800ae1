//! MCP server initialization over stdio.
//!
//! [`serve_stdio`] opens the catalog, builds one feed session and serves the tool
//! handler until the client disconnects.

use crate::catalog::SqliteItemSource;
use crate::config::LaneConfig;
use crate::db;
use crate::feed::FeedOrchestrator;
use crate::tools::FeedTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LaneConfig) -> Result<()> {
    tracing::info!("starting memlane MCP server on stdio");

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let db = Arc::new(Mutex::new(conn));
    let source = Arc::new(SqliteItemSource::new(Arc::clone(&db)));
    let orchestrator = FeedOrchestrator::new(source, &config);
    if let Some(seed) = config.feed.seed {
        tracing::info!(seed, "feed randomness is seeded");
    }

    let tools = FeedTools::new(
        Arc::new(tokio::sync::Mutex::new(orchestrator)),
        db,
        Arc::new(config),
    );
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
