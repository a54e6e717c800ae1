pub mod feed_stats;
pub mod generate_feed;
pub mod inspect_item;
pub mod reset_feed;

use feed_stats::FeedStatsParams;
use generate_feed::GenerateFeedParams;
use inspect_item::InspectItemParams;
use reset_feed::ResetFeedParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use std::sync::Arc;

use crate::config::LaneConfig;
use crate::feed::FeedOrchestrator;

const DEFAULT_KEEP_RECENT: u64 = 50;
const MAX_PAGE_SIZE: usize = 200;

/// The memlane MCP tool handler. Holds the feed session, the catalog connection and
/// config, and exposes all MCP tools via the `#[tool_router]` macro.
///
/// The session sits behind an async mutex so overlapping requests are serialized.
#[derive(Clone)]
pub struct FeedTools {
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<tokio::sync::Mutex<FeedOrchestrator>>,
    db: Arc<std::sync::Mutex<Connection>>,
    config: Arc<LaneConfig>,
}

#[tool_router]
impl FeedTools {
    pub fn new(
        orchestrator: Arc<tokio::sync::Mutex<FeedOrchestrator>>,
        db: Arc<std::sync::Mutex<Connection>>,
        config: Arc<LaneConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            orchestrator,
            db,
            config,
        }
    }

    /// Produce the next page of the feed.
    #[tool(description = "Generate the next page of the memory-lane feed. Returns ranked inventory items; some carry a short reason (memory, insight, discovery, suggestion). Each call records the returned items as shown, so repeated calls move through the catalog.")]
    async fn generate_feed(
        &self,
        Parameters(params): Parameters<GenerateFeedParams>,
    ) -> Result<String, String> {
        let count = params.count.unwrap_or(self.config.feed.default_count);
        if count == 0 || count > MAX_PAGE_SIZE {
            return Err(format!("count must be between 1 and {MAX_PAGE_SIZE}"));
        }

        tracing::info!(count, "generate_feed called");

        let mut orchestrator = self.orchestrator.lock().await;
        let feed = orchestrator
            .generate_feed(count)
            .await
            .map_err(|e| format!("feed generation failed: {e}"))?;

        serde_json::to_string(&serde_json::json!({
            "items": feed,
            "total": feed.len(),
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Session statistics, optionally with catalog counts.
    #[tool(description = "Get feed session statistics: pages generated, tracked items, average and max display penalty, recent history and loop detection. Optionally include catalog counts.")]
    async fn feed_stats(
        &self,
        Parameters(params): Parameters<FeedStatsParams>,
    ) -> Result<String, String> {
        tracing::info!("feed_stats called");

        let session = self.orchestrator.lock().await.algorithm_statistics();

        let catalog = if params.include_catalog.unwrap_or(false) {
            let db = Arc::clone(&self.db);
            let db_path = self.config.resolved_db_path();
            let stats = tokio::task::spawn_blocking(move || {
                let conn = db
                    .lock()
                    .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
                crate::catalog::stats::catalog_stats(&conn, Some(&db_path))
            })
            .await
            .map_err(|e| format!("db task failed: {e}"))?
            .map_err(|e| format!("stats failed: {e}"))?;
            Some(stats)
        } else {
            None
        };

        serde_json::to_string(&serde_json::json!({
            "session": session,
            "catalog": catalog,
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Show how an item scores right now.
    #[tool(description = "Inspect an item by ID: score breakdown (memory, insight, relationship, needs), recovery rate, current display penalty and browse distance. Does not count as a display.")]
    async fn inspect_item(
        &self,
        Parameters(params): Parameters<InspectItemParams>,
    ) -> Result<String, String> {
        tracing::info!(id = %params.id, "inspect_item called");

        let orchestrator = self.orchestrator.lock().await;
        let info = orchestrator
            .item_debug_info(&params.id)
            .await
            .map_err(|e| format!("inspect failed: {e}"))?
            .ok_or_else(|| format!("item not found: {}", params.id))?;

        serde_json::to_string(&info).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Clear session ranking state.
    #[tool(description = "Reset feed session state. mode='all' (default) forgets everything shown, mode='item' forgets one item, mode='partial' keeps only recently shown items.")]
    async fn reset_feed(
        &self,
        Parameters(params): Parameters<ResetFeedParams>,
    ) -> Result<String, String> {
        let mode = params.mode.as_deref().unwrap_or("all");
        tracing::info!(mode, "reset_feed called");

        let mut orchestrator = self.orchestrator.lock().await;
        let response = match mode {
            "all" => {
                orchestrator.reset_algorithm_state();
                serde_json::json!({ "status": "reset", "mode": "all" })
            }
            "item" => {
                let id = params
                    .id
                    .as_deref()
                    .ok_or("mode 'item' requires an id")?;
                let cleared = orchestrator.reset_item(id);
                serde_json::json!({ "status": "reset", "mode": "item", "id": id, "cleared": cleared })
            }
            "partial" => {
                let keep_recent = params.keep_recent.unwrap_or(DEFAULT_KEEP_RECENT);
                orchestrator.partial_reset(keep_recent);
                serde_json::json!({ "status": "reset", "mode": "partial", "keep_recent": keep_recent })
            }
            other => return Err(format!("unknown reset mode: {other}")),
        };

        Ok(response.to_string())
    }
}

#[tool_handler]
impl ServerHandler for FeedTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "memlane serves an endless memory-lane feed over a personal inventory. \
                 Use generate_feed for the next page, inspect_item to see why an item ranks \
                 where it does, and reset_feed to start the session over."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
