//! MCP `feed_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `feed_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeedStatsParams {
    /// Include catalog counts from the item store alongside the session statistics.
    #[schemars(description = "If true, also include catalog counts (by status, category) from the item store")]
    pub include_catalog: Option<bool>,
}
