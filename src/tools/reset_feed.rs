use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResetFeedParams {
    #[schemars(
        description = "What to reset: 'all' (default) clears the whole session, 'item' clears one item (requires id), 'partial' keeps only recently shown items (uses keep_recent)"
    )]
    pub mode: Option<String>,

    #[schemars(description = "Item ID, for mode 'item'")]
    pub id: Option<String>,

    #[schemars(description = "For mode 'partial': keep state for items shown within this many positions. Defaults to 50.")]
    pub keep_recent: Option<u64>,
}
