use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GenerateFeedParams {
    #[schemars(description = "Number of feed entries to return. Defaults to the configured page size (20).")]
    pub count: Option<usize>,
}
