use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InspectItemParams {
    #[schemars(description = "ID of the item to inspect")]
    pub id: String,
}
