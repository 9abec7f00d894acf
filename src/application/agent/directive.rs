use serde::Deserialize;
use serde_json::{Map, Value};

/// The structured reply contract at the model boundary: every turn must
/// be exactly one JSON object carrying either a tool call or the final
/// answer. Anything else is rejected and re-prompted, not guessed at.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ModelIntent {
    CallTool {
        tool_name: String,
        #[serde(default)]
        arguments: Map<String, Value>,
    },
    FinalAnswer {
        text: String,
    },
}
