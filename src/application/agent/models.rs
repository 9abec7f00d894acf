use crate::types::ToolResult;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

const DEFAULT_MAX_STEPS: usize = 8;

/// One completed tool dispatch, recorded in order for the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentStep {
    pub tool: String,
    #[schema(value_type = Object)]
    pub arguments: Value,
    pub result: ToolResult,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub session_id: String,
    pub response: String,
    pub steps: Vec<AgentStep>,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub session_id: Option<String>,
    pub max_steps: usize,
    /// Checked at every suspension point; a cancelled token aborts the
    /// run and discards its conversation state.
    pub cancel: CancellationToken,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: None,
            session_id: None,
            max_steps: DEFAULT_MAX_STEPS,
            cancel: CancellationToken::new(),
        }
    }
}
