use crate::executor::ToolExecutor;
use crate::types::{ToolCallRequest, ToolDefinition, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Network-level failures, kept distinct from the `Failure` envelope a
/// tool returns: the loop treats these as terminal for the current step.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("tool host request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("tool host returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Network(err) if err.is_connect() => {
                "Could not reach the tool host. Check that it is running and the address is correct."
                    .to_string()
            }
            TransportError::Network(err) if err.is_timeout() => {
                "The tool host did not answer in time. The request may or may not have been applied."
                    .to_string()
            }
            TransportError::Network(_) => {
                "A network error occurred while talking to the tool host. Please try again."
                    .to_string()
            }
            TransportError::MalformedResponse(_) => {
                "The tool host sent a response this client could not understand.".to_string()
            }
        }
    }
}

/// The request/response channel between agent and tool host. Listing is
/// idempotent and side-effect-free; invocation blocks the caller until a
/// result envelope or a transport failure arrives.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TransportError>;

    async fn invoke(&self, request: &ToolCallRequest) -> Result<ToolResult, TransportError>;
}

/// In-process transport for embedded mode and tests: the executor is
/// called directly, so no network failure is possible.
pub struct LocalTransport {
    executor: Arc<ToolExecutor>,
}

impl LocalTransport {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolTransport for LocalTransport {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TransportError> {
        Ok(self.executor.registry().definitions())
    }

    async fn invoke(&self, request: &ToolCallRequest) -> Result<ToolResult, TransportError> {
        Ok(self.executor.execute(request).await)
    }
}
