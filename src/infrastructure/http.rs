use crate::transport::{ToolTransport, TransportError};
use crate::types::{ToolCallRequest, ToolDefinition, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transport to a remote tool host over its `/tools` and `/invoke`
/// endpoints. One reconnect attempt is made when the connection could not
/// be established at all; a timed-out or mid-flight request is never
/// resent, because the host may already have applied a mutation.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{trimmed}/{path}")
    }
}

#[derive(Debug, Deserialize)]
struct ToolListPayload {
    tools: Vec<ToolDefinition>,
}

#[async_trait]
impl ToolTransport for HttpTransport {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, TransportError> {
        let url = self.endpoint("/tools");
        debug!(%url, "Fetching tool catalog");
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                // Listing has no side effects, so any network fault gets
                // one more attempt.
                warn!(%err, "Tool listing failed, retrying once");
                self.http.get(&url).send().await?
            }
        };
        let payload: ToolListPayload = response
            .error_for_status()?
            .json()
            .await
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;
        debug!(tool_count = payload.tools.len(), "Tool catalog received");
        Ok(payload.tools)
    }

    async fn invoke(&self, request: &ToolCallRequest) -> Result<ToolResult, TransportError> {
        let url = self.endpoint("/invoke");
        info!(tool = %request.tool_name, "Invoking tool on host");
        let response = match self.http.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                // The request never reached the host; one reconnect
                // attempt cannot duplicate a write.
                warn!(%err, "Connection to tool host failed, retrying once");
                self.http.post(&url).json(request).send().await?
            }
            Err(err) => return Err(TransportError::Network(err)),
        };
        response
            .error_for_status()?
            .json()
            .await
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
    }
}
