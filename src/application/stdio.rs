use crate::agent::{Agent, AgentOptions, AgentStep};
use crate::client::ChatClient;
use crate::model::ModelProvider;
use crate::transport::ToolTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stdio response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StdioAgentRequest {
    prompt: String,
    model: Option<String>,
    system_prompt: Option<String>,
    session_id: Option<String>,
    #[serde(default)]
    max_steps: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StdioAgentResponse {
    session_id: Option<String>,
    content: Option<String>,
    error: Option<String>,
    tool_steps: Vec<AgentStep>,
}

impl StdioAgentResponse {
    fn success(session_id: String, content: String, tool_steps: Vec<AgentStep>) -> Self {
        Self {
            session_id: Some(session_id),
            content: Some(content),
            error: None,
            tool_steps,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            content: None,
            error: Some(message.into()),
            tool_steps: Vec::new(),
        }
    }
}

/// Serves agent requests over stdin/stdout, one JSON object per line.
/// Each request runs a fresh agent loop; the process exits when stdin
/// closes.
pub async fn run<P>(
    chat: Arc<ChatClient<P>>,
    transport: Arc<dyn ToolTransport>,
    default_max_steps: usize,
) -> Result<(), StdioError>
where
    P: ModelProvider + 'static,
{
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received STDIO line");

        match serde_json::from_str::<StdioAgentRequest>(&line) {
            Ok(request) => {
                if request.prompt.trim().is_empty() {
                    write_response(
                        &mut stdout,
                        StdioAgentResponse::error("prompt cannot be empty"),
                    )
                    .await?;
                    continue;
                }

                info!("Processing STDIO agent request");
                let mut options = AgentOptions::default();
                options.model = request.model;
                options.system_prompt = request.system_prompt;
                options.session_id = request.session_id;
                options.max_steps = request.max_steps.unwrap_or(default_max_steps);
                let agent = Agent::new(chat.clone(), transport.clone());
                match agent.run(request.prompt, options).await {
                    Ok(outcome) => {
                        write_response(
                            &mut stdout,
                            StdioAgentResponse::success(
                                outcome.session_id,
                                outcome.response,
                                outcome.steps,
                            ),
                        )
                        .await?;
                    }
                    Err(error) => {
                        error!(%error, "Agent processing failed via STDIO");
                        let message = error.user_message();
                        write_response(&mut stdout, StdioAgentResponse::error(message)).await?;
                    }
                }
            }
            Err(error) => {
                error!(%error, "Failed to parse STDIO input line");
                write_response(
                    &mut stdout,
                    StdioAgentResponse::error(format!("invalid request JSON: {error}")),
                )
                .await?;
            }
        }
    }

    stdout.flush().await?;
    Ok(())
}

async fn write_response(
    stdout: &mut io::Stdout,
    response: StdioAgentResponse,
) -> Result<(), StdioError> {
    let mut payload = serde_json::to_vec(&response)?;
    payload.push(b'\n');
    stdout.write_all(&payload).await?;
    stdout.flush().await?;
    Ok(())
}
