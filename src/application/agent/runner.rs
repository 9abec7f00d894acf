use super::directive::ModelIntent;
use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use super::parser;
use crate::client::{ChatClient, ChatRequest};
use crate::model::ModelProvider;
use crate::transport::ToolTransport;
use crate::types::{ToolCallRequest, ToolDefinition};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The decide/act/observe loop: asks the model for the next intent,
/// dispatches tool calls through the transport, feeds each outcome back
/// as an observation, and stops on a final answer, a fatal error, the
/// step bound, or cancellation.
pub struct Agent<P: ModelProvider> {
    chat: Arc<ChatClient<P>>,
    transport: Arc<dyn ToolTransport>,
}

/// A non-final model turn, after the final-answer case has been peeled
/// off: either a tool-call request or a reply the parser rejected.
enum Turn {
    Call {
        tool_name: String,
        arguments: Map<String, Value>,
    },
    Malformed(String),
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(chat: Arc<ChatClient<P>>, transport: Arc<dyn ToolTransport>) -> Self {
        Self { chat, transport }
    }

    pub async fn run(
        &self,
        prompt: String,
        mut options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        info!("Agent run started");
        // One catalog snapshot per run: the same tool set is shown to the
        // model and used to vet its choices.
        let catalog = match self.transport.list_tools().await {
            Ok(catalog) => catalog,
            Err(err) => return Err(AgentError::Transport(err)),
        };
        let instructions = compose_instructions(&catalog, options.system_prompt.take().as_deref());

        let caller_owned_session = options.session_id.is_some();
        let mut session_id = options.session_id.clone();
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut next_prompt = initial_prompt(&prompt);
        let mut remaining = options.max_steps;
        let mut tool_choice_corrected = false;
        let mut reply_corrected = false;

        let outcome = loop {
            if options.cancel.is_cancelled() {
                info!("Agent run cancelled before next model turn");
                break Err(AgentError::Cancelled);
            }
            debug!(
                session = session_id.as_deref(),
                remaining, "Submitting agent turn to model provider"
            );
            let result = self
                .chat
                // The intent contract and the catalog snapshot accompany
                // every turn, not just the first.
                .chat(ChatRequest {
                    prompt: next_prompt.clone(),
                    model: options.model.clone(),
                    system_prompt: Some(instructions.clone()),
                    session_id: session_id.clone(),
                })
                .await;
            let result = match result {
                Ok(result) => result,
                Err(err) => break Err(AgentError::Chat(err)),
            };
            session_id = Some(result.session_id.clone());

            let turn = match parser::parse_intent(&result.content) {
                Ok(ModelIntent::FinalAnswer { text }) => {
                    info!(
                        session_id = result.session_id.as_str(),
                        "Agent produced final answer"
                    );
                    break Ok(AgentOutcome {
                        session_id: result.session_id,
                        response: text,
                        steps,
                    });
                }
                Ok(ModelIntent::CallTool {
                    tool_name,
                    arguments,
                }) => Turn::Call {
                    tool_name,
                    arguments,
                },
                Err(err) => Turn::Malformed(err.to_string()),
            };

            // Every non-final turn consumes one step of the budget; the
            // bound holds no matter how the model misbehaves.
            if remaining == 0 {
                warn!("Agent exhausted its step budget without a final answer");
                break Err(AgentError::StepLimitExceeded(options.max_steps));
            }
            remaining -= 1;

            next_prompt = match turn {
                Turn::Call {
                    tool_name,
                    arguments,
                } => {
                    if !catalog.iter().any(|tool| tool.name == tool_name) {
                        if tool_choice_corrected {
                            warn!(tool = %tool_name, "Model repeated an unavailable tool choice");
                            break Err(AgentError::InvalidToolChoice(tool_name));
                        }
                        tool_choice_corrected = true;
                        warn!(tool = %tool_name, "Model chose a tool outside the catalog");
                        invalid_choice_observation(&tool_name, &catalog)
                    } else {
                        if options.cancel.is_cancelled() {
                            info!("Agent run cancelled before tool dispatch");
                            break Err(AgentError::Cancelled);
                        }
                        let request = ToolCallRequest {
                            tool_name: tool_name.clone(),
                            arguments,
                        };
                        info!(tool = %tool_name, "Dispatching tool call");
                        let result = match self.transport.invoke(&request).await {
                            Ok(result) => result,
                            Err(err) => break Err(AgentError::Transport(err)),
                        };
                        let step = AgentStep {
                            tool: request.tool_name.clone(),
                            arguments: Value::Object(request.arguments),
                            result,
                        };
                        let observation = json!({
                            "tool_result": {
                                "tool": step.tool,
                                "arguments": step.arguments,
                                "result": step.result,
                            }
                        })
                        .to_string();
                        steps.push(step);
                        observation
                    }
                }
                Turn::Malformed(detail) => {
                    if reply_corrected {
                        warn!(%detail, "Model reply stayed malformed after feedback");
                        break Err(AgentError::MalformedReply(detail));
                    }
                    reply_corrected = true;
                    warn!(%detail, "Model reply was not a valid intent object, asking for a correction");
                    malformed_reply_observation(&detail)
                }
            };
        };

        // Sessions minted by this run are scoped to it and dropped on any
        // exit; a caller-supplied session survives so a follow-up run can
        // resume the conversation.
        if !caller_owned_session {
            if let Some(session) = &session_id {
                self.chat.discard_session(session).await;
            }
        }
        outcome
    }
}

fn compose_instructions(catalog: &[ToolDefinition], custom: Option<&str>) -> String {
    let mut lines = vec![
        "You are an assistant that manages a people roster through remote tools.".to_string(),
        "Every reply must be exactly one JSON object, with no commentary and no code fences."
            .to_string(),
        r#"To invoke a tool reply {"intent":"call_tool","tool_name":"...","arguments":{...}}."#
            .to_string(),
        r#"To answer the user reply {"intent":"final_answer","text":"..."}."#.to_string(),
        "Call only tools from the catalog below, with arguments matching their schemas."
            .to_string(),
    ];
    if let Some(custom) = custom {
        if !custom.trim().is_empty() {
            lines.push(custom.trim().to_string());
        }
    }
    if catalog.is_empty() {
        lines.push("No tools are currently available; answer from general knowledge.".to_string());
    } else {
        lines.push("Tool catalog:".to_string());
        for tool in catalog {
            lines.push(format!(
                "- {}: {} schema={}",
                tool.name,
                tool.description,
                tool.input_schema()
            ));
        }
    }
    lines.join("\n")
}

fn initial_prompt(prompt: &str) -> String {
    json!({ "user_request": prompt }).to_string()
}

fn invalid_choice_observation(tool: &str, catalog: &[ToolDefinition]) -> String {
    let names: Vec<&str> = catalog.iter().map(|tool| tool.name.as_str()).collect();
    json!({
        "error": {
            "kind": "InvalidToolChoice",
            "message": format!(
                "tool '{tool}' is not available; choose one of: {}",
                names.join(", ")
            ),
        }
    })
    .to_string()
}

fn malformed_reply_observation(detail: &str) -> String {
    json!({
        "error": {
            "kind": "MalformedReply",
            "message": format!(
                "your previous reply was rejected: {detail}; reply with exactly one valid intent object"
            ),
        }
    })
    .to_string()
}
