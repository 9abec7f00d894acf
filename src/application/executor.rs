use crate::registry::ToolRegistry;
use crate::types::{FailureKind, ToolCallRequest, ToolDefinition, ToolResult};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Invokes registered tools with validated arguments and normalizes every
/// outcome into a [`ToolResult`] envelope. Validation always precedes
/// dispatch; a backend is never touched for an unknown tool or a bad
/// argument set. Dispatch happens at most once per call: an ambiguous
/// backend failure after a possibly-applied write is reported as
/// `BackendError` and never retried here.
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let tool = match self.registry.resolve(&request.tool_name) {
            Ok(tool) => tool,
            Err(_) => {
                warn!(tool = %request.tool_name, "Invocation of unregistered tool rejected");
                return ToolResult::failure(
                    FailureKind::UnknownTool,
                    format!("no tool named '{}' is registered", request.tool_name),
                );
            }
        };

        if let Err(reason) = validate_arguments(&tool.definition, &request.arguments) {
            warn!(tool = %tool.definition.name, %reason, "Rejecting invocation with invalid arguments");
            return ToolResult::failure(FailureKind::InvalidArguments, reason);
        }

        debug!(tool = %tool.definition.name, "Dispatching tool invocation");
        match tool.handler.call(&request.arguments).await {
            Ok(payload) => {
                info!(tool = %tool.definition.name, "Tool invocation succeeded");
                ToolResult::ok(payload)
            }
            Err(fault) => {
                warn!(tool = %tool.definition.name, %fault, "Tool backend reported a failure");
                ToolResult::failure(FailureKind::BackendError, fault.message)
            }
        }
    }
}

fn validate_arguments(
    definition: &ToolDefinition,
    arguments: &Map<String, Value>,
) -> Result<(), String> {
    for name in arguments.keys() {
        if !definition.params.iter().any(|param| param.name == *name) {
            return Err(format!(
                "unexpected argument '{name}' for tool '{}'",
                definition.name
            ));
        }
    }
    for param in &definition.params {
        match arguments.get(&param.name) {
            None if param.required => {
                return Err(format!("missing required argument '{}'", param.name));
            }
            None => {}
            // An explicit null on an optional argument means "omitted".
            Some(Value::Null) if !param.required => {}
            Some(value) if !param.param_type.admits(value) => {
                return Err(format!(
                    "argument '{}' must be a {}",
                    param.name,
                    param.param_type.as_str()
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
