use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Raised by a tool handler when the backing store or API fails. The
/// executor maps it into a `Failure(BackendError, …)` envelope; it never
/// escapes to the caller as a panic or a transport fault.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendFault {
    pub message: String,
}

impl BackendFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Uniform invocation capability every registered tool implements.
/// Arguments arrive already validated against the tool's schema.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, BackendFault>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

// The handler is opaque, so only the definition is rendered.
impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Catalog of tools, keyed by unique name, listing in registration order.
/// The order is presented verbatim to the model, so it is part of the
/// contract and must stay stable across calls.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name.clone()));
        }
        debug!(tool = %definition.name, "Registering tool");
        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            definition,
            handler,
        });
        Ok(())
    }

    pub fn list(&self) -> impl Iterator<Item = &ToolDefinition> + '_ {
        self.tools.iter().map(|tool| &tool.definition)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list().cloned().collect()
    }

    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.index
            .get(name)
            .map(|&slot| &self.tools[slot])
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullHandler;

    #[async_trait]
    impl ToolHandler for NullHandler {
        async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
            Ok(json!(null))
        }
    }

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition::new(name, "test tool")
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry
            .register(definition("alpha"), Arc::new(NullHandler))
            .expect("first registration");

        let err = registry
            .register(definition("alpha"), Arc::new(NullHandler))
            .expect_err("duplicate must fail");
        assert_eq!(err, RegistryError::DuplicateTool("alpha".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn listing_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(definition(name), Arc::new(NullHandler))
                .expect("register");
        }

        let first: Vec<_> = registry.list().map(|tool| tool.name.clone()).collect();
        let second: Vec<_> = registry.list().map(|tool| tool.name.clone()).collect();
        assert_eq!(first, vec!["zeta", "alpha", "mid"]);
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_unknown_is_an_error() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("missing").expect_err("must fail");
        assert_eq!(err, RegistryError::UnknownTool("missing".into()));
    }

    #[test]
    fn registered_tool_debug_shows_the_definition() {
        let mut registry = ToolRegistry::new();
        registry
            .register(definition("alpha"), Arc::new(NullHandler))
            .expect("register");

        let rendered = format!("{:?}", registry.resolve("alpha").expect("resolve"));
        assert!(rendered.contains("alpha"));
    }
}
