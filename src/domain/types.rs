use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Value types a tool parameter may carry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }

    /// Whether a JSON value is acceptable for this parameter type.
    /// Integers must fit in i64; a larger literal is an argument error,
    /// not a backend fault.
    pub fn admits(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: None,
        }
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// A registered tool as the model and the wire see it: name, description
/// used for selection, and the ordered parameter schema. Immutable once
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON-schema-style object presented to the model alongside the name
    /// and description.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut field = Map::new();
            field.insert("type".to_string(), json!(param.param_type.as_str()));
            if let Some(description) = &param.description {
                field.insert("description".to_string(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(field));
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    BackendError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::UnknownTool => "UnknownTool",
            FailureKind::InvalidArguments => "InvalidArguments",
            FailureKind::BackendError => "BackendError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform invocation outcome envelope: `{"status":"ok","payload":…}` or
/// `{"status":"error","kind":…,"message":…}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult {
    Ok {
        #[schema(value_type = Object)]
        payload: Value,
    },
    Error {
        kind: FailureKind,
        message: String,
    },
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        ToolResult::Ok { payload }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ToolResult::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResult::Ok { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ToolResult::Ok { payload } => Some(payload),
            ToolResult::Error { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ToolResult::Ok { .. } => None,
            ToolResult::Error { kind, .. } => Some(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_schema_lists_required_fields_in_order() {
        let definition = ToolDefinition::new("add_person", "Add one person.")
            .with_param(ParamSpec::required("name", ParamType::String))
            .with_param(ParamSpec::required("age", ParamType::Integer))
            .with_param(ParamSpec::optional("note", ParamType::String));

        let schema = definition.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["age"]["type"], "integer");
        assert_eq!(schema["required"], json!(["name", "age"]));
    }

    #[test]
    fn result_envelope_uses_status_tag() {
        let ok = serde_json::to_value(ToolResult::ok(json!([1, 2]))).expect("serialize");
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["payload"], json!([1, 2]));

        let err = serde_json::to_value(ToolResult::failure(
            FailureKind::UnknownTool,
            "no such tool",
        ))
        .expect("serialize");
        assert_eq!(err["status"], "error");
        assert_eq!(err["kind"], "UnknownTool");
    }

    #[test]
    fn result_envelope_round_trips() {
        let original = ToolResult::failure(FailureKind::InvalidArguments, "age must be an integer");
        let text = serde_json::to_string(&original).expect("serialize");
        let parsed: ToolResult = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(parsed, original);
    }

    #[test]
    fn param_types_admit_matching_values() {
        assert!(ParamType::String.admits(&json!("x")));
        assert!(ParamType::Integer.admits(&json!(42)));
        assert!(!ParamType::Integer.admits(&json!("42")));
        assert!(!ParamType::Integer.admits(&json!(4.2)));
        assert!(!ParamType::Integer.admits(&json!(u64::MAX)));
        assert!(ParamType::Boolean.admits(&json!(true)));
    }
}
