//! The built-in roster tools and the startup registry that holds them.

use crate::registry::{BackendFault, RegistryError, ToolHandler, ToolRegistry};
use crate::store::{PeopleStore, PersonFilter, StoreError};
use crate::types::{ParamSpec, ParamType, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

impl From<StoreError> for BackendFault {
    fn from(error: StoreError) -> Self {
        BackendFault::new(error.to_string())
    }
}

struct AddPersonTool {
    store: Arc<PeopleStore>,
}

#[async_trait]
impl ToolHandler for AddPersonTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        let name = required_str(arguments, "name")?;
        let age = required_int(arguments, "age")?;
        let profession = required_str(arguments, "profession")?;
        let id = self.store.insert_person(name, age, profession)?;
        Ok(json!({ "id": id, "inserted": 1 }))
    }
}

struct ReadDataTool {
    store: Arc<PeopleStore>,
}

#[async_trait]
impl ToolHandler for ReadDataTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        let filter = PersonFilter {
            min_age: optional_int(arguments, "min_age"),
            max_age: optional_int(arguments, "max_age"),
            profession: optional_str(arguments, "profession").map(str::to_string),
            limit: optional_int(arguments, "limit"),
        };
        let people = self.store.query_people(&filter)?;
        serde_json::to_value(people).map_err(|err| BackendFault::new(err.to_string()))
    }
}

struct TableInfoTool {
    store: Arc<PeopleStore>,
}

#[async_trait]
impl ToolHandler for TableInfoTool {
    async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        let info = self.store.table_info()?;
        serde_json::to_value(info).map_err(|err| BackendFault::new(err.to_string()))
    }
}

/// Builds the startup registry over a shared people store. Registration
/// order is what the model sees, so the commonly-used tools come first.
pub fn people_registry(store: Arc<PeopleStore>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolDefinition::new(
            "add_person",
            "Add a single person to the people roster. Call once per person.",
        )
        .with_param(ParamSpec::required("name", ParamType::String).describe("Full name"))
        .with_param(ParamSpec::required("age", ParamType::Integer).describe("Age in years"))
        .with_param(
            ParamSpec::required("profession", ParamType::String).describe("Job title or role"),
        ),
        Arc::new(AddPersonTool {
            store: store.clone(),
        }),
    )?;

    registry.register(
        ToolDefinition::new(
            "read_data",
            "Read people from the roster, optionally filtered by age or profession.",
        )
        .with_param(
            ParamSpec::optional("min_age", ParamType::Integer)
                .describe("Only people at least this old"),
        )
        .with_param(
            ParamSpec::optional("max_age", ParamType::Integer)
                .describe("Only people strictly younger than this"),
        )
        .with_param(
            ParamSpec::optional("profession", ParamType::String)
                .describe("Exact profession match"),
        )
        .with_param(
            ParamSpec::optional("limit", ParamType::Integer)
                .describe("Maximum number of rows to return"),
        ),
        Arc::new(ReadDataTool {
            store: store.clone(),
        }),
    )?;

    registry.register(
        ToolDefinition::new(
            "get_table_info",
            "Describe the people table: columns and total record count.",
        ),
        Arc::new(TableInfoTool { store }),
    )?;

    Ok(registry)
}

fn required_str<'a>(
    arguments: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, BackendFault> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BackendFault::new(format!("argument '{key}' missing or not a string")))
}

fn required_int(arguments: &Map<String, Value>, key: &str) -> Result<i64, BackendFault> {
    arguments
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| BackendFault::new(format!("argument '{key}' missing or not an integer")))
}

fn optional_int(arguments: &Map<String, Value>, key: &str) -> Option<i64> {
    arguments.get(key).and_then(Value::as_i64)
}

fn optional_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}
