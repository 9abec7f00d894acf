//! Tools backed by the user/post directory REST service.

use crate::api::{ApiClient, ApiError};
use crate::registry::{BackendFault, RegistryError, ToolHandler, ToolRegistry};
use crate::types::{ParamSpec, ParamType, ToolDefinition};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

const MAX_TITLE_LEN: usize = 200;

impl From<ApiError> for BackendFault {
    fn from(error: ApiError) -> Self {
        BackendFault::new(error.to_string())
    }
}

struct ListUsersTool {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ToolHandler for ListUsersTool {
    async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        Ok(self.api.list_users().await?)
    }
}

struct CreateUserTool {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ToolHandler for CreateUserTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        let name = required_str(arguments, "name")?.trim();
        let email = required_str(arguments, "email")?.trim();
        if name.is_empty() {
            return Err(BackendFault::new("name must not be blank"));
        }
        if !is_plausible_email(email) {
            return Err(BackendFault::new(format!("'{email}' is not a valid email address")));
        }
        Ok(self.api.create_user(name, &email.to_lowercase()).await?)
    }
}

struct ListPostsTool {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ToolHandler for ListPostsTool {
    async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        Ok(self.api.list_posts().await?)
    }
}

struct CreatePostTool {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ToolHandler for CreatePostTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, BackendFault> {
        let title = required_str(arguments, "title")?.trim();
        let content = required_str(arguments, "content")?.trim();
        let author_id = required_str(arguments, "author_id")?.trim();
        if title.is_empty() || content.is_empty() || author_id.is_empty() {
            return Err(BackendFault::new("title, content and author_id must not be blank"));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(BackendFault::new(format!(
                "title too long (max {MAX_TITLE_LEN} characters)"
            )));
        }
        Ok(self.api.create_post(title, content, author_id).await?)
    }
}

/// Adds the directory tools to an existing registry, after the roster
/// tools so the catalog order stays stable for the model.
pub fn register_directory_tools(
    registry: &mut ToolRegistry,
    api: Arc<ApiClient>,
) -> Result<(), RegistryError> {
    registry.register(
        ToolDefinition::new("list_users", "List all users in the directory service."),
        Arc::new(ListUsersTool { api: api.clone() }),
    )?;

    registry.register(
        ToolDefinition::new("create_user", "Create a new user in the directory service.")
            .with_param(ParamSpec::required("name", ParamType::String).describe("Display name"))
            .with_param(ParamSpec::required("email", ParamType::String).describe("Email address")),
        Arc::new(CreateUserTool { api: api.clone() }),
    )?;

    registry.register(
        ToolDefinition::new("list_posts", "List all posts in the directory service."),
        Arc::new(ListPostsTool { api: api.clone() }),
    )?;

    registry.register(
        ToolDefinition::new("create_post", "Create a new post for an existing author.")
            .with_param(ParamSpec::required("title", ParamType::String).describe("Post title"))
            .with_param(ParamSpec::required("content", ParamType::String).describe("Post body"))
            .with_param(
                ParamSpec::required("author_id", ParamType::String)
                    .describe("Id of the authoring user"),
            ),
        Arc::new(CreatePostTool { api }),
    )?;

    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ToolExecutor;
    use crate::types::{FailureKind, ToolCallRequest};
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct StubDirectory {
        users: Arc<Mutex<Vec<Value>>>,
        posts: Arc<Mutex<Vec<Value>>>,
    }

    async fn list_users(State(stub): State<StubDirectory>) -> Json<Value> {
        Json(Value::Array(stub.users.lock().await.clone()))
    }

    async fn create_user(
        State(stub): State<StubDirectory>,
        Json(user): Json<Value>,
    ) -> Json<Value> {
        stub.users.lock().await.push(user.clone());
        Json(user)
    }

    async fn list_posts(State(stub): State<StubDirectory>) -> (StatusCode, Json<Value>) {
        let posts = stub.posts.lock().await;
        (StatusCode::OK, Json(Value::Array(posts.clone())))
    }

    async fn create_post(
        State(stub): State<StubDirectory>,
        Json(post): Json<Value>,
    ) -> Json<Value> {
        stub.posts.lock().await.push(post.clone());
        Json(post)
    }

    async fn spawn_stub(stub: StubDirectory) -> SocketAddr {
        let app = Router::new()
            .route("/users", get(list_users).post(create_user))
            .route("/posts", get(list_posts).post(create_post))
            .with_state(stub);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("serve");
        });
        addr
    }

    async fn fixture() -> (StubDirectory, ToolExecutor) {
        let stub = StubDirectory::default();
        let addr = spawn_stub(stub.clone()).await;
        let api = Arc::new(
            ApiClient::new(format!("http://{addr}"), Duration::from_secs(5)).expect("client"),
        );
        let mut registry = ToolRegistry::new();
        register_directory_tools(&mut registry, api).expect("register");
        (stub, ToolExecutor::new(registry))
    }

    fn call(tool: &str, arguments: Value) -> ToolCallRequest {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => panic!("expected object arguments"),
        };
        ToolCallRequest {
            tool_name: tool.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn create_user_posts_to_the_service() {
        let (stub, executor) = fixture().await;

        let result = executor
            .execute(&call(
                "create_user",
                json!({ "name": "Jane Doe", "email": "Jane@Example.org" }),
            ))
            .await;

        assert!(result.is_ok(), "unexpected result: {result:?}");
        let payload = result.payload().expect("payload");
        assert_eq!(payload["name"], "Jane Doe");
        // The address is normalized before it leaves the client.
        assert_eq!(payload["email"], "jane@example.org");
        assert!(payload["id"].as_str().is_some());
        assert_eq!(stub.users.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn list_users_returns_the_directory() {
        let (stub, executor) = fixture().await;
        stub.users
            .lock()
            .await
            .push(json!({ "id": "u1", "name": "Ada", "email": "ada@example.org" }));

        let result = executor.execute(&call("list_users", Value::Null)).await;

        let payload = result.payload().expect("payload");
        let rows = payload.as_array().expect("array payload");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn create_post_requires_title_content_and_author() {
        let (stub, executor) = fixture().await;

        let result = executor
            .execute(&call(
                "create_post",
                json!({ "title": "Hello", "content": "World" }),
            ))
            .await;

        // Missing required argument is caught before dispatch.
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
        assert!(stub.posts.lock().await.is_empty());

        let result = executor
            .execute(&call(
                "create_post",
                json!({ "title": "Hello", "content": "World", "author_id": "u1" }),
            ))
            .await;
        assert!(result.is_ok(), "unexpected result: {result:?}");
        assert_eq!(stub.posts.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_email_is_a_backend_failure() {
        let (stub, executor) = fixture().await;

        let result = executor
            .execute(&call(
                "create_user",
                json!({ "name": "Jane", "email": "not-an-address" }),
            ))
            .await;

        assert_eq!(result.failure_kind(), Some(FailureKind::BackendError));
        assert!(stub.users.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_backend_error() {
        // Bind then drop to get a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let api = Arc::new(
            ApiClient::new(format!("http://{addr}"), Duration::from_secs(1)).expect("client"),
        );
        let mut registry = ToolRegistry::new();
        register_directory_tools(&mut registry, api).expect("register");
        let executor = ToolExecutor::new(registry);

        let result = executor.execute(&call("list_users", Value::Null)).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::BackendError));
    }
}
