use crate::executor::ToolExecutor;
use crate::types::{FailureKind, ParamSpec, ToolCallRequest, ToolDefinition, ToolResult};
use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(OpenApi)]
#[openapi(
    paths(tools_handler, invoke_handler),
    components(schemas(
        ToolListResponse,
        ToolDefinition,
        ParamSpec,
        ToolCallRequest,
        ToolResult,
        FailureKind
    )),
    tags(
        (name = "tools", description = "Discovery of the hosted tool catalog"),
        (name = "invoke", description = "Invocation of hosted tools")
    )
)]
struct ApiDoc;

/// Builds the tool-host router. Both endpoints answer with HTTP 200;
/// tool failures travel inside the result envelope, not as HTTP status
/// codes.
pub fn router(executor: Arc<ToolExecutor>) -> Router {
    let api = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", api))
        .route("/tools", get(tools_handler))
        .route("/invoke", post(invoke_handler))
        .layer(cors)
        .with_state(executor)
}

pub async fn serve(executor: Arc<ToolExecutor>, addr: SocketAddr) -> Result<(), ServerError> {
    info!(%addr, "Binding tool host");
    let app = router(executor);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Tool host ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

#[derive(Debug, Serialize, ToSchema)]
struct ToolListResponse {
    tools: Vec<ToolDefinition>,
}

#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    responses(
        (status = 200, description = "The hosted tool catalog, in registration order", body = ToolListResponse)
    )
)]
async fn tools_handler(State(executor): State<Arc<ToolExecutor>>) -> Json<ToolListResponse> {
    let tools = executor.registry().definitions();
    debug!(tool_count = tools.len(), "Serving /tools request");
    Json(ToolListResponse { tools })
}

#[utoipa::path(
    post,
    path = "/invoke",
    tag = "invoke",
    request_body = ToolCallRequest,
    responses(
        (status = 200, description = "The invocation outcome envelope", body = ToolResult)
    )
)]
async fn invoke_handler(
    State(executor): State<Arc<ToolExecutor>>,
    Json(request): Json<ToolCallRequest>,
) -> Json<ToolResult> {
    info!(tool = %request.tool_name, "Serving /invoke request");
    Json(executor.execute(&request).await)
}
