// End-to-end checks for the HTTP tool host: catalog discovery and tool
// invocation over a real socket, with the store shared so effects are
// observable from the test side.

use roster_mcp::executor::ToolExecutor;
use roster_mcp::http::HttpTransport;
use roster_mcp::server;
use roster_mcp::store::{PeopleStore, PersonFilter};
use roster_mcp::tools::people_registry;
use roster_mcp::transport::ToolTransport;
use roster_mcp::types::{FailureKind, ToolCallRequest};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_host() -> (SocketAddr, Arc<PeopleStore>) {
    let store = Arc::new(PeopleStore::open_in_memory().expect("open store"));
    let registry = people_registry(store.clone()).expect("build registry");
    let executor = Arc::new(ToolExecutor::new(registry));
    let app = server::router(executor);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("serve");
    });
    (addr, store)
}

fn transport_for(addr: SocketAddr) -> HttpTransport {
    HttpTransport::new(format!("http://{addr}"), Duration::from_secs(5)).expect("build transport")
}

fn arguments(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn catalog_is_ordered_and_stable() {
    let (addr, _store) = spawn_host().await;
    let transport = transport_for(addr);

    let first = transport.list_tools().await.expect("first listing");
    let second = transport.list_tools().await.expect("second listing");

    let names: Vec<&str> = first.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, ["add_person", "read_data", "get_table_info"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn invoking_add_person_persists_a_row() {
    let (addr, store) = spawn_host().await;
    let transport = transport_for(addr);

    let result = transport
        .invoke(&ToolCallRequest {
            tool_name: "add_person".into(),
            arguments: arguments(json!({
                "name": "Ada Lovelace",
                "age": 36,
                "profession": "Mathematician",
            })),
        })
        .await
        .expect("invoke succeeds");

    assert!(result.is_ok());
    let people = store
        .query_people(&PersonFilter::default())
        .expect("query people");
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].name, "Ada Lovelace");
    assert_eq!(people[0].age, 36);
}

#[tokio::test]
async fn unknown_tool_travels_as_an_error_envelope() {
    let (addr, _store) = spawn_host().await;
    let transport = transport_for(addr);

    let result = transport
        .invoke(&ToolCallRequest {
            tool_name: "drop_table".into(),
            arguments: Map::new(),
        })
        .await
        .expect("transport itself succeeds");

    assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_the_backend() {
    let (addr, store) = spawn_host().await;
    let transport = transport_for(addr);

    let result = transport
        .invoke(&ToolCallRequest {
            tool_name: "add_person".into(),
            arguments: arguments(json!({ "name": "No Age" })),
        })
        .await
        .expect("transport itself succeeds");

    assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
    let people = store
        .query_people(&PersonFilter::default())
        .expect("query people");
    assert!(people.is_empty());
}
