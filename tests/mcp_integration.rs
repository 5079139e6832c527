//! Integration tests for MCP protocol handling.
//!
//! These tests drive the public server API end to end: lifecycle, request
//! routing, argument validation, error envelopes, and the stdio-style serve
//! loop.

use std::sync::Arc;

use keipes_mcp::error::LifecycleError;
use keipes_mcp::mcp::{ConnectionState, Dispatcher, LineTransport, McpServer};
use keipes_mcp::resources::{FileSystemResource, ResourceRegistry};
use keipes_mcp::tools::ToolRegistry;
use serde_json::{json, Value};
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(
        ToolRegistry::with_builtin_tools().expect("built-in tools register"),
        ResourceRegistry::new(),
    )
}

async fn connected_server() -> McpServer {
    let server = McpServer::new(dispatcher());
    server
        .connect(LineTransport::new(tokio::io::empty(), tokio::io::sink()))
        .await
        .expect("idle server connects");
    server
}

async fn request(server: &McpServer, raw: &str) -> Value {
    let body = server.dispatch(raw).await.expect("server is connected");
    serde_json::from_str(&body).expect("response is JSON")
}

// =============================================================================
// End-to-end Scenarios
// =============================================================================

#[tokio::test]
async fn test_tools_list_in_registration_order() {
    let server = connected_server().await;
    let resp = request(&server, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await;

    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    let tools = resp["result"]["tools"].as_array().expect("tools array");
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, ["calculator", "weather"]);

    for tool in tools {
        assert!(tool["description"].is_string());
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert!(tool.get("handler").is_none());
    }
}

#[tokio::test]
async fn test_calculator_add() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"add","a":5,"b":3}}}"#,
    )
    .await;

    assert_eq!(resp["id"], 2);
    assert!(resp.get("error").is_none());
    assert_eq!(resp["result"]["content"][0]["text"], "5 + 3 = 8");
    assert_eq!(resp["result"]["structuredContent"]["result"].as_f64(), Some(8.0));
}

#[tokio::test]
async fn test_calculator_divide_by_zero_keeps_server_usable() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"divide","a":1,"b":0}}}"#,
    )
    .await;

    assert_eq!(resp["id"], 3);
    assert_eq!(resp["result"]["isError"], true);
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Division by zero"));

    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"multiply","a":4,"b":7}}}"#,
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["result"].as_f64(), Some(28.0));
}

#[tokio::test]
async fn test_dispatch_before_connect_fails() {
    let server = McpServer::new(dispatcher());
    let err = server
        .dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .unwrap_err();
    assert_eq!(err, LifecycleError::NotConnected);
}

#[tokio::test]
async fn test_dispatch_after_close_fails() {
    let server = connected_server().await;
    server.close().await;
    server.close().await;

    assert_eq!(server.state(), ConnectionState::Closed);
    assert_eq!(
        server
            .dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await,
        Err(LifecycleError::NotConnected)
    );
}

// =============================================================================
// Error Mapping
// =============================================================================

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = connected_server().await;
    for body in ["not valid json", "{", r#"{"jsonrpc":"2.0","id":1,"#, ""] {
        let resp = request(&server, body).await;
        assert_eq!(resp["error"]["code"], -32700, "body: {body:?}");
        assert_eq!(resp["id"], Value::Null);
        assert!(resp.get("result").is_none());
    }
}

#[tokio::test]
async fn test_unknown_tool() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":"t","method":"tools/call","params":{"name":"teleport","arguments":{}}}"#,
    )
    .await;
    assert_eq!(resp["id"], "t");
    assert_eq!(resp["error"]["code"], -32601);
    assert!(resp["error"]["message"].as_str().unwrap().contains("teleport"));
}

#[tokio::test]
async fn test_missing_required_argument() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"weather","arguments":{"unit":"celsius"}}}"#,
    )
    .await;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["data"]["parameter"], "location");
    assert_eq!(resp["error"]["data"]["reason"], "missing");
}

#[tokio::test]
async fn test_invalid_enum_and_type() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"pow","a":2,"b":3}}}"#,
    )
    .await;
    assert_eq!(resp["error"]["data"]["reason"], "invalid_enum_value");

    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"add","a":"2","b":3}}}"#,
    )
    .await;
    assert_eq!(resp["error"]["data"]["parameter"], "a");
    assert_eq!(resp["error"]["data"]["reason"], "type_mismatch");
}

#[tokio::test]
async fn test_number_outside_f64_range_is_type_mismatch() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":11,"method":"tools/call","params":{"name":"calculator","arguments":{"operation":"add","a":1e400,"b":1}}}"#,
    )
    .await;
    assert_eq!(resp["id"], 11);
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["data"]["parameter"], "a");
    assert_eq!(resp["error"]["data"]["reason"], "type_mismatch");
}

#[tokio::test]
async fn test_weather_defaults_and_ignores_unknown_arguments() {
    let server = connected_server().await;
    let resp = request(
        &server,
        r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"weather","arguments":{"location":"Lisbon","verbose":true}}}"#,
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["location"], "Lisbon");
    assert_eq!(resp["result"]["structuredContent"]["temperature"], "22.0°C");
}

#[tokio::test]
async fn test_unknown_method() {
    let server = connected_server().await;
    let resp = request(&server, r#"{"jsonrpc":"2.0","id":9,"method":"prompts/list"}"#).await;
    assert_eq!(resp["error"]["code"], -32601);
}

// =============================================================================
// Id Echoing
// =============================================================================

#[tokio::test]
async fn test_id_round_trip_on_all_paths() {
    let server = connected_server().await;
    let ids = [json!(42), json!("req-7"), json!(3.25), json!(-1), Value::Null];
    let methods = [
        json!({"method": "ping"}),
        json!({"method": "nope"}),
        json!({"method": "tools/call", "params": {"name": "calculator", "arguments": {}}}),
        json!({"method": "tools/call", "params": {"name": "missing"}}),
    ];

    for id in &ids {
        for method in &methods {
            let mut req = method.clone();
            req["jsonrpc"] = json!("2.0");
            req["id"] = id.clone();
            let resp = request(&server, &req.to_string()).await;
            assert_eq!(&resp["id"], id, "request: {req}");
        }
    }
}

#[tokio::test]
async fn test_absent_id_echoed_as_null() {
    let server = connected_server().await;
    let resp = request(&server, r#"{"jsonrpc":"2.0","method":"ping"}"#).await;
    assert!(resp.as_object().unwrap().contains_key("id"));
    assert_eq!(resp["id"], Value::Null);
    assert_eq!(resp["result"], json!({}));
}

#[tokio::test]
async fn test_concurrent_dispatch_keeps_ids_paired() {
    let server = connected_server().await;
    let requests: Vec<String> = (0..32)
        .map(|i| {
            json!({
                "jsonrpc": "2.0",
                "id": i,
                "method": "tools/call",
                "params": {
                    "name": "calculator",
                    "arguments": {"operation": "multiply", "a": i, "b": 2},
                },
            })
            .to_string()
        })
        .collect();

    let responses =
        futures::future::join_all(requests.iter().map(|raw| server.dispatch(raw))).await;

    for (i, body) in responses.into_iter().enumerate() {
        let resp: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(resp["id"], i);
        #[allow(clippy::cast_precision_loss)]
        let expected = (i * 2) as f64;
        assert_eq!(
            resp["result"]["structuredContent"]["result"].as_f64(),
            Some(expected)
        );
    }
}

// =============================================================================
// Initialize and Resources
// =============================================================================

#[tokio::test]
async fn test_initialize_advertises_resources_when_present() {
    let mut resources = ResourceRegistry::new();
    resources
        .register(Arc::new(FileSystemResource::new(Vec::new())))
        .unwrap();
    let dispatcher = Dispatcher::new(ToolRegistry::with_builtin_tools().unwrap(), resources);

    let body = dispatcher
        .dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0.0"}}}"#)
        .await;
    let resp: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(resp["result"]["capabilities"]["tools"], json!({}));
    assert_eq!(resp["result"]["capabilities"]["resources"], json!({}));
    assert_eq!(resp["result"]["serverInfo"]["name"], "keipes-mcp");
}

#[tokio::test]
async fn test_resources_list_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("readme.txt");
    std::fs::write(&file, "resource body").unwrap();

    let mut resources = ResourceRegistry::new();
    resources
        .register(Arc::new(FileSystemResource::new(vec![dir.path().to_path_buf()])))
        .unwrap();
    let dispatcher = Dispatcher::new(ToolRegistry::new(), resources);

    let list: Value = serde_json::from_str(
        &dispatcher
            .dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
            .await,
    )
    .unwrap();
    assert_eq!(list["result"]["resources"][0]["name"], "file-system");
    assert_eq!(list["result"]["resources"][0]["uri"], "file://");

    let uri = format!("file://{}", file.display());
    let req = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "resources/read",
        "params": {"uri": uri},
    });
    let read: Value = serde_json::from_str(&dispatcher.dispatch(&req.to_string()).await).unwrap();
    assert_eq!(read["result"]["contents"][0]["text"], "resource body");
    assert_eq!(read["result"]["contents"][0]["mimeType"], "text/plain");
    assert_eq!(read["result"]["contents"][0]["uri"], uri.as_str());
}

#[tokio::test]
async fn test_resource_read_failure_is_internal_error() {
    let mut resources = ResourceRegistry::new();
    resources
        .register(Arc::new(FileSystemResource::new(Vec::new())))
        .unwrap();
    let dispatcher = Dispatcher::new(ToolRegistry::new(), resources);

    let resp: Value = serde_json::from_str(
        &dispatcher
            .dispatch(r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"file:///"}}"#)
            .await,
    )
    .unwrap();
    assert_eq!(resp["id"], 3);
    assert_eq!(resp["error"]["code"], -32603);
    assert!(resp["error"]["data"].as_str().unwrap().contains("Access denied"));
}

// =============================================================================
// Serve Loop
// =============================================================================

#[tokio::test]
async fn test_serve_over_line_transport() {
    let (client, server_end) = duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_end);

    let server = McpServer::new(dispatcher());
    server
        .connect(LineTransport::new(server_read, server_write))
        .await
        .unwrap();

    let (client_read, mut client_write) = tokio::io::split(client);
    let client_task = async move {
        client_write
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                    "\n",
                    "\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                    "\n",
                    "garbage\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        let mut responses = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            responses.push(serde_json::from_str::<Value>(&line).unwrap());
        }
        responses
    };

    let (served, responses) = tokio::join!(server.serve(), client_task);
    served.unwrap();

    assert_eq!(server.state(), ConnectionState::Closed);
    assert_eq!(responses.len(), 3, "notification and blank line get no reply");
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["tools"][0]["name"], "calculator");
    assert_eq!(responses[2]["error"]["code"], -32700);
}
