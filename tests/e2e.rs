//! End-to-end scenarios wiring a real [`McpClient`] against a real
//! [`McpServer`] over the in-memory transport: the handshake and happy
//! path, resource subscription fan-out across multiple sessions, and
//! graceful shutdown as observed from a connected client.
//!
//! These only exercise the crate's public surface, the way an embedder
//! would. The readiness gate and the raw unknown-method rejection are
//! already covered at the unit level, closer to the machinery that
//! enforces them (`dispatcher::core` and `integration::client`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use airs_mcp::handler::ClientEventHandler;
use airs_mcp::integration::{McpClient, McpClientConfig, McpServer, McpServerBuilder, McpServerConfig};
use airs_mcp::protocol::constants::error_codes;
use airs_mcp::protocol::errors::McpError;
use airs_mcp::providers::{ConfigurationResourceProvider, MathToolProvider};
use airs_mcp::transport::in_memory_pair;
use airs_mcp::ServerInfo;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn server_config(name: &str) -> McpServerConfig {
    McpServerConfig {
        server_info: ServerInfo {
            name: name.to_string(),
            version: "0.0.0".to_string(),
        },
        instructions: None,
        strict_validation: true,
    }
}

#[tokio::test]
async fn happy_path_tools_round_trip_over_the_in_memory_transport() {
    init_tracing();
    let server = McpServerBuilder::new(server_config("e2e-tools-server"))
        .tool_provider(Arc::new(MathToolProvider::new()))
        .build();
    let (server_builder, client_builder) = in_memory_pair::<()>();

    let server_task = tokio::spawn({
        let server = server.clone();
        async move { server.serve(server_builder, "peer-1").await }
    });

    let client = McpClient::connect(client_builder, McpClientConfig::default())
        .await
        .expect("handshake should succeed");

    let tools = client.list_tools(None).await.expect("tools/list should succeed");
    assert!(tools.tools.iter().any(|t| t.name == "add"));
    assert!(tools.tools.iter().any(|t| t.name == "subtract"));

    let result = client
        .call_tool("add", json!({"a": 2, "b": 3}))
        .await
        .expect("tools/call should succeed");
    assert!(!result.is_error);

    // An unconfigured capability surfaces as a peer-side error, not a panic
    // or a local timeout: the server has no prompt provider here.
    let err = client.list_prompts(None).await.unwrap_err();
    assert!(matches!(err, McpError::PeerError { .. }));

    client.close().await.expect("close should succeed");
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task)
        .await
        .expect("serve() should return once the client disconnects");
}

#[derive(Default)]
struct RecordingEventHandler {
    updates: Mutex<Vec<String>>,
    update_count: AtomicUsize,
}

#[async_trait]
impl ClientEventHandler for RecordingEventHandler {
    async fn on_resource_updated(&self, uri: &str) {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().await.push(uri.to_string());
    }
}

#[tokio::test]
async fn resource_update_notifications_only_reach_still_subscribed_sessions() {
    init_tracing();
    let resources = Arc::new(ConfigurationResourceProvider::new());
    resources.set_config("greeting".to_string(), json!("hello")).await;

    let server = McpServerBuilder::new(server_config("e2e-resource-server"))
        .resource_provider(resources)
        .build();

    let (server_builder_a, client_builder_a) = in_memory_pair::<()>();
    let (server_builder_b, client_builder_b) = in_memory_pair::<()>();

    let server_task_a = tokio::spawn({
        let server = server.clone();
        async move { server.serve(server_builder_a, "subscriber-a").await }
    });
    let server_task_b = tokio::spawn({
        let server = server.clone();
        async move { server.serve(server_builder_b, "subscriber-b").await }
    });

    let events_a = Arc::new(RecordingEventHandler::default());
    let events_b = Arc::new(RecordingEventHandler::default());

    let client_a =
        McpClient::connect_with_events(client_builder_a, McpClientConfig::default(), events_a.clone())
            .await
            .expect("client a handshake should succeed");
    let client_b =
        McpClient::connect_with_events(client_builder_b, McpClientConfig::default(), events_b.clone())
            .await
            .expect("client b handshake should succeed");

    client_a
        .subscribe_resource("config://greeting")
        .await
        .expect("subscribing to an existing config key should succeed");
    client_b
        .subscribe_resource("config://greeting")
        .await
        .expect("subscribing to an existing config key should succeed");

    assert_eq!(server.session_count(), 2);

    client_b
        .unsubscribe_resource("config://greeting")
        .await
        .expect("unsubscribing should succeed");

    server.notify_resource_updated("config://greeting").await;

    // Give the notification a moment to flow through the in-memory transport.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(events_a.update_count.load(Ordering::SeqCst), 1);
    assert_eq!(events_a.updates.lock().await.as_slice(), ["config://greeting"]);
    assert_eq!(events_b.update_count.load(Ordering::SeqCst), 0);

    client_a.close().await.unwrap();
    client_b.close().await.unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task_a).await;
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task_b).await;
}

#[tokio::test]
async fn subscribing_to_a_missing_config_key_fails_without_registering_a_subscription() {
    init_tracing();
    let resources = Arc::new(ConfigurationResourceProvider::new());

    let server = McpServerBuilder::new(server_config("e2e-resource-server-missing"))
        .resource_provider(resources)
        .build();

    let (server_builder, client_builder) = in_memory_pair::<()>();
    let server_task = tokio::spawn({
        let server = server.clone();
        async move { server.serve(server_builder, "subscriber-missing").await }
    });

    let client = McpClient::connect(client_builder, McpClientConfig::default())
        .await
        .expect("handshake should succeed");

    let err = client.subscribe_resource("config://does-not-exist").await.unwrap_err();
    assert!(matches!(err, McpError::PeerError { .. }));

    client.close().await.unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task).await;
}

#[tokio::test]
async fn graceful_shutdown_rejects_new_calls_once_in_flight_work_drains() {
    init_tracing();
    let server = McpServerBuilder::new(server_config("e2e-shutdown-server"))
        .tool_provider(Arc::new(MathToolProvider::new()))
        .build();
    let (server_builder, client_builder) = in_memory_pair::<()>();

    let server_task = tokio::spawn({
        let server = server.clone();
        async move { server.serve(server_builder, "peer-shutdown").await }
    });

    let client = McpClient::connect(client_builder, McpClientConfig::default())
        .await
        .expect("handshake should succeed");

    client.ping().await.expect("ping should succeed before shutdown");

    server.shutdown().await;

    let err = client.ping().await.unwrap_err();
    match err {
        McpError::PeerError { code, message, .. } => {
            assert_eq!(code, error_codes::INTERNAL_ERROR);
            assert!(message.contains("shutdown"));
        }
        other => panic!("expected a PeerError carrying INTERNAL_ERROR, got {other:?}"),
    }

    client.close().await.unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task).await;
}
