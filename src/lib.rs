//! AIRS MCP - Model Context Protocol Implementation
//!
//! A complete implementation of the Model Context Protocol (MCP) on a
//! JSON-RPC 2.0 foundation: typed envelopes, a classify/route/respond
//! dispatcher, session and request-correlation state, pluggable provider
//! traits for tools/resources/prompts/logging, and both client and server
//! endpoint roles.
//!
//! # Architecture
//!
//! - **Protocol Layer** (`protocol`): JSON-RPC 2.0 envelopes, MCP domain
//!   types, and the `Transport` trait contract.
//! - **Transport Layer** (`transport`): concrete transports (stdio,
//!   in-memory) implementing that contract.
//! - **Correlation Layer** (`correlation`): outbound request/reply
//!   bookkeeping shared by sessions.
//! - **Session Layer** (`session`): per-peer conversation state — readiness,
//!   negotiated capabilities, subscriptions, pending replies.
//! - **Dispatcher Layer** (`dispatcher`): classification, routing, panic
//!   isolation, and graceful shutdown.
//! - **Handler Layer** (`handler`): the server- and client-side method
//!   tables the dispatcher consults.
//! - **Providers Layer** (`providers`): ready-to-use tool/resource/prompt/
//!   logging provider implementations.
//! - **Integration Layer** (`integration`): `McpServer` and `McpClient`, the
//!   high-level endpoint roles built on everything above.
//!
//! # Quick start
//!
//! ```rust
//! use airs_mcp::protocol::{JsonRpcRequest, JsonRpcMessageTrait, RequestId};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(
//!     "ping",
//!     Some(json!({"message": "hello world"})),
//!     RequestId::new_string("req-001"),
//! );
//!
//! let json = request.to_json().unwrap();
//! let parsed = JsonRpcRequest::from_json(&json).unwrap();
//! assert_eq!(request, parsed);
//! ```

pub mod correlation;
pub mod dispatcher;
pub mod handler;
pub mod integration;
pub mod protocol;
pub mod providers;
pub mod session;
pub mod transport;

// Re-export the JSON-RPC envelope types and MCP domain types at the crate
// root, since nearly every embedder needs these regardless of which layer
// they're working in.
pub use protocol::{
    Base64Data, ClientInfo, Content, JsonRpcError, JsonRpcMessage, JsonRpcMessageTrait,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, McpError, McpResult, MessageContext,
    MessageHandler, MimeType, ProtocolError, ProtocolResult, ProtocolVersion, RequestId,
    ServerInfo, Transport, TransportBuilder, TransportError, Uri,
};

pub use correlation::{CorrelationConfig, CorrelationError, CorrelationManager, CorrelationResult};

pub use integration::{McpClient, McpClientConfig, McpServer, McpServerBuilder, McpServerConfig};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the crate version as a string
///
/// # Examples
///
/// ```rust
/// println!("AIRS MCP version: {}", airs_mcp::version());
/// ```
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod crate_api_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_api_types_are_reachable_from_the_crate_root() {
        let request = JsonRpcRequest::new(
            "test_method",
            Some(json!({"param": "value"})),
            RequestId::new_string("test-123"),
        );
        let response =
            JsonRpcResponse::success(json!({"result": "success"}), RequestId::new_number(456));
        let notification =
            JsonRpcNotification::new("test_event", Some(json!({"event": "occurred"})));

        assert!(request.to_json().is_ok());
        assert!(response.to_json().is_ok());
        assert!(notification.to_json().is_ok());
    }

    #[test]
    fn round_trip_serialization_preserves_equality() {
        let original = JsonRpcRequest::new(
            "echo",
            Some(json!([1, 2, 3])),
            RequestId::new_string("echo-001"),
        );

        let json = original.to_json().unwrap();
        let parsed = JsonRpcRequest::from_json(&json).unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn request_id_variants_serialize_to_their_own_json_types() {
        let string_request = JsonRpcRequest::new("test", None, RequestId::new_string("uuid-12345"));
        let numeric_request = JsonRpcRequest::new("test", None, RequestId::new_number(67890));

        assert!(string_request.to_json().unwrap().contains(r#""id":"uuid-12345""#));
        assert!(numeric_request.to_json().unwrap().contains(r#""id":67890"#));
    }

    #[test]
    fn version_reports_the_crate_version() {
        assert_eq!(version(), VERSION);
        assert!(!version().is_empty());
    }

    #[test]
    fn json_rpc_envelopes_stay_spec_compliant() {
        let request = JsonRpcRequest::new("ping", None, RequestId::new_number(1));
        let response = JsonRpcResponse::success(json!("pong"), RequestId::new_number(1));
        let notification = JsonRpcNotification::new("heartbeat", None);

        let request_json = request.to_json().unwrap();
        let response_json = response.to_json().unwrap();
        let notification_json = notification.to_json().unwrap();

        assert!(request_json.contains(r#""jsonrpc":"2.0""#));
        assert!(response_json.contains(r#""jsonrpc":"2.0""#));
        assert!(notification_json.contains(r#""jsonrpc":"2.0""#));

        assert!(request_json.contains(r#""method":"ping""#));
        assert!(notification_json.contains(r#""method":"heartbeat""#));

        assert!(request_json.contains(r#""id":1"#));
        assert!(!notification_json.contains("id"));

        assert!(response_json.contains(r#""result":"pong""#));
        assert!(response_json.contains(r#""id":1"#));
        assert!(!response_json.contains("error"));
    }
}
