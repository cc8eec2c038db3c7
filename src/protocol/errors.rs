//! Error Types - Protocol, JSON-RPC and MCP error hierarchies
//!
//! Each layer of the crate owns its own `thiserror` enum; lower-layer errors
//! convert into higher-layer ones via `From` impls so call sites can use `?`
//! without manual wrapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correlation::CorrelationError;
use crate::protocol::transport::TransportError;

/// Protocol-layer errors: malformed envelopes, invalid newtypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ProtocolError {
    /// JSON-RPC related errors
    #[error("JSON-RPC error: {message}")]
    JsonRpc { message: String },

    /// MCP protocol specific errors
    #[error("MCP protocol error: {message}")]
    Mcp { message: String },

    /// Transport layer errors
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Invalid message format errors
    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },

    /// Invalid base64 data
    #[error("Invalid base64 data")]
    InvalidBase64Data,

    /// Invalid protocol version
    #[error("Invalid protocol version: {0}")]
    InvalidProtocolVersion(String),

    /// Invalid URI format
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid MIME type format
    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),
}

/// Convenient result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// JSON-RPC 2.0 error kinds, mapped to the fixed wire error codes in `constants::error_codes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum JsonRpcError {
    /// Parse error (-32700)
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Invalid request (-32600)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Method not found (-32601)
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// Invalid parameters (-32602)
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    /// Internal error (-32603)
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Server error (custom error codes)
    #[error("Server error {code}: {message}")]
    ServerError { code: i32, message: String },
}

/// Embedder/client-facing error: everything a caller of `McpClient`/`McpServer`
/// can observe, including peer-surfaced JSON-RPC errors and local session faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum McpError {
    /// Protocol version mismatch
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    /// Capability not supported
    #[error("Unsupported capability: {capability}")]
    UnsupportedCapability { capability: String },

    /// Resource not found
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// Tool not found
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// Prompt not found
    #[error("Prompt not found: {name}")]
    PromptNotFound { name: String },

    /// Malformed or semantically invalid request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Catch-all for provider-side failures that don't fit a more specific variant
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Authorization failed
    #[error("Authorization failed: {reason}")]
    AuthorizationFailed { reason: String },

    /// Invalid URI format
    #[error("Invalid URI: {uri} - {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Request timeout
    #[error("Request timeout after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    /// The peer returned a JSON-RPC error response.
    #[error("peer error {code}: {message}")]
    PeerError {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// No session exists for the addressed peer.
    #[error("no session: {session_id}")]
    LackSession { session_id: String },

    /// A method other than `initialize`/`ping` was serviced against a session
    /// that has not completed the initialize handshake.
    #[error("session {session_id} has not completed initialization")]
    SessionNotReady { session_id: String },

    /// A second response arrived for a request ID whose slot was already filled.
    #[error("duplicate response for request {request_id}")]
    DuplicateResponse { request_id: String },

    /// A response arrived for a request ID with no registered reply slot.
    #[error("no pending request for response {request_id}")]
    LackResponseChan { request_id: String },

    /// The endpoint has begun graceful shutdown and rejects new requests.
    #[error("server already shutdown")]
    ServerShutdown,

    /// A local call was cancelled before a reply arrived.
    #[error("request {request_id} cancelled")]
    RequestCancelled { request_id: String },

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol-layer failure (serialization, malformed envelope, invalid newtype).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<CorrelationError> for McpError {
    fn from(err: CorrelationError) -> Self {
        match err {
            CorrelationError::Timeout { duration, .. } => Self::RequestTimeout {
                timeout_ms: duration.num_milliseconds().max(0) as u64,
            },
            CorrelationError::RequestNotFound { id } => Self::LackResponseChan {
                request_id: id.to_string(),
            },
            CorrelationError::AlreadyCompleted { id } => Self::DuplicateResponse {
                request_id: id.to_string(),
            },
            CorrelationError::Cancelled { id } => Self::RequestCancelled {
                request_id: id.to_string(),
            },
            CorrelationError::ChannelClosed { id, details } => Self::InternalError {
                message: format!("channel closed for request {id}: {details}"),
            },
            CorrelationError::Internal { message } => Self::InternalError { message },
            CorrelationError::PeerError { code, message, data, .. } => {
                Self::PeerError { code, message, data }
            }
        }
    }
}

/// Convenient result type for embedder/client-facing operations.
pub type McpResult<T> = Result<T, McpError>;

// Convenience constructors and JSON-RPC error code mappings
impl JsonRpcError {
    /// JSON-RPC 2.0 error codes as defined in the specification
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Get the JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            JsonRpcError::ParseError { .. } => Self::PARSE_ERROR,
            JsonRpcError::InvalidRequest { .. } => Self::INVALID_REQUEST,
            JsonRpcError::MethodNotFound { .. } => Self::METHOD_NOT_FOUND,
            JsonRpcError::InvalidParams { .. } => Self::INVALID_PARAMS,
            JsonRpcError::InternalError { .. } => Self::INTERNAL_ERROR,
            JsonRpcError::ServerError { code, .. } => *code,
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method not found error
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create an invalid parameters error
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Create a server error with custom code
    pub fn server_error(code: i32, message: impl Into<String>) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
        }
    }
}

// Convenience constructors for ProtocolError
impl ProtocolError {
    /// Create a JSON-RPC error
    pub fn jsonrpc(message: impl Into<String>) -> Self {
        Self::JsonRpc {
            message: message.into(),
        }
    }

    /// Create an MCP protocol error
    pub fn mcp(message: impl Into<String>) -> Self {
        Self::Mcp {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an invalid message error
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }
}

// Convenience constructors for McpError
impl McpError {
    /// Create a version mismatch error
    pub fn version_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported capability error
    pub fn unsupported_capability(capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            capability: capability.into(),
        }
    }

    /// Create a resource not found error
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a prompt not found error
    pub fn prompt_not_found(name: impl Into<String>) -> Self {
        Self::PromptNotFound { name: name.into() }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Create an authorization failed error
    pub fn authorization_failed(reason: impl Into<String>) -> Self {
        Self::AuthorizationFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a request timeout error
    pub fn request_timeout(timeout_ms: u64) -> Self {
        Self::RequestTimeout { timeout_ms }
    }

    /// Create a peer-surfaced JSON-RPC error
    pub fn peer_error(code: i32, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::PeerError {
            code,
            message: message.into(),
            data,
        }
    }

    /// Create a "no session" error
    pub fn lack_session(session_id: impl Into<String>) -> Self {
        Self::LackSession {
            session_id: session_id.into(),
        }
    }

    /// Create a "session not ready" error
    pub fn session_not_ready(session_id: impl Into<String>) -> Self {
        Self::SessionNotReady {
            session_id: session_id.into(),
        }
    }
}
