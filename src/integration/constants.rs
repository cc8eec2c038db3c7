//! Defaults for [`super::client::McpClientConfig`] and [`super::server::McpServerConfig`].

pub use crate::protocol::constants::*;

/// Default configuration values shared by client and server endpoint configs.
pub mod defaults {
    /// Default client implementation name advertised during `initialize`.
    pub const CLIENT_NAME: &str = "airs-mcp-client";

    /// Default server implementation name advertised during `initialize`.
    pub const SERVER_NAME: &str = "airs-mcp-server";

    /// Default per-call timeout in seconds.
    pub const TIMEOUT_SECONDS: u64 = 30;

    /// Default setting for rejecting malformed envelopes up front rather than
    /// letting a handler discover the problem.
    pub const STRICT_VALIDATION: bool = true;
}
