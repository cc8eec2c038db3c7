//! Protocol Layer - JSON-RPC 2.0 envelopes and MCP domain types
//!
//! This module holds the wire-level building blocks shared by every other
//! layer: the JSON-RPC envelope types, the MCP domain types (tools, prompts,
//! resources, capabilities), method name and error code constants, and the
//! `Transport` trait the dispatcher is built against.
//!
//! ## Module organization
//!
//! - `message`: JSON-RPC 2.0 request/response/notification types
//! - `types`: MCP domain types (capabilities, tools, prompts, resources, content)
//! - `transport`: transport abstraction trait and message context
//! - `errors`: protocol-level error types
//! - `constants`: method name and JSON-RPC error code constants

pub mod constants;
pub mod errors;
pub mod message;
pub mod transport;
pub mod types;

pub use constants::*;
pub use errors::*;
pub use message::*;
pub use transport::*;
pub use types::*;
