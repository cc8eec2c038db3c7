//! Transport abstraction layer.
//!
//! A transport moves raw JSON-RPC frames between this process and a peer.
//! Everything here implements the event-driven contract in
//! [`crate::protocol::transport`]: a transport is built pre-configured with a
//! [`crate::protocol::transport::MessageHandler`] (the [`TransportBuilder`]
//! pattern), then `start()`ed to begin feeding it inbound frames.
//!
//! # Transports
//!
//! - [`stdio`] — newline-delimited JSON-RPC over stdin/stdout, the transport
//!   used when an MCP server is launched as a child process.
//! - [`inmemory`] — an in-process duplex pair, used by this crate's own
//!   integration tests and available to embedders for theirs.

pub mod inmemory;
pub mod stdio;

pub use inmemory::{in_memory_pair, InMemoryTransport, InMemoryTransportBuilder};
pub use stdio::{StdioTransport, StdioTransportBuilder};

pub use crate::protocol::transport::{Transport, TransportBuilder, TransportError};
