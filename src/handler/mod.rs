//! Role-specific method tables consulted by the [`crate::dispatcher::Dispatcher`].
//!
//! `ServerHandlerTable` services the `initialize`/`ping`/`tools/*`/`prompts/*`/
//! `resources/*`/`logging/*` surface against the embedder-supplied provider
//! traits in [`crate::providers`]. `ClientHandlerTable` services the much
//! smaller set of server-initiated requests and notifications a client must
//! answer (currently `ping` and the `notifications/*` fan-out).

mod client;
mod server;

pub use client::{ClientEventHandler, ClientHandlerTable, NullClientEventHandler};
pub use server::ServerHandlerTable;
