//! Endpoint layer: [`McpServer`] and [`McpClient`], the two roles built on
//! top of the dispatcher/session/handler machinery.
//!
//! Both roles share the same [`crate::dispatcher::Dispatcher`] and the same
//! per-connection wiring — a [`crate::session::Session`] registered in the
//! dispatcher, a [`DeferredSink`] bridging the chicken-and-egg problem of a
//! transport's handler needing a sink that isn't known until the transport
//! itself is built — but expose very different surfaces: `McpServer` drives
//! `serve()` to completion and pushes notifications, `McpClient` exposes
//! typed request methods atop an internal `call()`.

pub mod client;
pub mod constants;
pub mod server;

pub use client::{McpClient, McpClientConfig};
pub use server::{McpServer, McpServerBuilder, McpServerConfig};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Notify, RwLock};
use tracing::error;

use crate::dispatcher::Dispatcher;
use crate::protocol::message::JsonRpcMessage;
use crate::protocol::transport::{MessageContext, MessageHandler, SessionSink, TransportError};

/// A [`SessionSink`] that doesn't know its underlying transport until after
/// that transport has been built — the transport's `MessageHandler` must be
/// supplied at build time, but the handler's session needs a sink to reply
/// through, and that sink wraps the transport the handler is busy being
/// built into. `DeferredSink` breaks the cycle: the session is created and
/// registered with this sink bound to nothing, the transport is built and
/// wrapped, and only then is `bind` called. Nothing can arrive for the
/// session before `start()` is called on the transport, so `send` is never
/// observed unbound in practice.
pub(crate) struct DeferredSink {
    inner: RwLock<Option<Arc<dyn SessionSink>>>,
}

impl DeferredSink {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub(crate) async fn bind(&self, sink: Arc<dyn SessionSink>) {
        *self.inner.write().await = Some(sink);
    }
}

#[async_trait]
impl SessionSink for DeferredSink {
    async fn send(&self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        match self.inner.read().await.as_ref() {
            Some(sink) => sink.send(message).await,
            None => Err(TransportError::Protocol {
                message: "session sink not yet bound to a transport".to_string(),
            }),
        }
    }
}

/// Bridges a [`crate::protocol::transport::Transport`]'s inbound frames to a
/// single registered session in a [`Dispatcher`], for either role — the
/// dispatcher's own `classify`/route step already tells a request from a
/// response from a notification, so the same bridge works for both a server
/// fielding client requests and a client fielding server responses.
pub(crate) struct EndpointMessageHandler {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) session_id: String,
    pub(crate) closed: Arc<Notify>,
}

#[async_trait]
impl MessageHandler<()> for EndpointMessageHandler {
    async fn handle_message(&self, raw: Value, _context: MessageContext<()>) {
        match self.dispatcher.sessions().get(&self.session_id) {
            Some(session) => self.dispatcher.handle_inbound(session, raw).await,
            None => error!(session_id = %self.session_id, "inbound frame for unknown session"),
        }
    }

    async fn handle_error(&self, error: TransportError) {
        error!(session_id = %self.session_id, %error, "transport error");
    }

    async fn handle_close(&self) {
        self.dispatcher.remove_session(&self.session_id).await;
        self.closed.notify_waiters();
    }
}
