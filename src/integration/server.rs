//! [`McpServer`]: the server role, built atop a [`Dispatcher`] configured with
//! a [`ServerHandlerTable`].
//!
//! Construction is split from serving: a [`McpServerBuilder`] wires up
//! whichever provider traits the embedder supplies, `build()` produces an
//! `McpServer` that owns the dispatcher and can accept any number of peer
//! connections — `serve()` is called once per transport/session pair, and
//! returns once that connection closes.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, Notify};
use tracing::warn;

use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::handler::ServerHandlerTable;
use crate::protocol::constants::methods;
use crate::protocol::errors::McpResult;
use crate::protocol::message::JsonRpcMessage;
use crate::protocol::transport::{Transport, TransportBuilder, TransportError, TransportSink};
use crate::protocol::types::ServerInfo;
use crate::providers::{LoggingHandler, PromptProvider, ResourceProvider, ToolProvider};
use crate::session::{Session, SessionConfig};

use super::{DeferredSink, EndpointMessageHandler};

/// Implementation info and policy for a server endpoint.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub server_info: ServerInfo,
    pub instructions: Option<String>,
    /// Reserved for forward extension (e.g. schema-validating method params
    /// before dispatch). The baseline envelope check (`jsonrpc == "2.0"`,
    /// non-empty `method`) runs unconditionally in the dispatcher regardless
    /// of this flag; this field currently has no effect on its own.
    pub strict_validation: bool,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            server_info: ServerInfo {
                name: super::constants::defaults::SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
            strict_validation: super::constants::defaults::STRICT_VALIDATION,
        }
    }
}

/// Builds an [`McpServer`] from an [`McpServerConfig`] plus whichever
/// provider traits the embedder wants to support.
pub struct McpServerBuilder {
    config: McpServerConfig,
    resources: Option<Arc<dyn ResourceProvider>>,
    tools: Option<Arc<dyn ToolProvider>>,
    prompts: Option<Arc<dyn PromptProvider>>,
    logging: Option<Arc<dyn LoggingHandler>>,
    dispatcher_config: DispatcherConfig,
}

impl McpServerBuilder {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            resources: None,
            tools: None,
            prompts: None,
            logging: None,
            dispatcher_config: DispatcherConfig::default(),
        }
    }

    pub fn resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(provider);
        self
    }

    pub fn tool_provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.tools = Some(provider);
        self
    }

    pub fn prompt_provider(mut self, provider: Arc<dyn PromptProvider>) -> Self {
        self.prompts = Some(provider);
        self
    }

    pub fn logging_handler(mut self, handler: Arc<dyn LoggingHandler>) -> Self {
        self.logging = Some(handler);
        self
    }

    /// Override the graceful-shutdown deadline and other dispatcher policy.
    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher_config = config;
        self
    }

    pub fn build(self) -> McpServer {
        let mut handlers = ServerHandlerTable::new(self.config.server_info, self.config.instructions);
        if let Some(provider) = self.resources {
            handlers = handlers.with_resource_provider(provider);
        }
        if let Some(provider) = self.tools {
            handlers = handlers.with_tool_provider(provider);
        }
        if let Some(provider) = self.prompts {
            handlers = handlers.with_prompt_provider(provider);
        }
        if let Some(handler) = self.logging {
            handlers = handlers.with_logging_handler(handler);
        }

        McpServer {
            dispatcher: Arc::new(Dispatcher::new(Arc::new(handlers), self.dispatcher_config)),
        }
    }
}

/// The server role. Cheaply cloneable (an `Arc` around its dispatcher) so a
/// single instance can be shared across however many concurrent connections
/// `serve()` is called for.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    /// Accept one peer connection over `transport_builder` as session
    /// `session_id`, and run until that session's transport closes.
    pub async fn serve<B>(&self, transport_builder: B, session_id: impl Into<String>) -> McpResult<()>
    where
        B: TransportBuilder<(), Error = TransportError>,
        B::Transport: Transport<Error = TransportError> + Send + 'static,
    {
        let session_id = session_id.into();
        let sink = Arc::new(DeferredSink::new());
        let session = Arc::new(
            Session::new(session_id.clone(), sink.clone(), SessionConfig::default()).await?,
        );
        self.dispatcher.register_session(Arc::clone(&session));

        let closed = Arc::new(Notify::new());
        let handler = Arc::new(EndpointMessageHandler {
            dispatcher: Arc::clone(&self.dispatcher),
            session_id: session_id.clone(),
            closed: Arc::clone(&closed),
        });

        let transport = transport_builder.with_message_handler(handler).build().await?;
        let transport = Arc::new(Mutex::new(transport));
        sink.bind(Arc::new(TransportSink::new(Arc::clone(&transport)))).await;

        transport.lock().await.start().await?;
        closed.notified().await;
        Ok(())
    }

    /// Begin graceful shutdown: stop admitting new requests, wait for
    /// in-flight handlers to drain (up to the dispatcher's configured
    /// deadline), then cancel every session's outstanding outbound calls.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    /// Emit `notifications/resources/updated` to every ready session
    /// subscribed to `uri`.
    pub async fn notify_resource_updated(&self, uri: &str) {
        let message = JsonRpcMessage::from_notification(
            methods::NOTIFICATION_RESOURCES_UPDATED,
            Some(json!({"uri": uri})),
        );
        for session in self.dispatcher.sessions().all() {
            if session.is_ready() && session.is_subscribed(uri) {
                if let Err(err) = session.sink().send(&message).await {
                    warn!(session_id = session.id(), %err, "failed to deliver resources/updated");
                }
            }
        }
    }

    /// Emit a `notifications/*/list_changed` notification to every ready session.
    async fn broadcast_list_changed(&self, method: &str) {
        let message = JsonRpcMessage::from_notification(method, None);
        for session in self.dispatcher.sessions().all() {
            if session.is_ready() {
                if let Err(err) = session.sink().send(&message).await {
                    warn!(session_id = session.id(), %err, method, "failed to deliver list_changed notification");
                }
            }
        }
    }

    pub async fn notify_tools_list_changed(&self) {
        self.broadcast_list_changed(methods::NOTIFICATION_TOOLS_LIST_CHANGED).await;
    }

    pub async fn notify_prompts_list_changed(&self) {
        self.broadcast_list_changed(methods::NOTIFICATION_PROMPTS_LIST_CHANGED).await;
    }

    pub async fn notify_resources_list_changed(&self) {
        self.broadcast_list_changed(methods::NOTIFICATION_RESOURCES_LIST_CHANGED).await;
    }

    /// Number of currently connected sessions.
    pub fn session_count(&self) -> usize {
        self.dispatcher.sessions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::providers::MathToolProvider;
    use crate::transport::in_memory_pair;

    fn config() -> McpServerConfig {
        McpServerConfig {
            server_info: ServerInfo {
                name: "test-server".to_string(),
                version: "0.0.0".to_string(),
            },
            instructions: None,
            strict_validation: true,
        }
    }

    #[tokio::test]
    async fn serve_completes_once_the_peer_disconnects() {
        let server = McpServerBuilder::new(config())
            .tool_provider(Arc::new(MathToolProvider::new()))
            .build();

        let (server_builder, client_builder) = in_memory_pair::<()>();

        let server_task = tokio::spawn({
            let server = server.clone();
            async move { server.serve(server_builder, "peer-1").await }
        });

        // Build the peer end just enough to start (and then drop) the
        // connection, which closes the server's reader loop.
        struct NoopHandler;
        #[async_trait::async_trait]
        impl crate::protocol::transport::MessageHandler<()> for NoopHandler {
            async fn handle_message(&self, _raw: serde_json::Value, _context: crate::protocol::transport::MessageContext<()>) {}
            async fn handle_error(&self, _error: TransportError) {}
            async fn handle_close(&self) {}
        }
        let mut client_transport = client_builder
            .with_message_handler(Arc::new(NoopHandler))
            .build()
            .await
            .unwrap();
        client_transport.start().await.unwrap();
        client_transport.close().await.unwrap();
        drop(client_transport);

        let result = tokio::time::timeout(Duration::from_secs(1), server_task).await;
        assert!(result.is_ok(), "serve() should return once the peer drops");
        assert_eq!(server.session_count(), 0);
    }
}
