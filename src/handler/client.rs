//! Client-side method table: what a client must answer when the server
//! speaks first.
//!
//! A client mostly issues requests and waits on [`crate::session::Session`]'s
//! pending-reply table for the matching response. But the server can also
//! speak first: it can `ping` the client, and it can push notifications
//! (`resources/updated`, the three `*/list_changed` notifications) that the
//! client has no reply slot for because nothing was sent to correlate them
//! against. `ClientHandlerTable` is the [`HandlerTable`] the dispatcher
//! consults for that traffic; embedders plug in a [`ClientEventHandler`] to
//! observe the notifications without having to implement dispatch plumbing
//! themselves.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::dispatcher::{HandlerError, HandlerTable};
use crate::protocol::constants::methods;
use crate::session::Session;

/// Callbacks for server-initiated notifications a client may receive.
///
/// All methods default to a no-op so embedders only override what they
/// care about.
#[async_trait]
pub trait ClientEventHandler: Send + Sync {
    /// The resource at `uri` changed; a subscribed client should re-read it.
    async fn on_resource_updated(&self, _uri: &str) {}

    /// The server's resource list changed; a client should re-issue `resources/list`.
    async fn on_resources_list_changed(&self) {}

    /// The server's tool list changed; a client should re-issue `tools/list`.
    async fn on_tools_list_changed(&self) {}

    /// The server's prompt list changed; a client should re-issue `prompts/list`.
    async fn on_prompts_list_changed(&self) {}
}

/// A [`ClientEventHandler`] that ignores everything. Used when an embedder
/// has no use for server-pushed notifications but still needs a client.
#[derive(Debug, Default)]
pub struct NullClientEventHandler;

#[async_trait]
impl ClientEventHandler for NullClientEventHandler {}

/// [`HandlerTable`] implementation for the client role.
///
/// Answers `ping` inline and fans server notifications out to an
/// [`ClientEventHandler`]. Everything else a client might receive as a
/// request (there is currently nothing else in the method table a server
/// sends) surfaces as `MethodNotFound`.
pub struct ClientHandlerTable {
    events: Arc<dyn ClientEventHandler>,
}

impl ClientHandlerTable {
    pub fn new(events: Arc<dyn ClientEventHandler>) -> Self {
        Self { events }
    }
}

impl Default for ClientHandlerTable {
    fn default() -> Self {
        Self::new(Arc::new(NullClientEventHandler))
    }
}

#[async_trait]
impl HandlerTable for ClientHandlerTable {
    async fn handle_request(
        &self,
        _session: &Arc<Session>,
        method: &str,
        _params: Option<Value>,
    ) -> Result<Value, HandlerError> {
        match method {
            methods::PING => Ok(Value::Object(Default::default())),
            other => Err(HandlerError::MethodNotFound(other.to_string())),
        }
    }

    async fn handle_notification(
        &self,
        session: &Arc<Session>,
        method: &str,
        params: Option<Value>,
    ) {
        match method {
            methods::NOTIFICATION_RESOURCES_UPDATED => {
                let uri = params
                    .as_ref()
                    .and_then(|p| p.get("uri"))
                    .and_then(|v| v.as_str());
                match uri {
                    Some(uri) => self.events.on_resource_updated(uri).await,
                    None => debug!(
                        session_id = session.id(),
                        "resources/updated notification missing 'uri'"
                    ),
                }
            }
            methods::NOTIFICATION_RESOURCES_LIST_CHANGED => {
                self.events.on_resources_list_changed().await
            }
            methods::NOTIFICATION_TOOLS_LIST_CHANGED => self.events.on_tools_list_changed().await,
            methods::NOTIFICATION_PROMPTS_LIST_CHANGED => {
                self.events.on_prompts_list_changed().await
            }
            other => debug!(session_id = session.id(), method = other, "unhandled client-side notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::correlation::CorrelationConfig;
    use crate::protocol::message::JsonRpcMessage;
    use crate::protocol::transport::{SessionSink, TransportError};
    use crate::session::SessionConfig;
    use serde_json::json;

    struct NullSink;

    #[async_trait]
    impl SessionSink for NullSink {
        async fn send(&self, _message: &JsonRpcMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    async fn session() -> Arc<Session> {
        Arc::new(
            Session::new(
                "s1",
                Arc::new(NullSink),
                SessionConfig {
                    correlation: CorrelationConfig::default(),
                },
            )
            .await
            .unwrap(),
        )
    }

    #[derive(Default)]
    struct RecordingEvents {
        updated: AtomicUsize,
        resources_changed: AtomicUsize,
        tools_changed: AtomicUsize,
        prompts_changed: AtomicUsize,
    }

    #[async_trait]
    impl ClientEventHandler for RecordingEvents {
        async fn on_resource_updated(&self, _uri: &str) {
            self.updated.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_resources_list_changed(&self) {
            self.resources_changed.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_tools_list_changed(&self) {
            self.tools_changed.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_prompts_list_changed(&self) {
            self.prompts_changed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn ping_is_answered_inline() {
        let table = ClientHandlerTable::default();
        let session = session().await;

        let result = table
            .handle_request(&session, methods::PING, None)
            .await
            .unwrap();

        assert_eq!(result, Value::Object(Default::default()));
    }

    #[tokio::test]
    async fn unknown_request_is_method_not_found() {
        let table = ClientHandlerTable::default();
        let session = session().await;

        let err = table
            .handle_request(&session, "sampling/createMessage", None)
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::MethodNotFound(m) if m == "sampling/createMessage"));
    }

    #[tokio::test]
    async fn resource_updated_notification_reaches_the_event_handler() {
        let events = Arc::new(RecordingEvents::default());
        let table = ClientHandlerTable::new(events.clone());
        let session = session().await;

        table
            .handle_notification(
                &session,
                methods::NOTIFICATION_RESOURCES_UPDATED,
                Some(json!({"uri": "file:///a.txt"})),
            )
            .await;

        assert_eq!(events.updated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn list_changed_notifications_fan_out_by_kind() {
        let events = Arc::new(RecordingEvents::default());
        let table = ClientHandlerTable::new(events.clone());
        let session = session().await;

        table
            .handle_notification(&session, methods::NOTIFICATION_TOOLS_LIST_CHANGED, None)
            .await;
        table
            .handle_notification(&session, methods::NOTIFICATION_PROMPTS_LIST_CHANGED, None)
            .await;
        table
            .handle_notification(&session, methods::NOTIFICATION_RESOURCES_LIST_CHANGED, None)
            .await;

        assert_eq!(events.tools_changed.load(Ordering::SeqCst), 1);
        assert_eq!(events.prompts_changed.load(Ordering::SeqCst), 1);
        assert_eq!(events.resources_changed.load(Ordering::SeqCst), 1);
    }
}
