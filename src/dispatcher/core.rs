//! The `Dispatcher`: owns the session registry, in-flight request accounting,
//! and the classify → route → respond algorithm.
//!
//! Grounded on the original implementation's `receive`/`receiveRequest`/
//! `receiveNotify`/`receiveResponse` functions: `notifications/initialized` is
//! the only notification dispatched synchronously (so a concurrently spawned
//! request handler can never observe a session becoming ready mid-flight);
//! every other notification and every request runs on a panic-isolated spawned
//! task; responses are always spawned and delivered through the session's
//! pending-reply table, with missing/duplicate deliveries logged rather than
//! propagated as errors.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::classify::{classify, Classified};
use super::panic_guard::spawn_guarded;
use crate::correlation::{CorrelationError, DeliverOutcome};
use crate::protocol::constants::{error_codes, methods};
use crate::protocol::errors::McpError;
use crate::protocol::message::{JsonRpcMessage, RequestId};
use crate::session::{Session, SessionMap};

/// Outcome of a handler invocation, carrying enough structure to build a
/// JSON-RPC error object without the handler needing to know the wire codes.
#[derive(Debug, Clone)]
pub enum HandlerError {
    MethodNotFound(String),
    InvalidParams(String),
    Internal(String),
    Mcp(McpError),
}

impl HandlerError {
    fn into_error_value(self) -> Value {
        let (code, message, data) = match self {
            HandlerError::MethodNotFound(method) => (
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {method}"),
                None,
            ),
            HandlerError::InvalidParams(message) => (error_codes::INVALID_PARAMS, message, None),
            HandlerError::Internal(message) => (error_codes::INTERNAL_ERROR, message, None),
            HandlerError::Mcp(McpError::PeerError { code, message, data }) => (code, message, data),
            HandlerError::Mcp(other) => (error_codes::INTERNAL_ERROR, other.to_string(), None),
        };
        let mut object = serde_json::json!({"code": code, "message": message});
        if let Some(data) = data {
            object["data"] = data;
        }
        object
    }
}

/// Method-name → behavior table consulted by the dispatcher for one role
/// (server or client). A single process may hold one of each.
#[async_trait]
pub trait HandlerTable: Send + Sync {
    /// Service a request and produce its `result` payload.
    async fn handle_request(
        &self,
        session: &Arc<Session>,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, HandlerError>;

    /// Service a notification. There is no reply channel; implementations
    /// that need to surface a failure do so via `tracing`.
    async fn handle_notification(&self, session: &Arc<Session>, method: &str, params: Option<Value>);
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How long graceful shutdown waits for in-flight requests to drain
    /// before cancelling them outright.
    pub shutdown_deadline: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            shutdown_deadline: Duration::from_secs(5),
        }
    }
}

/// Classifies inbound frames, routes them to a [`HandlerTable`], and manages
/// the in-flight/shutdown bookkeeping shared by every session.
pub struct Dispatcher {
    sessions: Arc<SessionMap>,
    handlers: Arc<dyn HandlerTable>,
    in_flight: Arc<AtomicU64>,
    in_shutdown: Arc<AtomicBool>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(handlers: Arc<dyn HandlerTable>, config: DispatcherConfig) -> Self {
        Self {
            sessions: Arc::new(SessionMap::new()),
            handlers,
            in_flight: Arc::new(AtomicU64::new(0)),
            in_shutdown: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionMap> {
        &self.sessions
    }

    pub fn register_session(&self, session: Arc<Session>) {
        self.sessions.insert(session);
    }

    pub async fn remove_session(&self, id: &str) {
        if let Some(session) = self.sessions.remove(id) {
            session.pending_replies().cancel_all().await;
        }
    }

    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.in_shutdown.load(Ordering::SeqCst)
    }

    /// Begin graceful shutdown: stop accepting new requests immediately, then
    /// wait for in-flight requests to drain up to `shutdown_deadline`, then
    /// cancel every session's outstanding outbound requests.
    pub async fn shutdown(&self) {
        self.in_shutdown.store(true, Ordering::SeqCst);

        let deadline = tokio::time::Instant::now() + self.config.shutdown_deadline;
        while self.in_flight_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if self.in_flight_count() > 0 {
            warn!(
                in_flight = self.in_flight_count(),
                "graceful shutdown deadline exceeded; proceeding with requests still in flight"
            );
        }

        for session in self.sessions.all() {
            session.pending_replies().cancel_all().await;
        }
    }

    /// Entry point: classify one raw inbound frame belonging to `session` and
    /// route it.
    pub async fn handle_inbound(&self, session: Arc<Session>, raw: Value) {
        let classified = match classify(&raw) {
            Ok(classified) => classified,
            Err(err) => {
                warn!(error = %err, "failed to classify inbound frame");
                let response = JsonRpcMessage::from_response(
                    None,
                    Some(serde_json::json!({
                        "code": error_codes::PARSE_ERROR,
                        "message": err.to_string(),
                    })),
                    None,
                );
                if let Err(send_err) = session.sink().send(&response).await {
                    warn!(error = %send_err, "failed to send parse-error response");
                }
                return;
            }
        };

        match classified {
            Classified::Notification(notification) => {
                if notification.method == methods::NOTIFICATION_INITIALIZED {
                    // Dispatched synchronously: no concurrently spawned request
                    // handler may observe the session mid-handshake.
                    if !session.mark_ready() {
                        debug!(session_id = session.id(), "duplicate initialized notification ignored");
                    }
                    self.handlers
                        .handle_notification(&session, &notification.method, notification.params)
                        .await;
                } else {
                    let handlers = Arc::clone(&self.handlers);
                    let session = Arc::clone(&session);
                    let method = notification.method;
                    let params = notification.params;
                    spawn_guarded("notification", async move {
                        handlers.handle_notification(&session, &method, params).await;
                    });
                }
            }
            Classified::Request(request) => {
                // `request.id`'s type (`RequestId`) cannot represent a JSON
                // null or absent value, so only `jsonrpc`/`method` need a
                // runtime check here.
                if request.jsonrpc != "2.0" || request.method.is_empty() {
                    self.respond_error(
                        &session,
                        Some(request.id),
                        error_codes::INVALID_REQUEST,
                        "invalid request: jsonrpc must be \"2.0\" and method must be non-empty".to_string(),
                    )
                    .await;
                    return;
                }

                if self.is_shutting_down() {
                    self.respond_error(
                        &session,
                        Some(request.id),
                        error_codes::INTERNAL_ERROR,
                        "server already shutdown".to_string(),
                    )
                    .await;
                    return;
                }

                let ready_exempt = request.method == methods::INITIALIZE || request.method == methods::PING;
                if !ready_exempt && !session.is_ready() {
                    self.respond_error(
                        &session,
                        Some(request.id),
                        error_codes::INTERNAL_ERROR,
                        format!("session {} not initialized", session.id()),
                    )
                    .await;
                    return;
                }

                self.in_flight.fetch_add(1, Ordering::SeqCst);
                let handlers = Arc::clone(&self.handlers);
                let in_flight = Arc::clone(&self.in_flight);
                let session = Arc::clone(&session);
                spawn_guarded("request", async move {
                    let result = handlers
                        .handle_request(&session, &request.method, request.params)
                        .await;
                    let response = match result {
                        Ok(value) => JsonRpcMessage::from_response(Some(value), None, Some(request.id)),
                        Err(err) => {
                            JsonRpcMessage::from_response(None, Some(err.into_error_value()), Some(request.id))
                        }
                    };
                    if let Err(send_err) = session.sink().send(&response).await {
                        warn!(error = %send_err, "failed to send response");
                    }
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }
            Classified::Response(response) => {
                let session = Arc::clone(&session);
                spawn_guarded("response", async move {
                    let Some(id) = response.id.clone() else {
                        warn!("dropping response with no request id");
                        return;
                    };
                    let outcome = if let Some(error) = response.error {
                        let (code, message, data) = peer_error_parts(&error);
                        session
                            .pending_replies()
                            .deliver(&id, Err(CorrelationError::PeerError { id: id.clone(), code, message, data }))
                            .await
                    } else {
                        session
                            .pending_replies()
                            .deliver(&id, Ok(response.result.unwrap_or(Value::Null)))
                            .await
                    };
                    match outcome {
                        DeliverOutcome::Delivered => {}
                        DeliverOutcome::Missing => {
                            warn!(request_id = %id, "response for unknown or expired request");
                        }
                        DeliverOutcome::Duplicate => {
                            error!(request_id = %id, "duplicate response delivered");
                        }
                    }
                });
            }
        }
    }

    async fn respond_error(&self, session: &Arc<Session>, id: Option<RequestId>, code: i32, message: String) {
        let response = JsonRpcMessage::from_response(
            None,
            Some(serde_json::json!({"code": code, "message": message})),
            id,
        );
        if let Err(err) = session.sink().send(&response).await {
            warn!(error = %err, "failed to send error response");
        }
    }
}

fn peer_error_parts(error: &Value) -> (i32, String, Option<Value>) {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(error_codes::INTERNAL_ERROR as i64) as i32;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("peer error")
        .to_string();
    let data = error.get("data").cloned();
    (code, message, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::{SessionSink, TransportError};
    use crate::session::SessionConfig;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink {
        sent: Mutex<Vec<JsonRpcMessage>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self { sent: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl SessionSink for RecordingSink {
        async fn send(&self, message: &JsonRpcMessage) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct EchoHandlers {
        notified: DashMap<String, usize>,
    }

    impl EchoHandlers {
        fn new() -> Self {
            Self { notified: DashMap::new() }
        }
    }

    #[async_trait]
    impl HandlerTable for EchoHandlers {
        async fn handle_request(
            &self,
            _session: &Arc<Session>,
            method: &str,
            params: Option<Value>,
        ) -> Result<Value, HandlerError> {
            match method {
                "ping" => Ok(json!({})),
                "echo" => Ok(params.unwrap_or(Value::Null)),
                other => Err(HandlerError::MethodNotFound(other.to_string())),
            }
        }

        async fn handle_notification(&self, _session: &Arc<Session>, method: &str, _params: Option<Value>) {
            *self.notified.entry(method.to_string()).or_insert(0) += 1;
        }
    }

    async fn make_session(sink: Arc<RecordingSink>) -> Arc<Session> {
        Arc::new(
            Session::new("s1", sink, SessionConfig::default())
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn unready_session_rejects_non_exempt_request() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"2.0","id":1,"method":"echo","params":{"a":1}}))
            .await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            JsonRpcMessage::Response(resp) => {
                let error = resp.error.as_ref().unwrap();
                assert_eq!(error["code"], error_codes::INTERNAL_ERROR);
                assert!(error["message"].as_str().unwrap().contains("not initialized"));
            }
            _ => panic!("expected response"),
        }
    }

    #[tokio::test]
    async fn malformed_request_rejects_with_invalid_request() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        session.mark_ready();
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"1.0","id":1,"method":"ping"}))
            .await;
        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"2.0","id":2,"method":""}))
            .await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        for message in sent.iter() {
            match message {
                JsonRpcMessage::Response(resp) => {
                    assert_eq!(resp.error.as_ref().unwrap()["code"], error_codes::INVALID_REQUEST);
                }
                _ => panic!("expected response"),
            }
        }
    }

    #[tokio::test]
    async fn ping_is_exempt_from_readiness_gate() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"2.0","id":1,"method":"ping"}))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            JsonRpcMessage::Response(resp) => assert!(resp.error.is_none()),
            _ => panic!("expected response"),
        }
    }

    #[tokio::test]
    async fn initialized_notification_marks_session_ready_before_returning() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        assert!(!session.is_ready());
        dispatcher
            .handle_inbound(
                Arc::clone(&session),
                json!({"jsonrpc":"2.0","method": methods::NOTIFICATION_INITIALIZED}),
            )
            .await;
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn unknown_method_maps_to_method_not_found() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        session.mark_ready();
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"2.0","id":2,"method":"nope"}))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sent = sink.sent.lock().unwrap();
        match &sent[0] {
            JsonRpcMessage::Response(resp) => {
                assert_eq!(resp.error.as_ref().unwrap()["code"], error_codes::METHOD_NOT_FOUND);
            }
            _ => panic!("expected response"),
        }
    }

    #[tokio::test]
    async fn shutdown_rejects_new_requests_immediately() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        session.mark_ready();
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());
        dispatcher.shutdown().await;

        dispatcher
            .handle_inbound(Arc::clone(&session), json!({"jsonrpc":"2.0","id":3,"method":"ping"}))
            .await;

        let sent = sink.sent.lock().unwrap();
        match &sent[0] {
            JsonRpcMessage::Response(resp) => {
                let error = resp.error.as_ref().unwrap();
                assert_eq!(error["code"], error_codes::INTERNAL_ERROR);
                assert!(error["message"].as_str().unwrap().contains("shutdown"));
            }
            _ => panic!("expected response"),
        }
    }

    #[tokio::test]
    async fn response_delivers_to_pending_reply_slot() {
        let sink = RecordingSink::new();
        let session = make_session(Arc::clone(&sink)).await;
        let dispatcher = Dispatcher::new(Arc::new(EchoHandlers::new()), DispatcherConfig::default());

        let (id, receiver) = session
            .pending_replies()
            .register(None, json!({"method":"echo"}))
            .await
            .unwrap();
        let id_value = match &id {
            RequestId::Number(n) => json!(*n),
            RequestId::String(s) => json!(s),
        };

        dispatcher
            .handle_inbound(
                Arc::clone(&session),
                json!({"jsonrpc":"2.0","id": id_value, "result": {"ok": true}}),
            )
            .await;

        let result = receiver.await.unwrap().unwrap();
        assert_eq!(result, json!({"ok": true}));
    }
}
