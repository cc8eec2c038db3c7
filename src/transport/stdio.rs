//! STDIO transport: newline-delimited JSON-RPC over stdin/stdout.
//!
//! This is the primary transport for MCP servers launched as a child process
//! by a host application (Claude Desktop and similar). Each message is one
//! line of JSON terminated by `\n`; there is never more than one peer, so
//! `session_id`/`set_session_context` are no-ops beyond bookkeeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::protocol::message::JsonRpcMessage;
use crate::protocol::transport::{
    MessageContext, MessageHandler, Transport, TransportBuilder, TransportError,
};

/// Default maximum line length accepted from stdin (1MB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Builder for [`StdioTransport`], following the pre-configured transport
/// pattern: the message handler is supplied before the transport is built,
/// so there's no window where a transport exists without anywhere to route
/// inbound messages.
pub struct StdioTransportBuilder<T = ()> {
    handler: Option<Arc<dyn MessageHandler<T>>>,
    max_message_size: usize,
}

impl<T: Send + Sync + 'static> StdioTransportBuilder<T> {
    /// Start building a STDIO transport.
    pub fn new() -> Self {
        Self {
            handler: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Override the maximum accepted line length.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}

impl<T: Send + Sync + 'static> Default for StdioTransportBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> TransportBuilder<T> for StdioTransportBuilder<T> {
    type Transport = StdioTransport<T>;
    type Error = TransportError;

    fn with_message_handler(mut self, handler: Arc<dyn MessageHandler<T>>) -> Self {
        self.handler = Some(handler);
        self
    }

    fn build(
        self,
    ) -> impl std::future::Future<Output = Result<Self::Transport, Self::Error>> + Send {
        async move {
            let handler = self.handler.ok_or_else(|| TransportError::Protocol {
                message: "StdioTransportBuilder requires a message handler".to_string(),
            })?;

            Ok(StdioTransport {
                handler,
                stdout: Arc::new(Mutex::new(tokio::io::stdout())),
                session_id: Arc::new(Mutex::new(None)),
                connected: Arc::new(AtomicBool::new(false)),
                reader_task: None,
                max_message_size: self.max_message_size,
            })
        }
    }
}

/// Event-driven STDIO transport. Reading happens on a background task that
/// feeds complete frames to the configured [`MessageHandler`]; `send` writes
/// directly to stdout under a mutex so concurrent responders don't interleave
/// partial lines.
pub struct StdioTransport<T = ()> {
    handler: Arc<dyn MessageHandler<T>>,
    stdout: Arc<Mutex<tokio::io::Stdout>>,
    session_id: Arc<Mutex<Option<String>>>,
    connected: Arc<AtomicBool>,
    reader_task: Option<JoinHandle<()>>,
    max_message_size: usize,
}

impl<T: Send + Sync + 'static> StdioTransport<T> {
    /// Spawn the background read loop.
    fn spawn_reader(&self) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let connected = Arc::clone(&self.connected);
        let session_id = Arc::clone(&self.session_id);
        let max_message_size = self.max_message_size;

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin);
            let mut line = String::new();

            loop {
                line.clear();
                let bytes_read = match reader.read_line(&mut line).await {
                    Ok(n) => n,
                    Err(e) => {
                        error!(error = %e, "stdio read failed");
                        handler.handle_error(TransportError::from(e)).await;
                        continue;
                    }
                };

                if bytes_read == 0 {
                    debug!("stdin closed, shutting down stdio transport reader");
                    connected.store(false, Ordering::SeqCst);
                    handler.handle_close().await;
                    return;
                }

                let trimmed = line.trim_end_matches(['\n', '\r']);
                if trimmed.is_empty() {
                    continue;
                }

                if trimmed.len() > max_message_size {
                    warn!(
                        size = trimmed.len(),
                        limit = max_message_size,
                        "dropping oversized stdio frame"
                    );
                    handler
                        .handle_error(TransportError::Protocol {
                            message: format!(
                                "message size {} exceeds limit {}",
                                trimmed.len(),
                                max_message_size
                            ),
                        })
                        .await;
                    continue;
                }

                let raw: serde_json::Value = match serde_json::from_str(trimmed) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(error = %e, "failed to parse stdio frame as JSON");
                        handler.handle_error(TransportError::from(e)).await;
                        continue;
                    }
                };

                let current_session = session_id.lock().await.clone();
                let context = match current_session {
                    Some(id) => MessageContext::new(id),
                    None => MessageContext::without_session(),
                };

                handler.handle_message(raw, context).await;
            }
        })
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Transport for StdioTransport<T> {
    type Error = TransportError;

    async fn start(&mut self) -> Result<(), Self::Error> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.connected.store(true, Ordering::SeqCst);
        self.reader_task = Some(self.spawn_reader());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        let mut stdout = self.stdout.lock().await;
        stdout.flush().await.map_err(TransportError::from)?;
        Ok(())
    }

    async fn send(&mut self, message: &JsonRpcMessage) -> Result<(), Self::Error> {
        let body = message.to_json().map_err(TransportError::from)?;
        if body.len() > self.max_message_size {
            return Err(TransportError::Protocol {
                message: format!(
                    "outgoing message size {} exceeds limit {}",
                    body.len(),
                    self.max_message_size
                ),
            });
        }

        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(body.as_bytes())
            .await
            .map_err(TransportError::from)?;
        stdout
            .write_all(b"\n")
            .await
            .map_err(TransportError::from)?;
        stdout.flush().await.map_err(TransportError::from)?;
        Ok(())
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.try_lock().ok().and_then(|g| g.clone())
    }

    fn set_session_context(&mut self, session_id: Option<String>) {
        if let Ok(mut guard) = self.session_id.try_lock() {
            *guard = session_id;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport_type(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Default)]
    struct RecordingHandler {
        received: TokioMutex<Vec<serde_json::Value>>,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler<()> for RecordingHandler {
        async fn handle_message(&self, raw: serde_json::Value, _context: MessageContext<()>) {
            self.received.lock().await.push(raw);
        }

        async fn handle_error(&self, _error: TransportError) {}

        async fn handle_close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn builder_requires_a_handler() {
        let result = StdioTransportBuilder::<()>::new().build().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transport_reports_type_and_connection_state() {
        let handler = Arc::new(RecordingHandler::default());
        let mut transport = StdioTransportBuilder::new()
            .with_message_handler(handler)
            .build()
            .await
            .unwrap();

        assert_eq!(transport.transport_type(), "stdio");
        assert!(!transport.is_connected());

        transport.start().await.unwrap();
        assert!(transport.is_connected());

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn session_context_round_trips() {
        let handler = Arc::new(RecordingHandler::default());
        let mut transport = StdioTransportBuilder::new()
            .with_message_handler(handler)
            .build()
            .await
            .unwrap();

        assert_eq!(transport.session_id(), None);
        transport.set_session_context(Some("sess-1".to_string()));
        assert_eq!(transport.session_id(), Some("sess-1".to_string()));
    }
}
