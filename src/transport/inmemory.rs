//! In-process duplex transport pairing two [`InMemoryTransport`] ends through
//! unbounded channels.
//!
//! Used by the crate's own integration tests to exercise the dispatcher,
//! session, and handler layers without going through a real process
//! boundary, and exported for embedders who want the same thing in their
//! own tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::protocol::message::JsonRpcMessage;
use crate::protocol::transport::{
    MessageContext, MessageHandler, Transport, TransportBuilder, TransportError,
};

/// Create a connected pair of builders, one per end. Call `.with_message_handler(..).build()`
/// on each and `.start()` both to wire up a full duplex channel.
pub fn in_memory_pair<T: Send + Sync + 'static>() -> (InMemoryTransportBuilder<T>, InMemoryTransportBuilder<T>) {
    let (a_to_b, b_from_a) = mpsc::unbounded_channel();
    let (b_to_a, a_from_b) = mpsc::unbounded_channel();

    (
        InMemoryTransportBuilder {
            handler: None,
            outbound: a_to_b,
            inbound: Some(a_from_b),
        },
        InMemoryTransportBuilder {
            handler: None,
            outbound: b_to_a,
            inbound: Some(b_from_a),
        },
    )
}

/// Builder for one end of an [`in_memory_pair`].
pub struct InMemoryTransportBuilder<T = ()> {
    handler: Option<Arc<dyn MessageHandler<T>>>,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
    inbound: Option<mpsc::UnboundedReceiver<serde_json::Value>>,
}

impl<T: Send + Sync + 'static> TransportBuilder<T> for InMemoryTransportBuilder<T> {
    type Transport = InMemoryTransport<T>;
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
                message: "InMemoryTransportBuilder requires a message handler".to_string(),
            })?;

            Ok(InMemoryTransport {
                handler,
                outbound: self.outbound,
                inbound: Some(self.inbound.expect("inbound receiver taken twice")),
                session_id: None,
                connected: Arc::new(AtomicBool::new(false)),
                reader_task: None,
            })
        }
    }
}

/// One end of an in-memory duplex pair. Owns an outbound channel half for
/// `send`, and takes ownership of the paired inbound half when `start` spawns
/// the forwarding task.
pub struct InMemoryTransport<T = ()> {
    handler: Arc<dyn MessageHandler<T>>,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
    inbound: Option<mpsc::UnboundedReceiver<serde_json::Value>>,
    session_id: Option<String>,
    connected: Arc<AtomicBool>,
    reader_task: Option<JoinHandle<()>>,
}

#[async_trait]
impl<T: Send + Sync + 'static> Transport for InMemoryTransport<T> {
    type Error = TransportError;

    async fn start(&mut self) -> Result<(), Self::Error> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        let mut inbound = self.inbound.take().ok_or_else(|| TransportError::Protocol {
            message: "in-memory transport already started".to_string(),
        })?;
        let handler = Arc::clone(&self.handler);
        let connected = Arc::clone(&self.connected);
        let session_id = self.session_id.clone();

        connected.store(true, Ordering::SeqCst);

        self.reader_task = Some(tokio::spawn(async move {
            while let Some(raw) = inbound.recv().await {
                let context = match &session_id {
                    Some(id) => MessageContext::new(id.clone()),
                    None => MessageContext::without_session(),
                };
                handler.handle_message(raw, context).await;
            }
            debug!("in-memory transport peer dropped, closing");
            connected.store(false, Ordering::SeqCst);
            handler.handle_close().await;
        }));

        Ok(())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        Ok(())
    }

    async fn send(&mut self, message: &JsonRpcMessage) -> Result<(), Self::Error> {
        let value = serde_json::to_value(message).map_err(TransportError::from)?;
        self.outbound.send(value).map_err(|_| TransportError::Protocol {
            message: "in-memory transport peer is gone".to_string(),
        })
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn set_session_context(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport_type(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Default)]
    struct RecordingHandler {
        received: TokioMutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl MessageHandler<()> for RecordingHandler {
        async fn handle_message(&self, raw: serde_json::Value, _context: MessageContext<()>) {
            self.received.lock().await.push(raw);
        }

        async fn handle_error(&self, _error: TransportError) {}

        async fn handle_close(&self) {}
    }

    #[tokio::test]
    async fn a_message_sent_on_one_end_arrives_on_the_other() {
        let (builder_a, builder_b) = in_memory_pair::<()>();
        let handler_a = Arc::new(RecordingHandler::default());
        let handler_b = Arc::new(RecordingHandler::default());

        let mut transport_a = builder_a.with_message_handler(handler_a.clone()).build().await.unwrap();
        let mut transport_b = builder_b.with_message_handler(handler_b.clone()).build().await.unwrap();

        transport_a.start().await.unwrap();
        transport_b.start().await.unwrap();

        let request = JsonRpcMessage::from_request(
            "ping",
            None,
            crate::protocol::RequestId::new_number(1),
        );
        transport_a.send(&request).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let received = handler_b.received.lock().await;
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn closing_one_end_closes_the_other_reader() {
        let (builder_a, builder_b) = in_memory_pair::<()>();
        let handler_a = Arc::new(RecordingHandler::default());
        let handler_b = Arc::new(RecordingHandler::default());

        let mut transport_a = builder_a.with_message_handler(handler_a).build().await.unwrap();
        let mut transport_b = builder_b.with_message_handler(handler_b).build().await.unwrap();

        transport_a.start().await.unwrap();
        transport_b.start().await.unwrap();

        transport_a.close().await.unwrap();
        assert!(!transport_a.is_connected());
    }
}
