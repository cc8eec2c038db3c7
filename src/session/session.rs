use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::RwLock;
use tracing::debug;

use crate::correlation::{CorrelationConfig, PendingReplyTable};
use crate::protocol::transport::SessionSink;
use crate::protocol::types::ProtocolVersion;

/// Configuration for a single session's correlation table.
///
/// Kept distinct from [`CorrelationConfig`] so the session layer can grow
/// session-specific knobs (e.g. a max subscription count) without reaching
/// into the correlation module's config.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub correlation: CorrelationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            correlation: CorrelationConfig::default(),
        }
    }
}

/// Name and version of whichever peer is on the other end of a session —
/// `ClientInfo` as seen from a server, `ServerInfo` as seen from a client.
/// Sessions are shared by both roles, so this is kept as a plain pair rather
/// than tied to either protocol type.
#[derive(Debug, Clone)]
pub struct PeerImplementation {
    pub name: String,
    pub version: String,
}

/// A snapshot of what the peer told us about itself during `initialize`.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub implementation: PeerImplementation,
    /// Raw capabilities object as declared by the peer (`ClientCapabilities` on
    /// the server side, `ServerCapabilities` on the client side) — kept as a
    /// JSON value since a `Session` is shared by both roles.
    pub capabilities: serde_json::Value,
}

/// The state of one MCP conversation with one peer.
pub struct Session {
    id: String,
    ready: AtomicBool,
    protocol_version: RwLock<Option<ProtocolVersion>>,
    peer_info: RwLock<Option<PeerInfo>>,
    subscriptions: DashSet<String>,
    pending_replies: PendingReplyTable,
    sink: Arc<dyn SessionSink>,
}

impl Session {
    /// Create a new, not-yet-ready session for `id`, addressed through `sink`.
    pub async fn new(
        id: impl Into<String>,
        sink: Arc<dyn SessionSink>,
        config: SessionConfig,
    ) -> crate::correlation::CorrelationResult<Self> {
        Ok(Self {
            id: id.into(),
            ready: AtomicBool::new(false),
            protocol_version: RwLock::new(None),
            peer_info: RwLock::new(None),
            subscriptions: DashSet::new(),
            pending_replies: PendingReplyTable::new(config.correlation).await?,
            sink,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flip `ready` false→true. Returns `true` if this call performed the
    /// flip, `false` if the session was already ready — callers use this to
    /// detect (and ignore) a redundant `notifications/initialized`.
    pub fn mark_ready(&self) -> bool {
        let flipped = self
            .ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if flipped {
            debug!(session_id = %self.id, "session ready");
        }
        flipped
    }

    pub async fn set_protocol_version(&self, version: ProtocolVersion) {
        *self.protocol_version.write().await = Some(version);
    }

    pub async fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.protocol_version.read().await.clone()
    }

    pub async fn set_peer_info(&self, implementation: PeerImplementation, capabilities: serde_json::Value) {
        *self.peer_info.write().await = Some(PeerInfo {
            implementation,
            capabilities,
        });
    }

    pub async fn peer_info(&self) -> Option<PeerInfo> {
        self.peer_info.read().await.clone()
    }

    pub fn subscribe(&self, uri: impl Into<String>) {
        self.subscriptions.insert(uri.into());
    }

    pub fn unsubscribe(&self, uri: &str) {
        self.subscriptions.remove(uri);
    }

    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscriptions.contains(uri)
    }

    pub fn subscribed_uris(&self) -> Vec<String> {
        self.subscriptions.iter().map(|entry| entry.clone()).collect()
    }

    pub fn pending_replies(&self) -> &PendingReplyTable {
        &self.pending_replies
    }

    pub fn sink(&self) -> &Arc<dyn SessionSink> {
        &self.sink
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::protocol::message::JsonRpcMessage;
    use crate::protocol::transport::TransportError;

    struct NullSink;

    #[async_trait]
    impl SessionSink for NullSink {
        async fn send(&self, _message: &JsonRpcMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn ready_flips_exactly_once() {
        let session = Session::new("s1", Arc::new(NullSink), SessionConfig::default())
            .await
            .unwrap();

        assert!(!session.is_ready());
        assert!(session.mark_ready());
        assert!(session.is_ready());
        assert!(!session.mark_ready(), "second flip must report no-op");
    }

    #[tokio::test]
    async fn subscription_set_tracks_membership() {
        let session = Session::new("s1", Arc::new(NullSink), SessionConfig::default())
            .await
            .unwrap();

        session.subscribe("file:///x");
        assert!(session.is_subscribed("file:///x"));
        session.unsubscribe("file:///x");
        assert!(!session.is_subscribed("file:///x"));
    }
}
