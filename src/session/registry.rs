use std::sync::Arc;

use dashmap::DashMap;

use super::session::Session;

/// Concurrent session-id → [`Session`] map.
///
/// `DashMap` gives single-writer-per-shard semantics out of the box; combined
/// with `Session`'s own interior synchronization, no caller ever needs to lock
/// the whole map to mutate one session.
#[derive(Debug, Default)]
pub struct SessionMap {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, session: Arc<Session>) {
        self.sessions.insert(session.id().to_string(), session);
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::JsonRpcMessage;
    use crate::protocol::transport::{SessionSink, TransportError};
    use crate::session::SessionConfig;
    use async_trait::async_trait;

    struct NullSink;

    #[async_trait]
    impl SessionSink for NullSink {
        async fn send(&self, _message: &JsonRpcMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn insert_get_remove_round_trip() {
        let map = SessionMap::new();
        let session = Arc::new(
            Session::new("abc", Arc::new(NullSink), SessionConfig::default())
                .await
                .unwrap(),
        );
        map.insert(Arc::clone(&session));

        assert_eq!(map.len(), 1);
        assert!(map.get("abc").is_some());

        let removed = map.remove("abc").unwrap();
        assert_eq!(removed.id(), "abc");
        assert!(map.get("abc").is_none());
    }
}
