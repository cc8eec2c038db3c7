//! Pending-reply table: the register/deliver/await/cancelAll surface a session
//! exposes to the dispatcher, built on top of [`CorrelationManager`].

use chrono::TimeDelta;
use dashmap::DashSet;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::correlation::{
    error::{CorrelationError, CorrelationResult, RequestId},
    manager::{CorrelationConfig, CorrelationManager},
};

/// Result of attempting to deliver an inbound response to its reply slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverOutcome {
    /// The slot was open and the response was handed to its waiter.
    Delivered,
    /// No slot exists for this ID (never registered, already cancelled, or expired).
    Missing,
    /// A response for this ID was already delivered once.
    Duplicate,
}

/// Per-session pending-reply table.
///
/// Wraps a [`CorrelationManager`] with a small set tracking which request IDs
/// have already been resolved, so a second inbound response for the same ID
/// can be reported as a duplicate rather than conflated with "never registered".
#[derive(Debug)]
pub struct PendingReplyTable {
    manager: CorrelationManager,
    delivered: DashSet<RequestId>,
}

impl PendingReplyTable {
    /// Create a table with no background cleanup task; expiry is checked lazily
    /// via the manager's `cleanup_expired_requests`, invoked by the session's
    /// idle sweep rather than a dedicated timer per session.
    pub async fn new(config: CorrelationConfig) -> CorrelationResult<Self> {
        Ok(Self {
            manager: CorrelationManager::new_without_cleanup(config).await?,
            delivered: DashSet::new(),
        })
    }

    /// Allocate a fresh reply slot for an outbound request.
    pub async fn register(
        &self,
        timeout: Option<TimeDelta>,
        request_data: Value,
    ) -> CorrelationResult<(RequestId, oneshot::Receiver<CorrelationResult<Value>>)> {
        self.manager.register_request(timeout, request_data).await
    }

    /// Deliver an inbound response to the slot registered under `request_id`.
    pub async fn deliver(&self, request_id: &RequestId, response: CorrelationResult<Value>) -> DeliverOutcome {
        if self.delivered.contains(request_id) {
            return DeliverOutcome::Duplicate;
        }
        match self.manager.correlate_response(request_id, response).await {
            Ok(()) => {
                self.delivered.insert(request_id.clone());
                DeliverOutcome::Delivered
            }
            Err(CorrelationError::RequestNotFound { .. }) => DeliverOutcome::Missing,
            Err(err) => {
                warn!(%request_id, error = %err, "pending reply delivery failed");
                DeliverOutcome::Missing
            }
        }
    }

    /// Cancel one outstanding slot (e.g. caller-side timeout or explicit abandon).
    pub async fn cancel(&self, request_id: &RequestId) -> CorrelationResult<()> {
        self.manager.cancel_request(request_id).await
    }

    /// Cancel every outstanding slot, waking all waiters with a cancellation error.
    /// Called once, on session teardown.
    pub async fn cancel_all(&self) {
        for id in self.manager.get_pending_request_ids().await {
            if let Err(err) = self.manager.cancel_request(&id).await {
                warn!(request_id = %id, error = %err, "failed to cancel pending request during teardown");
            }
        }
    }

    /// Number of slots currently awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.manager.pending_count().await
    }

    /// Sweep and cancel any slots that have exceeded their timeout.
    pub async fn sweep_expired(&self) -> usize {
        self.manager.cleanup_expired_requests().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn register_then_deliver_resolves_receiver() {
        let table = PendingReplyTable::new(CorrelationConfig::default()).await.unwrap();
        let (id, receiver) = table.register(None, json!({"method": "ping"})).await.unwrap();

        let outcome = table.deliver(&id, Ok(json!({"pong": true}))).await;
        assert_eq!(outcome, DeliverOutcome::Delivered);

        let result = receiver.await.unwrap().unwrap();
        assert_eq!(result, json!({"pong": true}));
    }

    #[tokio::test]
    async fn second_delivery_for_same_id_is_duplicate() {
        let table = PendingReplyTable::new(CorrelationConfig::default()).await.unwrap();
        let (id, _receiver) = table.register(None, json!({})).await.unwrap();

        assert_eq!(table.deliver(&id, Ok(json!(1))).await, DeliverOutcome::Delivered);
        assert_eq!(table.deliver(&id, Ok(json!(2))).await, DeliverOutcome::Duplicate);
    }

    #[tokio::test]
    async fn delivery_for_unknown_id_is_missing() {
        let table = PendingReplyTable::new(CorrelationConfig::default()).await.unwrap();
        let bogus = RequestId::new_number(9999);
        assert_eq!(table.deliver(&bogus, Ok(json!(null))).await, DeliverOutcome::Missing);
    }

    #[tokio::test]
    async fn cancel_all_wakes_every_waiter() {
        let table = PendingReplyTable::new(CorrelationConfig::default()).await.unwrap();
        let (_id1, receiver1) = table.register(None, json!({})).await.unwrap();
        let (_id2, receiver2) = table.register(None, json!({})).await.unwrap();

        table.cancel_all().await;

        assert!(receiver1.await.unwrap().is_err());
        assert!(receiver2.await.unwrap().is_err());
        assert_eq!(table.pending_count().await, 0);
    }
}
