//! Correlation Module
//!
//! Provides request/response correlation for bidirectional JSON-RPC communication.
//! One [`CorrelationManager`] is owned per [`crate::session::Session`] (not shared
//! globally) so that request IDs only ever need to be unique within one peer's
//! conversation, per the ID-uniqueness invariant.
//!
//! ## Architecture
//!
//! - `manager.rs` - `CorrelationManager`: DashMap + oneshot based pending-request store
//! - `types.rs` - `PendingRequest`, `RequestIdGenerator`
//! - `error.rs` - `CorrelationError`, `CorrelationResult`
//! - `table.rs` - `PendingReplyTable`: the register/deliver/await/cancelAll surface
//!   consumed by the dispatcher, layered on top of `CorrelationManager` to add
//!   duplicate-vs-missing response classification

pub mod error;
pub mod manager;
pub mod table;
pub mod types;

pub use error::{CorrelationError, CorrelationResult, RequestId};
pub use manager::{CorrelationConfig, CorrelationManager};
pub use table::{DeliverOutcome, PendingReplyTable};
pub use types::{PendingRequest, RequestIdGenerator};
