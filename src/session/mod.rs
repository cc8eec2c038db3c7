//! Session state: the per-peer conversation the dispatcher and endpoint operate on.
//!
//! A [`Session`] is created when a peer connects and torn down when it
//! disconnects. It owns the readiness flag (invariant: flips false→true at
//! most once), the negotiated protocol version, a snapshot of the peer's
//! declared capabilities, a per-session [`PendingReplyTable`](crate::correlation::PendingReplyTable),
//! the resource-subscription set, and a handle back to the transport for
//! sending frames to this peer.

mod registry;
mod session;

pub use registry::SessionMap;
pub use session::{PeerImplementation, PeerInfo, Session, SessionConfig};
