//! The message dispatcher: frame classification, handler routing, response
//! correlation, panic isolation, and graceful shutdown.
//!
//! Grounded directly on the original implementation's `receive`/`receiveRequest`/
//! `receiveNotify`/`receiveResponse` quartet: classification peeks `id`/`method`
//! presence on the raw JSON value, notifications other than the initialized
//! handshake and all requests run on spawned, panic-isolated tasks, and
//! `notifications/initialized` alone is dispatched synchronously so that no
//! concurrently-spawned request handler can observe a session becoming ready
//! mid-flight.

mod classify;
mod core;
mod panic_guard;

pub use classify::{classify, Classified};
pub use core::{Dispatcher, DispatcherConfig, HandlerError, HandlerTable};
pub use panic_guard::spawn_guarded;
