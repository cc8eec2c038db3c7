//! Panic isolation for spawned dispatcher tasks.
//!
//! Mirrors the original implementation's `defer pkg.Recover()` pattern: a
//! panicking handler is logged and swallowed rather than tearing down the
//! dispatcher or poisoning any shared state.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

/// Spawn `fut` on the tokio runtime, catching any panic it raises so the
/// dispatcher's receive loop is never affected by a misbehaving handler.
pub fn spawn_guarded<F>(label: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let result = AssertUnwindSafe(fut).catch_unwind().await;
        if let Err(panic) = result {
            let message = panic_message(&panic);
            error!(task = label, panic = %message, "task panicked; recovered");
        }
    });
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn panicking_task_is_recovered() {
        let ran_after = Arc::new(AtomicBool::new(false));
        spawn_guarded("test-panic", async {
            panic!("boom");
        });

        let flag = Arc::clone(&ran_after);
        spawn_guarded("test-after", async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(ran_after.load(Ordering::SeqCst));
    }
}
