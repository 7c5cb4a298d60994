use gridsweep::cancel::CancelHandle;
use std::future::Future;
use std::io;
use tracing::warn;

/// Exit status used when a second interrupt forces the process down
pub const FORCED_EXIT_CODE: i32 = 130;

/// Cancel the run on the first interrupt.
///
/// Returns true once a second interrupt arrives, meaning the caller should exit
/// without waiting for in-flight lookups. Returns false if the signal source fails.
pub async fn watch_interrupts<F, Fut>(mut next_signal: F, handle: CancelHandle) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    warn!("Interrupt received, finishing in-flight lookups (Ctrl-C again to exit now)");
    handle.cancel();

    if next_signal().await.is_err() {
        return false;
    }
    warn!("Second interrupt, exiting");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsweep::cancel::cancel_pair;
    use std::sync::Arc;
    use tokio::sync::{mpsc, Mutex};

    /// Signal source fed by a channel; a closed channel acts as a failed listener
    fn channel_source() -> (
        mpsc::UnboundedSender<()>,
        impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = io::Result<()>> + Send>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let source = move || {
            let rx = Arc::clone(&rx);
            Box::pin(async move {
                rx.lock()
                    .await
                    .recv()
                    .await
                    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "closed"))
            }) as std::pin::Pin<Box<dyn Future<Output = io::Result<()>> + Send>>
        };
        (tx, source)
    }

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let (tx, source) = channel_source();
        let (handle, signal) = cancel_pair();
        tx.send(()).unwrap();
        tx.send(()).unwrap();

        assert!(watch_interrupts(source, handle).await);
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let (tx, source) = channel_source();
        let (handle, signal) = cancel_pair();
        tx.send(()).unwrap();
        drop(tx);

        assert!(!watch_interrupts(source, handle).await);
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_listener_does_not_cancel() {
        let (tx, source) = channel_source();
        let (handle, signal) = cancel_pair();
        drop(tx);

        assert!(!watch_interrupts(source, handle).await);
        assert!(!signal.is_cancelled());
    }
}
