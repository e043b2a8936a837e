//! Interrupt listener.
//!
//! Install once at startup. The listener runs on its own tokio task, waits for
//! the first SIGINT (Ctrl-C) or SIGTERM, logs a notice and calls the shutdown
//! callback exactly once. There is no drain of in-flight work: the callback
//! decides what happens next, and [`exit_on_interrupt`] simply exits with 0.
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() {
//!     carryall::exit_on_interrupt();
//!     // ... run the service
//! }
//! ```

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{error, info};

/// Calls `on_close` once `signal` resolves, from a dedicated task.
///
/// This is the injectable core of [`close_listener`]; pass any future as the
/// signal, e.g. a `oneshot::Receiver` in tests.
pub fn listen_for<S, F>(signal: S, on_close: F) -> JoinHandle<()>
where
    S: Future<Output = ()> + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        info!("interrupt received, exiting... thank you!");
        on_close();
    })
}

/// Calls `on_close` on the first SIGINT or SIGTERM the process receives.
pub fn close_listener<F>(on_close: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    listen_for(shutdown_signal(), on_close)
}

/// Exits the process with status 0 on the first SIGINT or SIGTERM.
pub fn exit_on_interrupt() -> JoinHandle<()> {
    close_listener(|| std::process::exit(0))
}

/// Installs the shutdown handlers and returns a future that resolves on the
/// first signal.
///
/// The handlers are registered before this returns, so a signal that arrives
/// before the listener task first runs is still caught. On Unix this covers
/// **SIGINT** (Ctrl-C) and **SIGTERM**; on Windows only Ctrl-C. A source whose
/// handler cannot be installed is logged and never fires.
#[cfg(unix)]
fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    use tokio::signal::unix::{SignalKind, signal};

    let interrupt = signal(SignalKind::interrupt())
        .inspect_err(|e| error!("failed to install Ctrl-C handler: {e}"))
        .ok();
    let terminate = signal(SignalKind::terminate())
        .inspect_err(|e| error!("failed to install SIGTERM handler: {e}"))
        .ok();

    async move {
        tokio::select! {
            () = recv(interrupt) => {}
            () = recv(terminate) => {}
        }
    }
}

#[cfg(unix)]
async fn recv(stream: Option<tokio::signal::unix::Signal>) {
    match stream {
        Some(mut stream) => {
            stream.recv().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(windows)]
fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    let ctrl_c = tokio::signal::windows::ctrl_c()
        .inspect_err(|e| error!("failed to install Ctrl-C handler: {e}"))
        .ok();

    async move {
        match ctrl_c {
            Some(mut stream) => {
                stream.recv().await;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn callback_runs_once_when_signalled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<()>();

        let counter = Arc::clone(&calls);
        let handle = listen_for(
            async move {
                let _ = rx.await;
            },
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        tx.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signal_before_first_poll_is_caught() {
        let (tx, rx) = oneshot::channel();
        let handle = close_listener(move || {
            let _ = tx.send(());
        });

        // the current-thread runtime has not polled the listener task yet
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(std::time::Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn callback_waits_for_the_signal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = listen_for(std::future::pending(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        handle.abort();
    }
}
