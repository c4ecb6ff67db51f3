//! Shutdown coordination.
//!
//! A [`ShutdownSignal`] is triggered at most once, either by an OS signal or
//! by a request whose handler returned a shutdown error. The first reason
//! wins; later triggers are ignored.

use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: std::sync::Arc<watch::Sender<Option<String>>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: std::sync::Arc::new(sender),
        }
    }

    /// Listens for SIGINT and SIGTERM in a background task.
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let listener = signal.clone();
        tokio::spawn(async move {
            let name = wait_for_os_signal().await;
            listener.trigger(format!("received {name}"));
        });
        signal
    }

    /// Requests shutdown. Returns true only for the call that actually
    /// triggered it.
    pub fn trigger(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let triggered = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if triggered {
            info!(reason = %reason, "shutdown requested");
        }
        triggered
    }

    pub fn is_triggered(&self) -> bool {
        self.sender.borrow().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    /// Completes once shutdown has been triggered, immediately if it already was.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(Option::is_some).await;
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(err), _) | (_, Err(err)) => {
            error!(error = %err, "failed to install signal handlers");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    "ctrl-c"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_reason_wins() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        assert!(signal.trigger("first"));
        assert!(!signal.trigger("second"));
        assert_eq!(signal.reason().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger("done");
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_wakes_on_trigger_from_clone() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger("test");

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
