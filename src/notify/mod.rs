//! Best-effort prompt notifications.
//!
//! # Contract
//! `dispatch` spawns a detached task and returns immediately. The request
//! handler never awaits or joins it: a slow, hanging or failing provider has
//! no effect on the response. Outcomes only reach the operator log and the
//! `relay_notifications_total` counter. Each send is bounded by a timeout so
//! a hung provider cannot pin tasks forever.

pub mod resend;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::observability::metrics;

pub use resend::ResendNotifier;

/// What an operator is told about an accepted prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub client_address: String,
    pub prompt: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(String),

    #[error("notification provider returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can deliver a `Notification`.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Fire-and-forget send. The returned handle exists for tests; the request
/// path drops it.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    notification: Notification,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = notification.client_address.clone();
        let result = match tokio::time::timeout(timeout, notifier.send(notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(timeout)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(client = %client, "Notification sent");
                metrics::record_notification("sent");
            }
            Err(e) => {
                tracing::warn!(client = %client, error = %e, "Notification failed");
                metrics::record_notification("failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Hanging;

    #[async_trait]
    impl Notifier for Hanging {
        async fn send(&self, _: Notification) -> Result<(), NotifyError> {
            std::future::pending().await
        }
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl Notifier for Counting {
        async fn send(&self, _: Notification) -> Result<(), NotifyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Transport("boom".into()))
        }
    }

    fn notification() -> Notification {
        Notification {
            client_address: "127.0.0.1".into(),
            prompt: Some("hi".into()),
        }
    }

    #[tokio::test]
    async fn hung_notifier_is_cut_off_by_timeout() {
        let handle = dispatch(Arc::new(Hanging), notification(), Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("task should finish after its timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = Arc::new(Counting(AtomicUsize::new(0)));
        dispatch(notifier.clone(), notification(), Duration::from_secs(1))
            .await
            .expect("failed send must not panic the task");
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }
}
