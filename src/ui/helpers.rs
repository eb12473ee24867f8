use crate::app::AppEvent;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use suprss::mutation::MutationError;
use suprss::FeedController;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Run a future, converting a panic into an error string.
///
/// Spawned tasks that panic would otherwise drop their result silently and
/// the UI would wait forever for an event that never comes.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
    }
}

/// Ask the server who is signed in and report back.
pub(super) fn spawn_identity_load(controller: Arc<FeedController>, event_tx: &mpsc::Sender<AppEvent>) {
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(controller.load_identity()).await {
            Ok(result) => AppEvent::IdentityLoaded(result.map_err(|e| e.to_string())),
            Err(panic_msg) => {
                tracing::error!(task = "load_identity", error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task: "load_identity",
                    error: panic_msg,
                }
            }
        };
        send_event(&tx, event).await;
    });
}

/// Wait for a delete task and tell the UI it settled.
///
/// The outcome itself reaches the user through the notification sink; this
/// only makes sure the view is re-projected once the feed leaves the
/// in-flight set.
pub(super) fn watch_delete(
    feed_id: i64,
    handle: JoinHandle<Result<(), MutationError>>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match handle.await {
            Ok(result) => {
                if let Err(e) = result {
                    tracing::debug!(feed_id, error = %e, "Delete did not complete");
                }
                AppEvent::DeleteSettled { feed_id }
            }
            Err(e) => {
                tracing::error!(task = "delete_feed", feed_id, error = %e, "Background task failed");
                AppEvent::TaskPanicked {
                    task: "delete_feed",
                    error: e.to_string(),
                }
            }
        };
        send_event(&tx, event).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }
}
