use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::StoreError;
use crate::models::Document;

/// Full contents of a collection at one point in time.
pub type Snapshot = Vec<Document>;

const SNAPSHOT_BUFFER: usize = 8;

/// Live stream of snapshots. Dropping or cancelling it stops the pump task.
pub struct Subscription {
    receiver: mpsc::Receiver<Result<Snapshot, StoreError>>,
    pump: JoinHandle<()>,
}

impl Subscription {
    /// Spawn `pump` with the sending half of a fresh snapshot channel.
    pub(crate) fn spawn<F, Fut>(pump: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Result<Snapshot, StoreError>>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
        let pump = tokio::spawn(pump(sender));
        Self { receiver, pump }
    }

    /// Wait for the next snapshot. `None` once the pump has stopped.
    pub async fn next(&mut self) -> Option<Result<Snapshot, StoreError>> {
        self.receiver.recv().await
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn snapshots_arrive_in_send_order() {
        let mut subscription = Subscription::spawn(|sender| async move {
            for id in ["a", "b"] {
                let doc = Document::new(id, Default::default());
                if sender.send(Ok(vec![doc])).await.is_err() {
                    return;
                }
            }
        });

        let first = subscription.next().await.unwrap().unwrap();
        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(first[0].id, "a");
        assert_eq!(second[0].id, "b");
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn cancel_aborts_the_pump() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let subscription = Subscription::spawn(|_sender| async move {
            let _done = done_tx;
            std::future::pending::<()>().await;
        });

        subscription.cancel();
        // The pump's future is dropped on abort, which drops the oneshot sender.
        let result = tokio::time::timeout(Duration::from_secs(1), done_rx).await;
        assert!(matches!(result, Ok(Err(_))));
    }
}
